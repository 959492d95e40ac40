// 该文件是 Shuzi （数字） 项目的一部分。
// src/output/label.rs - 反馈标注
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{fmt, str::FromStr};

use serde_json::Value;
use thiserror::Error;

use crate::model::DIGIT_CLASSES;

/// 无法辨认的样本在数据集中的标注
pub const UNKNOWN_MARKER: &str = "NaN";

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid label '{0}'. Must be an integer between 0 and 9, or the string \"NaN\".")]
pub struct LabelError(pub String);

/// 用户提交的纠正标注：0-9 的数字，或表示无法辨认的 `NaN`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackLabel {
  Digit(u8),
  Unknown,
}

impl FeedbackLabel {
  pub fn digit(value: i64) -> Result<Self, LabelError> {
    if (0..DIGIT_CLASSES as i64).contains(&value) {
      Ok(FeedbackLabel::Digit(value as u8))
    } else {
      Err(LabelError(value.to_string()))
    }
  }

  /// 接受 JSON 整数、整值浮点数，或内容为整数 / `NaN` 的字符串
  pub fn from_json(value: &Value) -> Result<Self, LabelError> {
    match value {
      Value::String(s) => s.parse(),
      Value::Number(n) => {
        if let Some(i) = n.as_i64() {
          Self::digit(i)
        } else if let Some(f) = n.as_f64()
          && f.fract() == 0.0
          && f.abs() < i64::MAX as f64
        {
          Self::digit(f as i64)
        } else {
          Err(LabelError(n.to_string()))
        }
      }
      other => Err(LabelError(other.to_string())),
    }
  }
}

impl FromStr for FeedbackLabel {
  type Err = LabelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s == UNKNOWN_MARKER {
      return Ok(FeedbackLabel::Unknown);
    }
    s.trim()
      .parse::<i64>()
      .map_err(|_| LabelError(s.to_string()))
      .and_then(Self::digit)
  }
}

impl fmt::Display for FeedbackLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FeedbackLabel::Digit(d) => write!(f, "{}", d),
      FeedbackLabel::Unknown => f.write_str(UNKNOWN_MARKER),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_json_labels() {
    assert_eq!(FeedbackLabel::from_json(&json!(5)), Ok(FeedbackLabel::Digit(5)));
    assert_eq!(FeedbackLabel::from_json(&json!(0)), Ok(FeedbackLabel::Digit(0)));
    assert_eq!(FeedbackLabel::from_json(&json!(9)), Ok(FeedbackLabel::Digit(9)));
    assert_eq!(FeedbackLabel::from_json(&json!("7")), Ok(FeedbackLabel::Digit(7)));
    assert_eq!(FeedbackLabel::from_json(&json!(" 3 ")), Ok(FeedbackLabel::Digit(3)));
    assert_eq!(FeedbackLabel::from_json(&json!(4.0)), Ok(FeedbackLabel::Digit(4)));
    assert_eq!(FeedbackLabel::from_json(&json!("NaN")), Ok(FeedbackLabel::Unknown));
  }

  #[test]
  fn test_out_of_range_labels() {
    for value in [json!(10), json!(-1), json!("10"), json!("-1"), json!(4.5)] {
      assert!(FeedbackLabel::from_json(&value).is_err(), "{value} accepted");
    }
  }

  #[test]
  fn test_non_numeric_labels() {
    for value in [json!("nan"), json!("seven"), json!(null), json!(true), json!([1])] {
      assert!(FeedbackLabel::from_json(&value).is_err(), "{value} accepted");
    }
  }

  #[test]
  fn test_display() {
    assert_eq!(FeedbackLabel::Digit(5).to_string(), "5");
    assert_eq!(FeedbackLabel::Unknown.to_string(), "NaN");
  }
}
