// 该文件是 Shuzi （数字） 项目的一部分。
// src/input/data_url.rs - base64 图像信封解析
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

use base64::{Engine, prelude::BASE64_STANDARD};
use tracing::debug;

use crate::input::InputError;

/// 画布导出的 PNG 图像信封头
pub const PNG_ENVELOPE_HEADER: &str = "data:image/png;base64";

/// `data:<mime>;base64,<payload>` 形式的图像字符串
#[derive(Debug, Clone, Copy)]
pub struct ImageEnvelope<'a> {
  header: &'a str,
  payload: &'a str,
}

impl<'a> ImageEnvelope<'a> {
  /// 以第一个逗号切分信封头与数据，信封头内容不做检查
  pub fn parse(data: &'a str) -> Result<Self, InputError> {
    let (header, payload) = data
      .split_once(',')
      .ok_or(InputError::MissingSeparator)?;
    debug!("图像信封头: {}, 数据长度: {}", header, payload.len());
    Ok(Self { header, payload })
  }

  /// 要求信封头与给定值完全一致
  pub fn parse_strict(data: &'a str, expected_header: &str) -> Result<Self, InputError> {
    let envelope = Self::parse(data)?;
    if envelope.header != expected_header {
      return Err(InputError::EnvelopeMismatch {
        expected: expected_header.to_string(),
        actual: envelope.header.to_string(),
      });
    }
    Ok(envelope)
  }

  pub fn mime(&self) -> Option<&'a str> {
    self
      .header
      .strip_prefix("data:")
      .and_then(|rest| rest.split(';').next())
      .filter(|mime| !mime.is_empty())
  }

  /// 解码 base64 数据，忽略其中的空白（例如按 76 列折行的 MIME 编码）
  pub fn decode(&self) -> Result<Vec<u8>, InputError> {
    let payload: Vec<u8> = self
      .payload
      .bytes()
      .filter(|b| !b.is_ascii_whitespace())
      .collect();
    Ok(BASE64_STANDARD.decode(payload)?)
  }
}
