// 该文件是 Shuzi （数字） 项目的一部分。
// src/model.rs - 模型
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

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::frame::DigitFrame;

/// 数字类别数量
pub const DIGIT_CLASSES: usize = 10;

// 判定输出是否已是概率分布时允许的和误差
const DISTRIBUTION_TOLERANCE: f32 = 1e-3;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 服务端共享的只读分类器
pub type SharedClassifier =
  Arc<dyn Model<Input = DigitFrame, Output = Classification, Error = ModelError> + Send + Sync>;

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("Model load error: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("Model path error: {0}")]
  ModelPathError(String),
  #[cfg(feature = "model_onnx")]
  #[error("Model runtime error: {0}")]
  TractError(tract_onnx::prelude::TractError),
  #[error("Model produced {actual} scores, expected {expected}")]
  OutputShape { expected: usize, actual: usize },
  #[error("Model produced a non-finite score")]
  NonFiniteScore,
}

#[cfg(feature = "model_onnx")]
impl From<tract_onnx::prelude::TractError> for ModelError {
  fn from(err: tract_onnx::prelude::TractError) -> Self {
    ModelError::TractError(err)
  }
}

/// 分类结果：预测的数字及其概率
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
  pub prediction: u8,
  pub confidence: f32,
}

impl Classification {
  /// 取 10 个得分中的最大者；得分不是概率分布时先做 softmax。
  /// 并列时取下标最小的类别。
  pub fn from_scores(scores: &[f32]) -> Result<Self, ModelError> {
    if scores.len() != DIGIT_CLASSES {
      return Err(ModelError::OutputShape {
        expected: DIGIT_CLASSES,
        actual: scores.len(),
      });
    }
    if scores.iter().any(|s| !s.is_finite()) {
      return Err(ModelError::NonFiniteScore);
    }

    let probabilities = if is_distribution(scores) {
      scores.to_vec()
    } else {
      debug!("模型输出不是概率分布，应用 softmax: {:?}", scores);
      softmax(scores)
    };

    let (prediction, confidence) = probabilities
      .iter()
      .copied()
      .enumerate()
      .fold((0usize, f32::MIN), |best, (idx, p)| {
        if p > best.1 { (idx, p) } else { best }
      });

    Ok(Classification {
      prediction: prediction as u8,
      confidence: confidence.clamp(0.0, 1.0),
    })
  }
}

fn is_distribution(scores: &[f32]) -> bool {
  scores.iter().all(|s| (0.0..=1.0).contains(s))
    && (scores.iter().sum::<f32>() - 1.0).abs() <= DISTRIBUTION_TOLERANCE
}

fn softmax(scores: &[f32]) -> Vec<f32> {
  let max = scores.iter().copied().fold(f32::MIN, f32::max);
  let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
  let sum: f32 = exps.iter().sum();
  exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(feature = "model_onnx")]
mod onnx;
#[cfg(feature = "model_onnx")]
pub use self::onnx::{InputLayout, OnnxClassifier, OnnxClassifierBuilder};
