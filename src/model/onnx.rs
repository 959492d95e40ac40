// 该文件是 Shuzi （数字） 项目的一部分。
// src/model/onnx.rs - ONNX 手写数字分类模型
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

use std::marker::PhantomData;

use tract_onnx::prelude::*;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::DIGIT_SIDE,
  input::AsGrayFrame,
  model::{Classification, DIGIT_CLASSES, Model, ModelError},
};

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// 模型输入张量的排布
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputLayout {
  /// `[1, 28, 28, 1]`，Keras 默认
  #[default]
  Nhwc,
  /// `[1, 1, 28, 28]`
  Nchw,
  /// `[1, 784]`
  Flat,
}

impl InputLayout {
  pub fn shape(&self) -> Vec<usize> {
    let side = DIGIT_SIDE as usize;
    match self {
      InputLayout::Nhwc => vec![1, side, side, 1],
      InputLayout::Nchw => vec![1, 1, side, side],
      InputLayout::Flat => vec![1, side * side],
    }
  }
}

impl std::str::FromStr for InputLayout {
  type Err = ModelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "nhwc" => Ok(InputLayout::Nhwc),
      "nchw" => Ok(InputLayout::Nchw),
      "flat" => Ok(InputLayout::Flat),
      other => Err(ModelError::ModelPathError(format!(
        "未知的输入排布 '{}'，可选 nhwc、nchw、flat",
        other
      ))),
    }
  }
}

pub struct OnnxClassifier<Frame> {
  plan: Plan,
  layout: InputLayout,
  _phantom: PhantomData<Frame>,
}

pub struct OnnxClassifierBuilder {
  model_path: String,
  layout: InputLayout,
}

impl FromUrlWithScheme for OnnxClassifierBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for OnnxClassifierBuilder {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ModelError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let mut layout = InputLayout::default();
    for (k, v) in url.query_pairs() {
      if k == "layout" {
        layout = v.parse()?;
      }
    }

    Ok(OnnxClassifierBuilder {
      model_path: url.path().to_string(),
      layout,
    })
  }
}

impl OnnxClassifierBuilder {
  pub fn new(model_path: impl Into<String>) -> Self {
    OnnxClassifierBuilder {
      model_path: model_path.into(),
      layout: InputLayout::default(),
    }
  }

  pub fn layout(mut self, layout: InputLayout) -> Self {
    self.layout = layout;
    self
  }

  pub fn build<Frame>(self) -> Result<OnnxClassifier<Frame>, ModelError> {
    info!("加载模型文件: {}", self.model_path);
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    let shape = self.layout.shape();
    info!("构建推理计划，输入排布 {:?}，形状 {:?}", self.layout, shape);
    let plan = tract_onnx::onnx()
      .model_for_read(&mut model_data.as_slice())?
      .with_input_fact(0, f32::fact(shape).into())?
      .into_optimized()?
      .into_runnable()?;

    let classifier = OnnxClassifier {
      plan,
      layout: self.layout,
      _phantom: PhantomData,
    };

    // 用全零输入试跑一次，确认输出为 10 个得分
    let probe = vec![0.0f32; (DIGIT_SIDE * DIGIT_SIDE) as usize];
    match classifier.run(&probe) {
      Ok(scores) if scores.len() == DIGIT_CLASSES => {}
      Ok(scores) => {
        error!(
          "预期模型输出 {} 个得分, 实际为 {}",
          DIGIT_CLASSES,
          scores.len()
        );
        return Err(ModelError::OutputShape {
          expected: DIGIT_CLASSES,
          actual: scores.len(),
        });
      }
      Err(e) => {
        error!("模型试运行失败: {}", e);
        return Err(e);
      }
    }

    info!("模型加载完成");
    Ok(classifier)
  }
}

impl<Frame> OnnxClassifier<Frame> {
  fn run(&self, pixels: &[f32]) -> Result<Vec<f32>, ModelError> {
    let input = Tensor::from_shape(&self.layout.shape(), pixels)?;
    debug!("执行模型推理");
    let outputs = self.plan.run(tvec!(input.into()))?;
    let scores = outputs[0].as_slice::<f32>()?.to_vec();
    debug!("模型推理结果：{:?}", scores);
    Ok(scores)
  }
}

impl<Frame: AsGrayFrame<DIGIT_SIDE, DIGIT_SIDE>> Model for OnnxClassifier<Frame> {
  type Input = Frame;
  type Output = Classification;
  type Error = ModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let scores = self.run(&input.to_unit_scale())?;
    Classification::from_scores(&scores)
  }
}
