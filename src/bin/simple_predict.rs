// 该文件是 Shuzi （数字） 项目的一部分。
// src/bin/simple_predict.rs - 单张图像推理与标注工具
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use shuzi::{
  FromUrl,
  frame::DigitFrame,
  input::ImageFileInput,
  model::{Model, OnnxClassifierBuilder},
  output::{CsvDataset, DATASET_FILENAME, FeedbackLabel, Persist},
};
use tracing::info;

/// Shuzi 单张图像推理参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型地址
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入图像，例如 image:///tmp/seven.png
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 纠正标注（0-9 或 NaN），给出时追加到数据集
  #[arg(long, value_name = "LABEL")]
  pub label: Option<FeedbackLabel>,
  /// 数据集 CSV 文件路径
  #[arg(long, default_value = DATASET_FILENAME, value_name = "FILE")]
  pub dataset: PathBuf,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型地址: {}", args.model);

  let input = ImageFileInput::from_url(&args.input)?;
  info!("图像文件: {}", input.path());
  let model = OnnxClassifierBuilder::from_url(&args.model)?.build::<DigitFrame>()?;
  let dataset = CsvDataset::new(&args.dataset);

  info!("开始推理...");
  let now = std::time::Instant::now();
  for frame in input {
    let frame = frame?;
    let result = model.infer(&frame)?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());
    println!("{}", serde_json::to_string(&result)?);

    if let Some(label) = &args.label {
      dataset.persist(&frame, label)?;
      info!("已追加标注 {} 到 {}", label, dataset.path().display());
    }
  }

  Ok(())
}
