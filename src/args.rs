// 该文件是 Shuzi （数字） 项目的一部分。
// src/args.rs - 服务参数配置
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

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use url::Url;

use shuzi::output::DATASET_FILENAME;

/// Shuzi 手写数字识别服务参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型地址
  /// 例如: onnx:///app/digit_recognizer_model.onnx?layout=nhwc
  /// layout 可选 nhwc（默认）、nchw、flat
  #[arg(long, env = "SHUZI_MODEL", value_name = "MODEL")]
  pub model: Url,

  /// 反馈数据集 CSV 文件路径
  #[arg(long, env = "SHUZI_DATASET", default_value = DATASET_FILENAME, value_name = "FILE")]
  pub dataset: PathBuf,

  /// 监听地址
  #[arg(long, env = "SHUZI_BIND", default_value = "0.0.0.0:7860", value_name = "ADDR")]
  pub bind: SocketAddr,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let args = Args::try_parse_from(["shuzi", "--model", "onnx:///app/model.onnx"]).unwrap();
    assert_eq!(args.model.path(), "/app/model.onnx");
    assert_eq!(args.dataset, PathBuf::from("user_pixel_data.csv"));
    assert_eq!(args.bind, "0.0.0.0:7860".parse::<SocketAddr>().unwrap());
  }

  #[test]
  fn test_model_is_required() {
    assert!(Args::try_parse_from(["shuzi"]).is_err());
  }
}
