// 该文件是 Shuzi （数字） 项目的一部分。
// src/main.rs - 服务主程序
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

mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::{net::TcpListener, sync::Notify};
use tracing::{info, warn};

use shuzi::{
  FromUrl,
  frame::DigitFrame,
  model::{OnnxClassifierBuilder, SharedClassifier},
  output::CsvDataset,
  server::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型地址: {}", args.model);
  info!("数据集文件: {}", args.dataset.display());
  info!("监听地址: {}", args.bind);

  // 模型不可用时直接退出
  let classifier = OnnxClassifierBuilder::from_url(&args.model)?
    .build::<DigitFrame>()
    .with_context(|| format!("无法加载模型: {}", args.model))?;
  let classifier: SharedClassifier = Arc::new(classifier);

  let dataset = CsvDataset::new(args.dataset);
  if dataset.exists() {
    info!("发现已有数据集: {}", dataset.path().display());
  }

  let shutdown = Arc::new(Notify::new());
  {
    let shutdown = shutdown.clone();
    ctrlc::set_handler(move || {
      warn!("收到中断信号，停止接收新请求...");
      shutdown.notify_one();
    })
    .context("无法设置中断信号处理")?;
  }

  let listener = TcpListener::bind(args.bind)
    .await
    .with_context(|| format!("无法监听地址: {}", args.bind))?;
  server::serve(listener, AppState::new(classifier, dataset), async move {
    shutdown.notified().await;
  })
  .await?;

  info!("服务已退出");
  Ok(())
}
