// 该文件是 Shuzi （数字） 项目的一部分。
// src/server.rs - HTTP 服务
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

use std::{io::ErrorKind, sync::Arc};

use axum::{
  Json, Router,
  body::Body,
  extract::{DefaultBodyLimit, State, rejection::JsonRejection},
  http::header,
  response::{IntoResponse, Response},
  routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

use crate::{
  input::{ImageEnvelope, PNG_ENVELOPE_HEADER, normalize_image},
  model::{Classification, SharedClassifier},
  output::{CsvDataset, DATASET_FILENAME, FeedbackLabel, Persist},
};

mod error;
pub use self::error::ApiError;

/// 所有请求共享：只读的分类器与只追加的数据集
#[derive(Clone)]
pub struct AppState {
  classifier: SharedClassifier,
  dataset: Arc<CsvDataset>,
}

impl AppState {
  pub fn new(classifier: SharedClassifier, dataset: CsvDataset) -> Self {
    AppState {
      classifier,
      dataset: Arc::new(dataset),
    }
  }
}

/// 请求体上限。画布图像通常只有几十 KB，但任意合法图像都应能被接受，
/// 因此远高于 axum 默认的 2 MB
pub const MAX_REQUEST_BYTES: usize = 64 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/", get(health_check))
    .route("/predict", post(predict))
    .route("/save_feedback", post(save_feedback))
    .route("/download_csv", get(download_csv))
    .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
    .with_state(state)
}

/// 在给定监听器上运行服务，`shutdown` 完成后停止接收新连接
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
  F: Future<Output = ()> + Send + 'static,
{
  info!("HTTP 服务监听于 http://{}", listener.local_addr()?);
  axum::serve(listener, router(state))
    .with_graceful_shutdown(shutdown)
    .await
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
  pub status: &'static str,
  pub csv_found: bool,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
  pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
  pub image: Option<Value>,
  pub label: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
  pub status: &'static str,
  pub message: &'static str,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
  Json(HealthResponse {
    status: "healthy",
    csv_found: state.dataset.exists(),
  })
}

async fn predict(
  State(state): State<AppState>,
  payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Classification>, ApiError> {
  let Json(request) = payload?;
  let image = request
    .image
    .ok_or_else(|| ApiError::BadRequest("No image data found in request".to_string()))?;

  let classifier = state.classifier.clone();
  let now = std::time::Instant::now();
  let result = tokio::task::spawn_blocking(move || -> Result<Classification, ApiError> {
    let envelope = ImageEnvelope::parse(&image)?;
    debug!("图像类型: {:?}", envelope.mime());
    let frame = normalize_image(&envelope.decode()?)?;
    Ok(classifier.infer(&frame)?)
  })
  .await??;

  info!(
    "预测结果: {} (置信度 {:.2}%), 耗时 {:.2?}",
    result.prediction,
    result.confidence * 100.0,
    now.elapsed()
  );
  Ok(Json(result))
}

async fn save_feedback(
  State(state): State<AppState>,
  payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, ApiError> {
  let Json(request) = payload?;
  let (Some(image), Some(label)) = (request.image, request.label) else {
    return Err(ApiError::BadRequest(
      "Missing image or label data in request".to_string(),
    ));
  };

  // 标注先于图像校验，非法标注不会触及数据集
  let label = FeedbackLabel::from_json(&label)?;
  let image = image
    .as_str()
    .ok_or_else(|| ApiError::BadRequest("Invalid image data format.".to_string()))?
    .to_string();

  let dataset = state.dataset.clone();
  tokio::task::spawn_blocking(move || -> Result<(), ApiError> {
    let bytes = ImageEnvelope::parse_strict(&image, PNG_ENVELOPE_HEADER)?.decode()?;
    let frame = normalize_image(&bytes)?;
    dataset.persist(&frame, &label)?;
    Ok(())
  })
  .await??;

  info!(
    "已保存标注 {} 的像素数据到 {}",
    label,
    state.dataset.path().display()
  );
  Ok(Json(FeedbackResponse {
    status: "success",
    message: "Feedback saved successfully.",
  }))
}

async fn download_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
  info!("收到数据集下载请求: {}", state.dataset.path().display());
  let file = match tokio::fs::File::open(state.dataset.path()).await {
    Ok(file) => file,
    Err(e) if e.kind() == ErrorKind::NotFound => return Err(ApiError::DatasetNotFound),
    Err(e) => {
      return Err(ApiError::Internal(format!(
        "could not open dataset for download: {}",
        e
      )));
    }
  };

  let headers = [
    (header::CONTENT_TYPE, "text/csv".to_string()),
    (
      header::CONTENT_DISPOSITION,
      format!("attachment; filename=\"{}\"", DATASET_FILENAME),
    ),
  ];
  Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}
