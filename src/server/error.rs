// 该文件是 Shuzi （数字） 项目的一部分。
// src/server/error.rs - HTTP 错误响应
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

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::{
  input::InputError,
  model::ModelError,
  output::{DatasetError, LabelError},
};

/// 请求边界上的错误，统一转换为 `{"error": ...}` 响应
#[derive(Error, Debug)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),
  #[error(transparent)]
  Input(#[from] InputError),
  #[error(transparent)]
  Label(#[from] LabelError),
  #[error("Error during model prediction: {0}")]
  Model(#[from] ModelError),
  #[error(transparent)]
  Dataset(#[from] DatasetError),
  #[error("CSV file not found. Submit some feedback first.")]
  DatasetNotFound,
  #[error("An unexpected server error occurred: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) | ApiError::Label(_) => StatusCode::BAD_REQUEST,
      ApiError::Input(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
      ApiError::DatasetNotFound => StatusCode::NOT_FOUND,
      ApiError::Input(_) | ApiError::Model(_) | ApiError::Dataset(_) | ApiError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(format!("Invalid JSON request: {}", rejection.body_text()))
  }
}

impl From<tokio::task::JoinError> for ApiError {
  fn from(err: tokio::task::JoinError) -> Self {
    ApiError::Internal(err.to_string())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = self.to_string();
    if status.is_server_error() {
      error!("请求处理失败 ({}): {}", status, message);
    } else {
      warn!("请求被拒绝 ({}): {}", status, message);
    }
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::FrameError;

  #[test]
  fn test_status_mapping() {
    assert_eq!(
      ApiError::from(InputError::MissingSeparator).status(),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(
      ApiError::from(LabelError("10".into())).status(),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(
      ApiError::from(InputError::Frame(FrameError::SizeMismatch {
        expected: 784,
        actual: 1
      }))
      .status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
      ApiError::from(ModelError::NonFiniteScore).status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(ApiError::DatasetNotFound.status(), StatusCode::NOT_FOUND);
  }
}
