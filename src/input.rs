// 该文件是 Shuzi （数字） 项目的一部分。
// src/input.rs - 图像输入与预处理
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

use thiserror::Error;

use crate::frame::{DigitFrame, FrameError};

pub trait AsGrayFrame<const W: u32, const H: u32> {
  fn as_gray(&self) -> &[u8];

  /// 缩放到 [0, 1] 的浮点像素，顺序与 `as_gray` 一致
  fn to_unit_scale(&self) -> Vec<f32> {
    self.as_gray().iter().map(|&p| p as f32 / 255.0).collect()
  }
}

mod data_url;
pub use self::data_url::{ImageEnvelope, PNG_ENVELOPE_HEADER};

mod decode;
pub use self::decode::{decode_gray, to_gray};

mod resize;
pub use self::resize::area_resize;

mod read_image_file;
pub use self::read_image_file::ImageFileInput;

#[derive(Error, Debug)]
pub enum InputError {
  #[error("Invalid base64 header: missing ',' separator")]
  MissingSeparator,
  #[error("Invalid image data format: expected '{expected}', found '{actual}'")]
  EnvelopeMismatch { expected: String, actual: String },
  #[error("Invalid base64 image data: {0}")]
  Base64(#[from] base64::DecodeError),
  #[error("Could not decode image data: {0}")]
  Image(#[from] image::ImageError),
  #[error("Could not decode image data: image has zero width or height")]
  EmptyImage,
  #[error("Error during image preprocessing: {0}")]
  Frame(#[from] FrameError),
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
  #[error("URI scheme mismatch: expected '{expected}', found '{actual}'")]
  SchemeMismatch { expected: String, actual: String },
}

impl InputError {
  /// 是否为调用方提交的数据有误（而非服务端处理失败）
  pub fn is_client_error(&self) -> bool {
    matches!(
      self,
      InputError::MissingSeparator
        | InputError::EnvelopeMismatch { .. }
        | InputError::Base64(_)
        | InputError::Image(_)
        | InputError::EmptyImage
    )
  }
}

/// 解码任意格式的图像字节，转换为灰度并按面积重采样到 28x28
pub fn normalize_image(bytes: &[u8]) -> Result<DigitFrame, InputError> {
  let gray = decode_gray(bytes)?;
  area_resize(&gray)
}

#[cfg(test)]
pub(crate) mod testing {
  use std::io::Cursor;

  use image::{DynamicImage, ImageFormat};

  pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
  }
}
