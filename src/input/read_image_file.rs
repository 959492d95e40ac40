// 该文件是 Shuzi （数字） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::DigitFrame,
  input::{InputError, normalize_image},
};

/// 从磁盘读取单张图像，迭代一次得到预处理后的帧
pub struct ImageFileInput {
  path: String,
  bytes: Option<Vec<u8>>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(InputError::SchemeMismatch {
        expected: Self::SCHEME.to_string(),
        actual: url.scheme().to_string(),
      });
    }

    let path = url.path().to_string();
    info!("读取图像文件: {}", path);
    let bytes = std::fs::read(&path)?;

    Ok(ImageFileInput {
      path,
      bytes: Some(bytes),
    })
  }
}

impl ImageFileInput {
  pub fn path(&self) -> &str {
    &self.path
  }
}

impl Iterator for ImageFileInput {
  type Item = Result<DigitFrame, InputError>;

  fn next(&mut self) -> Option<Self::Item> {
    self.bytes.take().map(|bytes| normalize_image(&bytes))
  }
}

#[cfg(test)]
mod tests {
  use image::{DynamicImage, GrayImage, Luma};
  use tempfile::tempdir;

  use super::*;
  use crate::input::testing::encode_png;

  #[test]
  fn test_reads_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("seven.png");
    let image = GrayImage::from_pixel(56, 56, Luma([255]));
    std::fs::write(&path, encode_png(&DynamicImage::ImageLuma8(image))).unwrap();

    let url = Url::parse(&format!("image://{}", path.display())).unwrap();

    let mut input = ImageFileInput::from_url(&url).unwrap();
    let frame = input.next().unwrap().unwrap();
    assert!(frame.pixels().iter().all(|&p| p == 255));
    assert!(input.next().is_none());
  }

  #[test]
  fn test_scheme_mismatch() {
    let url = Url::parse("file:///tmp/seven.png").unwrap();
    let err = ImageFileInput::from_url(&url).err().unwrap();
    assert!(matches!(err, InputError::SchemeMismatch { .. }));
  }

  #[test]
  fn test_missing_file() {
    let url = Url::parse("image:///nonexistent/definitely/missing.png").unwrap();
    let err = ImageFileInput::from_url(&url).err().unwrap();
    assert!(matches!(err, InputError::Io(_)));
  }
}
