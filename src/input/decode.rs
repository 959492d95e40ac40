// 该文件是 Shuzi （数字） 项目的一部分。
// src/input/decode.rs - 图像解码与灰度转换
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

use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::input::InputError;

// ITU-R 601-2 亮度权重，16 位定点
const LUMA_R: u32 = 19595;
const LUMA_G: u32 = 38470;
const LUMA_B: u32 = 7471;

/// 按内容识别格式并解码为灰度图
pub fn decode_gray(bytes: &[u8]) -> Result<GrayImage, InputError> {
  let format = image::guess_format(bytes)?;
  let image = image::load_from_memory_with_format(bytes, format)?;
  debug!(
    "解码图像: 格式 {:?}, 尺寸 {}x{}, 色彩 {:?}",
    format,
    image.width(),
    image.height(),
    image.color()
  );

  if image.width() == 0 || image.height() == 0 {
    return Err(InputError::EmptyImage);
  }

  Ok(to_gray(&image))
}

/// 灰度图保留亮度通道；彩色图按 601 权重合成，忽略 alpha
pub fn to_gray(image: &DynamicImage) -> GrayImage {
  match image {
    DynamicImage::ImageLuma8(_)
    | DynamicImage::ImageLumaA8(_)
    | DynamicImage::ImageLuma16(_)
    | DynamicImage::ImageLumaA16(_) => image.to_luma8(),
    _ => {
      let rgb = image.to_rgb8();
      GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B + 0x8000) >> 16;
        Luma([luma as u8])
      })
    }
  }
}
