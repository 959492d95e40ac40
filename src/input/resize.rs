// 该文件是 Shuzi （数字） 项目的一部分。
// src/input/resize.rs - 面积插值重采样
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

use image::GrayImage;
use tracing::debug;

use crate::{frame::GrayFrame, input::InputError};

const MIN_WEIGHT: f64 = 1e-9;

/// 一个目标像素在某一轴上覆盖的源像素及其覆盖长度
fn axis_weights(src_len: u32, dst_len: u32) -> Vec<Vec<(u32, f64)>> {
  let scale = src_len as f64 / dst_len as f64;
  (0..dst_len)
    .map(|d| {
      let start = d as f64 * scale;
      let end = ((d + 1) as f64 * scale).min(src_len as f64);
      let first = start.floor() as u32;
      let last = (end.ceil() as u32).min(src_len);
      (first..last)
        .filter_map(|s| {
          let weight = end.min((s + 1) as f64) - start.max(s as f64);
          (weight > MIN_WEIGHT).then_some((s, weight))
        })
        .collect()
    })
    .collect()
}

/// 面积重采样：每个目标像素取其覆盖区域内源像素按覆盖面积加权的均值。
///
/// 缩小时相当于盒式滤波，抗锯齿笔画的灰度得以保留；尺寸一致时原样返回。
pub fn area_resize<const W: u32, const H: u32>(
  src: &GrayImage,
) -> Result<GrayFrame<W, H>, InputError> {
  let (src_w, src_h) = src.dimensions();
  if src_w == 0 || src_h == 0 {
    return Err(InputError::EmptyImage);
  }

  if (src_w, src_h) == (W, H) {
    return Ok(GrayFrame::try_from(src.as_raw().clone())?);
  }

  debug!("面积重采样: {}x{} -> {}x{}", src_w, src_h, W, H);
  let xs = axis_weights(src_w, W);
  let ys = axis_weights(src_h, H);

  let mut data = Vec::with_capacity((W as usize) * (H as usize));
  for row in &ys {
    for col in &xs {
      let mut acc = 0.0;
      let mut area = 0.0;
      for &(sy, wy) in row {
        for &(sx, wx) in col {
          let weight = wx * wy;
          acc += src.get_pixel(sx, sy).0[0] as f64 * weight;
          area += weight;
        }
      }
      let value = if area > 0.0 { acc / area } else { 0.0 };
      data.push(value.round().clamp(0.0, 255.0) as u8);
    }
  }

  Ok(GrayFrame::try_from(data)?)
}
