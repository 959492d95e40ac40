// 该文件是 Shuzi （数字） 项目的一部分。
// src/frame.rs - 灰度帧定义
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

use crate::input::AsGrayFrame;

/// 手写数字模型的输入边长
pub const DIGIT_SIDE: u32 = 28;

/// 28x28 灰度帧
pub type DigitFrame = GrayFrame<DIGIT_SIDE, DIGIT_SIDE>;

#[derive(Error, Debug)]
pub enum FrameError {
  #[error("Frame size mismatch: expected {expected} pixels, got {actual}")]
  SizeMismatch { expected: usize, actual: usize },
}

/// 单通道灰度帧，按行优先存储，像素值 0-255
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame<const W: u32, const H: u32> {
  data: Box<[u8]>,
}

impl<const W: u32, const H: u32> GrayFrame<W, H> {
  pub const PIXELS: usize = (W as usize) * (H as usize);

  pub fn pixel(&self, x: u32, y: u32) -> u8 {
    self.data[(y as usize) * (W as usize) + (x as usize)]
  }

  /// 行优先展平的像素
  pub fn pixels(&self) -> &[u8] {
    &self.data
  }
}

impl<const W: u32, const H: u32> TryFrom<Vec<u8>> for GrayFrame<W, H> {
  type Error = FrameError;

  fn try_from(data: Vec<u8>) -> Result<Self, Self::Error> {
    if data.len() != Self::PIXELS {
      return Err(FrameError::SizeMismatch {
        expected: Self::PIXELS,
        actual: data.len(),
      });
    }

    Ok(Self {
      data: data.into_boxed_slice(),
    })
  }
}

impl<const W: u32, const H: u32> Default for GrayFrame<W, H> {
  fn default() -> Self {
    Self {
      data: vec![0u8; Self::PIXELS].into_boxed_slice(),
    }
  }
}

impl<const W: u32, const H: u32> AsMut<[u8]> for GrayFrame<W, H> {
  fn as_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }
}

impl<const W: u32, const H: u32> AsGrayFrame<W, H> for GrayFrame<W, H> {
  fn as_gray(&self) -> &[u8] {
    &self.data
  }
}
