// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/frame.rs - NCHW 帧与 letterbox 几何
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 RainCity Hazard 项目组

use image::{RgbImage, imageops::FilterType};
use thiserror::Error;

const RGB_CHANNELS: usize = 3;

/// 模型输入边长
pub const MODEL_INPUT_SIZE: u32 = 640;
/// letterbox 填充灰度值
pub const LETTERBOX_FILL: u8 = 114;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
  #[error("图像尺寸为空: {0}x{1}")]
  EmptyImage(u32, u32),
}

pub trait AsNchwFrame<const W: u32, const H: u32> {
  fn as_nchw(&self) -> &[u8];
}

#[derive(Debug, Clone)]
pub struct RgbNchwFrame<const W: u32, const H: u32> {
  data: Box<[u8]>,
}

impl<const W: u32, const H: u32> RgbNchwFrame<W, H> {
  const LEN: usize = RGB_CHANNELS * W as usize * H as usize;

  /// 以常量像素值填满整帧
  pub fn filled(value: u8) -> Self {
    Self {
      data: vec![value; Self::LEN].into_boxed_slice(),
    }
  }
}

impl<const W: u32, const H: u32> AsMut<[u8]> for RgbNchwFrame<W, H> {
  fn as_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }
}

impl<const W: u32, const H: u32> AsNchwFrame<W, H> for RgbNchwFrame<W, H> {
  fn as_nchw(&self) -> &[u8] {
    &self.data
  }
}

/// 原图到模型输入之间的等比缩放与居中填充
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
  pub scale: f32,
  pub pad_x: u32,
  pub pad_y: u32,
  pub resized_width: u32,
  pub resized_height: u32,
  pub source_width: u32,
  pub source_height: u32,
}

impl Letterbox {
  pub fn fit(
    source_width: u32,
    source_height: u32,
    target_width: u32,
    target_height: u32,
  ) -> Result<Self, FrameError> {
    if source_width == 0 || source_height == 0 {
      return Err(FrameError::EmptyImage(source_width, source_height));
    }

    let scale = (target_width as f32 / source_width as f32)
      .min(target_height as f32 / source_height as f32);
    let resized_width = ((source_width as f32 * scale).round() as u32).clamp(1, target_width);
    let resized_height = ((source_height as f32 * scale).round() as u32).clamp(1, target_height);

    Ok(Self {
      scale,
      pad_x: (target_width - resized_width) / 2,
      pad_y: (target_height - resized_height) / 2,
      resized_width,
      resized_height,
      source_width,
      source_height,
    })
  }

  /// 模型输入坐标 [x_min, y_min, x_max, y_max] 映射为原图归一化坐标
  pub fn unmap(&self, bbox: [f32; 4]) -> [f32; 4] {
    let sx = self.resized_width as f32 / self.source_width as f32;
    let sy = self.resized_height as f32 / self.source_height as f32;
    let fx = |v: f32| ((v - self.pad_x as f32) / sx / self.source_width as f32).clamp(0.0, 1.0);
    let fy = |v: f32| ((v - self.pad_y as f32) / sy / self.source_height as f32).clamp(0.0, 1.0);
    [fx(bbox[0]), fy(bbox[1]), fx(bbox[2]), fy(bbox[3])]
  }
}

/// 经过 letterbox 处理后的模型输入帧
#[derive(Debug, Clone)]
pub struct LetterboxFrame<const W: u32, const H: u32> {
  frame: RgbNchwFrame<W, H>,
  letterbox: Letterbox,
}

/// 默认模型输入帧
pub type ModelFrame = LetterboxFrame<MODEL_INPUT_SIZE, MODEL_INPUT_SIZE>;

impl<const W: u32, const H: u32> LetterboxFrame<W, H> {
  pub fn from_image(image: &RgbImage) -> Result<Self, FrameError> {
    let letterbox = Letterbox::fit(image.width(), image.height(), W, H)?;
    let resized = image::imageops::resize(
      image,
      letterbox.resized_width,
      letterbox.resized_height,
      FilterType::Triangle,
    );

    let mut frame = RgbNchwFrame::<W, H>::filled(LETTERBOX_FILL);
    let plane = (W * H) as usize;
    let slice = frame.as_mut();
    for (x, y, pixel) in resized.enumerate_pixels() {
      let idx = ((y + letterbox.pad_y) * W + (x + letterbox.pad_x)) as usize;
      for c in 0..RGB_CHANNELS {
        slice[c * plane + idx] = pixel[c];
      }
    }

    Ok(Self { frame, letterbox })
  }

  pub fn letterbox(&self) -> &Letterbox {
    &self.letterbox
  }
}

impl<const W: u32, const H: u32> AsNchwFrame<W, H> for LetterboxFrame<W, H> {
  fn as_nchw(&self) -> &[u8] {
    self.frame.as_nchw()
  }
}
