// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/input.rs - 图像输入
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

use std::io::Cursor;

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::debug;

mod read_image_file;
pub use self::read_image_file::ImageFileInput;

#[derive(Error, Debug)]
pub enum InputError {
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{actual}'")]
  SchemeMismatch {
    expected: &'static str,
    actual: String,
  },
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像解码错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("图像数据为空")]
  EmptyData,
}

/// 从内存中的编码数据解码图像，格式由内容自动识别
pub fn decode_image_bytes(data: &[u8]) -> Result<RgbImage, InputError> {
  if data.is_empty() {
    return Err(InputError::EmptyData);
  }

  let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
  debug!("上传图像格式: {:?}", reader.format());
  let image = reader.decode()?;
  Ok(image.into_rgb8())
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{ImageFormat, Rgb};

  fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image
      .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
      .unwrap();
    buf
  }

  #[test]
  fn decodes_png() {
    let image = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
    let decoded = decode_image_bytes(&png_bytes(&image)).unwrap();
    assert_eq!(decoded.dimensions(), (3, 2));
    assert_eq!(decoded.get_pixel(2, 1), &Rgb([1, 2, 3]));
  }

  #[test]
  fn rejects_empty_data() {
    assert!(matches!(decode_image_bytes(&[]), Err(InputError::EmptyData)));
  }

  #[test]
  fn rejects_garbage() {
    let err = decode_image_bytes(b"definitely not an image").unwrap_err();
    assert!(matches!(err, InputError::ImageLoadError(_)));
  }
}
