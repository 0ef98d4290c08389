// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// tests/common/mod.rs - 测试用桩模型
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

#![allow(dead_code)]

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use raincity_hazard::{
  frame::ModelFrame,
  model::{ClassId, DetectItem, DetectResult, LabelMap, Model},
};

/// 返回固定检测结果的模型
pub struct StubModel {
  pub items: Vec<DetectItem<ClassId>>,
}

impl Model for StubModel {
  type Input = ModelFrame;
  type Output = DetectResult<ClassId>;
  type Error = std::io::Error;

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(DetectResult::from(self.items.clone()))
  }
}

/// 总是失败的模型
pub struct FailingModel;

impl Model for FailingModel {
  type Input = ModelFrame;
  type Output = DetectResult<ClassId>;
  type Error = std::io::Error;

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Err(std::io::Error::other("inference failed"))
  }
}

pub fn item(class: u32, score: f32, bbox: [f32; 4]) -> DetectItem<ClassId> {
  DetectItem {
    kind: ClassId(class),
    score,
    bbox,
  }
}

pub fn road_model() -> StubModel {
  StubModel {
    items: vec![
      item(0, 0.40, [0.10, 0.10, 0.30, 0.30]),
      item(1, 0.912345, [0.50, 0.50, 0.90, 0.80]),
      item(0, 0.85, [0.60, 0.10, 0.80, 0.40]),
      item(0, 0.60, [0.05, 0.60, 0.25, 0.90]),
    ],
  }
}

pub fn road_labels() -> LabelMap {
  LabelMap::new(vec!["pothole".into(), "debris".into()])
}

pub fn road_image() -> RgbImage {
  RgbImage::from_pixel(160, 120, Rgb([90, 90, 90]))
}

pub fn png_bytes(image: &RgbImage) -> Vec<u8> {
  let mut buf = Vec::new();
  image
    .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
    .expect("png encode");
  buf
}
