// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/model.rs - 模型
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

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

pub trait WithLabel: Sized + std::fmt::Debug {
  fn to_label_str(&self) -> String;
  fn to_label_id(&self) -> u32;
}

/// 模型输出的类别索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

impl WithLabel for ClassId {
  fn to_label_str(&self) -> String {
    format!("class-{}", self.0)
  }

  fn to_label_id(&self) -> u32 {
    self.0
  }
}

/// 带名称的类别
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassLabel {
  pub id: ClassId,
  pub name: String,
}

impl WithLabel for ClassLabel {
  fn to_label_str(&self) -> String {
    self.name.clone()
  }

  fn to_label_id(&self) -> u32 {
    self.id.0
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectItem<T> {
  pub kind: T,
  pub score: f32,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]，相对原图归一化
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectResult<T> {
  pub items: Box<[DetectItem<T>]>,
}

impl<T> DetectResult<T> {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn map_kind<U>(self, mut f: impl FnMut(T) -> U) -> DetectResult<U> {
    let items = self
      .items
      .into_vec()
      .into_iter()
      .map(|DetectItem { kind, score, bbox }| DetectItem {
        kind: f(kind),
        score,
        bbox,
      })
      .collect();
    DetectResult { items }
  }
}

impl<T> From<Vec<DetectItem<T>>> for DetectResult<T> {
  fn from(items: Vec<DetectItem<T>>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

mod labels;
pub use self::labels::{LabelError, LabelMap};

mod postprocess;
pub use self::postprocess::{YoloLayout, decode_yolo_output, nms};

mod yolo;
pub use self::yolo::{
  DEFAULT_CONFIDENCE, DEFAULT_IOU, DEFAULT_MAX_DETECTIONS, YoloError, YoloOnnx, YoloOnnxBuilder,
};
