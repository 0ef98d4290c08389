// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/model/yolo.rs - 基于 tract 的 YOLO ONNX 模型
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

use thiserror::Error;
use tracing::{debug, info};
use tract_onnx::prelude::*;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{AsNchwFrame, MODEL_INPUT_SIZE, ModelFrame},
  model::{ClassId, DetectItem, DetectResult, Model, YoloLayout, decode_yolo_output},
};

/// 默认置信度阈值
pub const DEFAULT_CONFIDENCE: f32 = 0.25;
/// 默认 NMS IoU 阈值
pub const DEFAULT_IOU: f32 = 0.7;
/// 单张图像最多保留的检测数
pub const DEFAULT_MAX_DETECTIONS: usize = 300;

const INPUT_SIDE: usize = MODEL_INPUT_SIZE as usize;

#[derive(Error, Debug)]
pub enum YoloError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("模型无效: {0}, 错误: {1:#}")]
  ModelInvalid(String, TractError),
  #[error("模型推理错误: {0:#}")]
  InferenceError(TractError),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("不支持的输出形状: {0:?}")]
  UnsupportedOutput(Vec<usize>),
  #[error("输出长度不匹配: 期望 {expected}, 实际 {actual}")]
  OutputSize { expected: usize, actual: usize },
  #[error("参数无效: {0}")]
  InvalidParameter(String),
}

impl YoloError {
  pub fn invalid(msg: &str, e: TractError) -> Self {
    YoloError::ModelInvalid(msg.to_string(), e)
  }
}

pub struct YoloOnnxBuilder {
  model_path: String,
  confidence: f32,
  iou: f32,
  max_detections: usize,
}

impl FromUrlWithScheme for YoloOnnxBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for YoloOnnxBuilder {
  type Error = YoloError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(YoloError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    Ok(YoloOnnxBuilder {
      model_path: url.path().to_string(),
      confidence: DEFAULT_CONFIDENCE,
      iou: DEFAULT_IOU,
      max_detections: DEFAULT_MAX_DETECTIONS,
    })
  }
}

impl YoloOnnxBuilder {
  pub fn confidence(mut self, confidence: f32) -> Self {
    self.confidence = confidence;
    self
  }

  pub fn iou(mut self, iou: f32) -> Self {
    self.iou = iou;
    self
  }

  pub fn max_detections(mut self, max_detections: usize) -> Self {
    self.max_detections = max_detections;
    self
  }

  pub fn build(self) -> Result<YoloOnnx, YoloError> {
    for (name, value) in [("confidence", self.confidence), ("iou", self.iou)] {
      if !(0.0..=1.0).contains(&value) {
        return Err(YoloError::InvalidParameter(format!(
          "{} 必须在 0.0 - 1.0 之间, 实际为 {}",
          name, value
        )));
      }
    }

    info!("加载模型文件: {}", self.model_path);
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    let now = std::time::Instant::now();
    let plan = tract_onnx::onnx()
      .model_for_read(&mut model_data.as_slice())
      .map_err(|e| YoloError::invalid("无法解析 ONNX 模型", e))?
      .with_input_fact(
        0,
        InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, INPUT_SIDE, INPUT_SIDE)),
      )
      .map_err(|e| YoloError::invalid("无法设置模型输入形状", e))?
      .into_optimized()
      .map_err(|e| YoloError::invalid("无法优化模型", e))?
      .into_runnable()
      .map_err(|e| YoloError::invalid("无法构建推理计划", e))?;
    info!("模型加载完成，耗时: {:.2?}", now.elapsed());

    Ok(YoloOnnx {
      plan,
      confidence: self.confidence,
      iou: self.iou,
      max_detections: self.max_detections,
    })
  }
}

/// YOLO 检测模型，输入为 640x640 letterbox 帧
pub struct YoloOnnx {
  plan: TypedRunnableModel<TypedModel>,
  confidence: f32,
  iou: f32,
  max_detections: usize,
}

impl YoloOnnx {
  fn build_input(frame: &ModelFrame) -> Tensor {
    let data = frame.as_nchw();
    let plane = INPUT_SIDE * INPUT_SIDE;
    tract_ndarray::Array4::from_shape_fn((1, 3, INPUT_SIDE, INPUT_SIDE), |(_, c, y, x)| {
      data[c * plane + y * INPUT_SIDE + x] as f32 / 255.0
    })
    .into_tensor()
  }
}

impl Model for YoloOnnx {
  type Input = ModelFrame;
  type Output = DetectResult<ClassId>;
  type Error = YoloError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("设置模型输入");
    let tensor = Self::build_input(input);

    debug!("执行模型推理");
    let outputs = self
      .plan
      .run(tvec!(tensor.into()))
      .map_err(YoloError::InferenceError)?;

    let output = outputs
      .first()
      .ok_or_else(|| YoloError::UnsupportedOutput(Vec::new()))?;
    let layout = YoloLayout::from_shape(output.shape())?;
    debug!("模型输出形状: {:?} -> {:?}", output.shape(), layout);

    let view = output
      .to_array_view::<f32>()
      .map_err(YoloError::InferenceError)?;
    let data: Vec<f32> = view.iter().copied().collect();

    let letterbox = input.letterbox();
    let items: Vec<_> = decode_yolo_output(
      layout,
      &data,
      self.confidence,
      self.iou,
      self.max_detections,
    )?
    .into_iter()
    .map(|item| DetectItem {
      bbox: letterbox.unmap(item.bbox),
      ..item
    })
    .collect();

    Ok(DetectResult::from(items))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builder_requires_onnx_scheme() {
    let url = Url::parse("rknn:///models/best.rknn").unwrap();
    assert!(matches!(
      YoloOnnxBuilder::from_url(&url),
      Err(YoloError::ModelPathError(_))
    ));
  }

  #[test]
  fn builder_rejects_out_of_range_threshold() {
    let url = Url::parse("onnx:///models/best.onnx").unwrap();
    let result = YoloOnnxBuilder::from_url(&url)
      .unwrap()
      .confidence(1.5)
      .build();
    assert!(matches!(result, Err(YoloError::InvalidParameter(_))));
  }

  #[test]
  fn missing_model_file_is_fatal() {
    let url = Url::parse("onnx:///nonexistent/raincity/best.onnx").unwrap();
    let result = YoloOnnxBuilder::from_url(&url).unwrap().build();
    assert!(matches!(result, Err(YoloError::ModelLoadError(_))));
  }

  #[test]
  fn garbage_model_file_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.onnx");
    std::fs::write(&path, b"not a protobuf at all").unwrap();
    let url = Url::parse(&format!("onnx://{}", path.display())).unwrap();
    let result = YoloOnnxBuilder::from_url(&url).unwrap().build();
    assert!(matches!(result, Err(YoloError::ModelInvalid(..))));
  }
}
