// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/detector.rs - 道路隐患检测器
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

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  assess::{HazardAssessment, assess},
  frame::{FrameError, ModelFrame},
  model::{ClassId, ClassLabel, DetectResult, LabelMap, Model},
  output::draw::{Draw, DrawDetectionOnImage, DrawError},
  summary::{HazardSummary, summarize},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("图像预处理错误: {0}")]
  FrameError(#[from] FrameError),
  #[error("模型错误: {0}")]
  ModelError(#[source] BoxError),
  #[error("绘制器初始化错误: {0}")]
  DrawError(#[from] DrawError),
}

/// 一次推理的完整结果
#[derive(Debug, Clone)]
pub struct HazardReport {
  pub annotated: RgbImage,
  pub detections: Vec<HazardSummary>,
  pub assessment: HazardAssessment,
  pub raw_count: usize,
  pub elapsed: Duration,
  pub inferred_at: DateTime<Utc>,
}

/// 不含图像的可序列化结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardRecord {
  pub detections: Vec<HazardSummary>,
  pub assessment: HazardAssessment,
  pub raw_count: usize,
  pub elapsed_ms: u64,
  pub inferred_at: DateTime<Utc>,
}

impl HazardReport {
  pub fn to_record(&self) -> HazardRecord {
    HazardRecord {
      detections: self.detections.clone(),
      assessment: self.assessment.clone(),
      raw_count: self.raw_count,
      elapsed_ms: self.elapsed.as_millis() as u64,
      inferred_at: self.inferred_at,
    }
  }
}

/// 组合模型、类别表和绘制器，进程启动时构造一次，之后只读
pub struct HazardDetector<M> {
  model: M,
  labels: LabelMap,
  draw: Draw,
}

impl<M> HazardDetector<M>
where
  M: Model<Input = ModelFrame, Output = DetectResult<ClassId>>,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  pub fn new(model: M, labels: LabelMap) -> Result<Self, DetectorError> {
    Ok(Self {
      model,
      labels,
      draw: Draw::new()?,
    })
  }

  pub fn labels(&self) -> &LabelMap {
    &self.labels
  }

  /// 运行模型并解析类别名称
  pub fn detect(&self, image: &RgbImage) -> Result<DetectResult<ClassLabel>, DetectorError> {
    let frame = ModelFrame::from_image(image)?;
    let raw = self
      .model
      .infer(&frame)
      .map_err(|e| DetectorError::ModelError(Box::new(e)))?;
    Ok(self.labels.resolve(raw))
  }

  /// 返回标注后的图像和每个类别置信度最高的检测
  pub fn detect_hazards(&self, image: &RgbImage) -> Result<HazardReport, DetectorError> {
    let inferred_at = Utc::now();
    let now = Instant::now();

    let result = self.detect(image)?;
    if result.is_empty() {
      debug!("未检测到任何对象");
    }
    for item in result.items.iter() {
      debug!(
        "  - {}: {:.2}% at [{:.3}, {:.3}, {:.3}, {:.3}]",
        item.kind.name,
        item.score * 100.0,
        item.bbox[0],
        item.bbox[1],
        item.bbox[2],
        item.bbox[3]
      );
    }

    let mut annotated = image.clone();
    self.draw.draw_detections_on_image(&mut annotated, &result);

    let detections = summarize(
      result
        .items
        .iter()
        .map(|item| (item.kind.name.as_str(), item.score as f64)),
    );
    let assessment = assess(&detections);
    let elapsed = now.elapsed();

    info!(
      "推理完成，耗时: {:.2?}，检测到 {} 个对象，{} 个类别，评分 {}",
      elapsed,
      result.len(),
      detections.len(),
      assessment.score
    );

    Ok(HazardReport {
      annotated,
      detections,
      assessment,
      raw_count: result.len(),
      elapsed,
      inferred_at,
    })
  }
}
