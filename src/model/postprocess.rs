// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/model/postprocess.rs - YOLO 输出解码与非极大值抑制
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

use tracing::debug;

use crate::model::{ClassId, DetectItem, YoloError};

/// 端到端输出每行的长度: x1, y1, x2, y2, score, class
const END_TO_END_ROW: usize = 6;

/// YOLO 输出张量布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YoloLayout {
  /// `[1, 4 + classes, anchors]`，需要 NMS
  Anchors { classes: usize, anchors: usize },
  /// `[1, rows, 6]`，模型内部已完成 NMS
  EndToEnd { rows: usize },
}

impl YoloLayout {
  pub fn from_shape(shape: &[usize]) -> Result<Self, YoloError> {
    match shape {
      [1, rows, END_TO_END_ROW] if *rows > END_TO_END_ROW => Ok(YoloLayout::EndToEnd { rows: *rows }),
      [1, channels, anchors] if *channels > 4 && *anchors > 0 => Ok(YoloLayout::Anchors {
        classes: channels - 4,
        anchors: *anchors,
      }),
      _ => Err(YoloError::UnsupportedOutput(shape.to_vec())),
    }
  }

  fn expected_len(&self) -> usize {
    match *self {
      YoloLayout::Anchors { classes, anchors } => (classes + 4) * anchors,
      YoloLayout::EndToEnd { rows } => rows * END_TO_END_ROW,
    }
  }
}

/// 解码模型原始输出。
///
/// 返回的边界框处于模型输入像素坐标系，按置信度降序排列。
pub fn decode_yolo_output(
  layout: YoloLayout,
  data: &[f32],
  confidence: f32,
  iou_threshold: f32,
  max_detections: usize,
) -> Result<Vec<DetectItem<ClassId>>, YoloError> {
  let expected = layout.expected_len();
  if data.len() != expected {
    return Err(YoloError::OutputSize {
      expected,
      actual: data.len(),
    });
  }

  let mut items = match layout {
    YoloLayout::Anchors { classes, anchors } => {
      let mut candidates = Vec::new();
      for i in 0..anchors {
        let (mut best_score, mut best_class) = (f32::MIN, 0usize);
        for c in 0..classes {
          let score = data[(4 + c) * anchors + i];
          if score > best_score {
            best_score = score;
            best_class = c;
          }
        }

        if best_score < confidence {
          continue;
        }

        let cx = data[i];
        let cy = data[anchors + i];
        let w = data[2 * anchors + i];
        let h = data[3 * anchors + i];
        candidates.push(DetectItem {
          kind: ClassId(best_class as u32),
          score: best_score,
          bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
        });
      }
      debug!("置信度过滤后候选框数量: {}", candidates.len());
      nms(candidates, iou_threshold)
    }
    YoloLayout::EndToEnd { .. } => {
      let mut rows: Vec<_> = data
        .chunks_exact(END_TO_END_ROW)
        .filter(|row| row[4] >= confidence)
        .map(|row| DetectItem {
          kind: ClassId(row[5].max(0.0).round() as u32),
          score: row[4],
          bbox: [row[0], row[1], row[2], row[3]],
        })
        .collect();
      sort_by_score(&mut rows);
      rows
    }
  };

  items.truncate(max_detections);
  Ok(items)
}

fn sort_by_score<T>(items: &mut [DetectItem<T>]) {
  items.sort_by(|a, b| {
    b.score
      .partial_cmp(&a.score)
      .unwrap_or(std::cmp::Ordering::Equal)
  });
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
  let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
  let union = area_a + area_b - intersection;

  if union > 0.0 { intersection / union } else { 0.0 }
}

/// 按类别的非极大值抑制，结果按置信度降序
pub fn nms<T: PartialEq>(mut items: Vec<DetectItem<T>>, iou_threshold: f32) -> Vec<DetectItem<T>> {
  sort_by_score(&mut items);

  let mut keep: Vec<DetectItem<T>> = Vec::with_capacity(items.len());
  for item in items {
    let suppressed = keep
      .iter()
      .any(|k| k.kind == item.kind && iou(&k.bbox, &item.bbox) > iou_threshold);
    if !suppressed {
      keep.push(item);
    }
  }
  keep
}
