// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size},
  rect::Rect,
};
use thiserror::Error;

use crate::model::{DetectItem, DetectResult, WithLabel};

// 文本渲染常量
const LABEL_FONT_SIZE_MIN: f32 = 12.0;
const LABEL_FONT_SIZE_MAX: f32 = 48.0;
const LABEL_FONT_RATIO: f32 = 0.03; // 相对图像短边
const LABEL_TEXT_PADDING: i32 = 2;
const LINE_WIDTH_RATIO: f32 = 0.003;
const LINE_WIDTH_MIN: u32 = 2;
const PALETTE_SIZE: usize = 20;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

static FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("无法加载字体: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

pub trait DrawDetectionOnImage<T: WithLabel> {
  fn draw_detections_on_image(&self, image: &mut RgbImage, result: &DetectResult<T>);
}

/// 在图像上绘制检测框与类别标签
#[derive(Clone)]
pub struct Draw {
  font: FontArc,
  palette: Vec<Rgb<u8>>,
}

impl Draw {
  pub fn new() -> Result<Self, DrawError> {
    let font = FontArc::try_from_slice(FONT_DATA)?;

    // 每个类别使用不同的颜色
    let palette = (0..PALETTE_SIZE)
      .map(|i| {
        let hue = (i as f32 / PALETTE_SIZE as f32) * 360.0;
        hsv_to_rgb(hue, 0.8, 0.9)
      })
      .collect();

    Ok(Self { font, palette })
  }

  pub fn color_for(&self, class_id: u32) -> Rgb<u8> {
    self.palette[class_id as usize % self.palette.len()]
  }

  fn draw_bbox_with_label<T: WithLabel>(&self, image: &mut RgbImage, item: &DetectItem<T>) {
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
      return;
    }
    let (wf, hf) = (w as f32, h as f32);

    let x_min = ((item.bbox[0] * wf).floor() as i32).clamp(0, w as i32 - 1);
    let y_min = ((item.bbox[1] * hf).floor() as i32).clamp(0, h as i32 - 1);
    let x_max = ((item.bbox[2] * wf).ceil() as i32).clamp(0, w as i32 - 1);
    let y_max = ((item.bbox[3] * hf).ceil() as i32).clamp(0, h as i32 - 1);

    if x_min >= x_max || y_min >= y_max {
      return;
    }

    let color = self.color_for(item.kind.to_label_id());
    let line_width = (((wf + hf) / 2.0 * LINE_WIDTH_RATIO).round() as u32).max(LINE_WIDTH_MIN);

    // 逐层向内收缩绘制边框
    for t in 0..line_width as i32 {
      let width = x_max - x_min + 1 - 2 * t;
      let height = y_max - y_min + 1 - 2 * t;
      if width <= 0 || height <= 0 {
        break;
      }
      let rect = Rect::at(x_min + t, y_min + t).of_size(width as u32, height as u32);
      draw_hollow_rect_mut(image, rect, color);
    }

    let label = format!("{} {:.2}", item.kind.to_label_str(), item.score);
    let scale = PxScale::from(
      (w.min(h) as f32 * LABEL_FONT_RATIO).clamp(LABEL_FONT_SIZE_MIN, LABEL_FONT_SIZE_MAX),
    );
    let (text_w, text_h) = text_size(scale, &self.font, &label);
    let label_w = text_w as i32 + 2 * LABEL_TEXT_PADDING;
    let label_h = text_h as i32 + 2 * LABEL_TEXT_PADDING;

    // 标签优先放在框上方，放不下时放在框内
    let label_x = x_min;
    let label_y = if y_min >= label_h { y_min - label_h } else { y_min };
    let label_w = label_w.min(w as i32 - label_x);

    if label_w > 0 && label_h > 0 {
      let rect = Rect::at(label_x, label_y).of_size(label_w as u32, label_h as u32);
      draw_filled_rect_mut(image, rect, color);
      draw_text_mut(
        image,
        TEXT_COLOR,
        label_x + LABEL_TEXT_PADDING,
        label_y + LABEL_TEXT_PADDING,
        scale,
        &self.font,
        &label,
      );
    }
  }
}

impl<T: WithLabel> DrawDetectionOnImage<T> for Draw {
  fn draw_detections_on_image(&self, image: &mut RgbImage, result: &DetectResult<T>) {
    for item in result.items.iter() {
      self.draw_bbox_with_label(image, item);
    }
  }
}

/// HSV 转 RGB
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
  let c = v * s;
  let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
  let m = v - c;

  let (r, g, b) = if h < 60.0 {
    (c, x, 0.0)
  } else if h < 120.0 {
    (x, c, 0.0)
  } else if h < 180.0 {
    (0.0, c, x)
  } else if h < 240.0 {
    (0.0, x, c)
  } else if h < 300.0 {
    (x, 0.0, c)
  } else {
    (c, 0.0, x)
  };

  Rgb([
    ((r + m) * 255.0) as u8,
    ((g + m) * 255.0) as u8,
    ((b + m) * 255.0) as u8,
  ])
}
