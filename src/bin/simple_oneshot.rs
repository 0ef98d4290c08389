// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/bin/simple_oneshot.rs - 单张图像推理
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use raincity_hazard::{
  FromUrl,
  detector::HazardDetector,
  input::ImageFileInput,
  model::{DEFAULT_CONFIDENCE, DEFAULT_IOU, LabelMap, YoloOnnxBuilder},
  output::SaveImageFileOutput,
  task::{OneShotTask, Task},
};
use tracing::info;

/// 单张图像推理参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型路径
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 类别名称文件
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,
  /// 输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 置信度阈值
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE, value_name = "THRESHOLD")]
  pub confidence: f32,
  /// NMS IOU 阈值
  #[arg(long, default_value_t = DEFAULT_IOU, value_name = "THRESHOLD")]
  pub iou: f32,
}

fn main() -> Result<()> {
  raincity_hazard::init_tracing();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let labels = match &args.labels {
    Some(path) => LabelMap::from_path(path)?,
    None => LabelMap::default(),
  };
  let input = ImageFileInput::from_url(&args.input)?;
  let model = YoloOnnxBuilder::from_url(&args.model)?
    .confidence(args.confidence)
    .iou(args.iou)
    .build()?;
  let detector = HazardDetector::new(model, labels)?;
  let output = SaveImageFileOutput::from_url(&args.output)?;

  let record = OneShotTask.run_task(input, &detector, output)?;
  println!("{}", serde_json::to_string_pretty(&record.detections)?);

  Ok(())
}
