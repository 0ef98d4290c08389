// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/main.rs - 网页服务主程序
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

mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Notify;
use tracing::{info, warn};

use raincity_hazard::{
  FromUrl,
  detector::HazardDetector,
  model::{LabelMap, YoloOnnxBuilder},
  service,
};

#[tokio::main]
async fn main() -> Result<()> {
  raincity_hazard::init_tracing();

  let args = args::Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("置信度阈值: {}", args.confidence);
  info!("NMS 阈值: {}", args.iou);
  info!("并发推理数: {}", args.concurrency);

  let labels = match &args.labels {
    Some(path) => LabelMap::from_path(path)?,
    None => {
      warn!("未指定类别文件，类别名称将显示为 class-<id>");
      LabelMap::default()
    }
  };

  let model = YoloOnnxBuilder::from_url(&args.model)?
    .confidence(args.confidence)
    .iou(args.iou)
    .max_detections(args.max_detections)
    .build()?;
  let detector = HazardDetector::new(model, labels)?;
  let app = service::router(detector, &args.service_config());

  let listener = tokio::net::TcpListener::bind(args.listen)
    .await
    .with_context(|| format!("无法监听地址: {}", args.listen))?;

  let shutdown = Arc::new(Notify::new());
  let notify = Arc::clone(&shutdown);
  ctrlc::set_handler(move || {
    info!("收到中断信号，准备退出...");
    notify.notify_one();
  })
  .context("无法设置 Ctrl-C 处理函数")?;

  service::serve(listener, app, async move { shutdown.notified().await }).await?;

  info!("服务已退出");
  Ok(())
}
