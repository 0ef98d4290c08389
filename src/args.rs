// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/args.rs - 服务参数配置
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

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use url::Url;

use raincity_hazard::{
  model::{DEFAULT_CONFIDENCE, DEFAULT_IOU, DEFAULT_MAX_DETECTIONS},
  service::{DEFAULT_CONCURRENCY, DEFAULT_MAX_UPLOAD_MB, ServiceConfig},
};

/// RainCity Hazard 网页服务参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型路径，例如 onnx:///models/best.onnx
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 类别名称文件（TOML，names = [...]）
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,

  /// 监听地址
  #[arg(long, default_value = "127.0.0.1:7860", value_name = "ADDR")]
  pub listen: SocketAddr,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE, value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_IOU, value_name = "THRESHOLD")]
  pub iou: f32,

  /// 单张图像最多保留的检测数
  #[arg(long, default_value_t = DEFAULT_MAX_DETECTIONS, value_name = "COUNT")]
  pub max_detections: usize,

  /// 同时进行的推理数，其余请求排队
  #[arg(long, default_value_t = DEFAULT_CONCURRENCY, value_name = "COUNT")]
  pub concurrency: usize,

  /// 上传图像大小上限（MB）
  #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_MB, value_name = "MB")]
  pub max_upload_mb: usize,
}

impl Args {
  pub fn service_config(&self) -> ServiceConfig {
    ServiceConfig {
      concurrency: self.concurrency,
      max_upload_bytes: self.max_upload_mb * 1024 * 1024,
    }
  }
}
