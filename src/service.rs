// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/service.rs - 网页交互界面与推理接口
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

mod html;

use std::{future::Future, io::Cursor, sync::Arc};

use axum::{
  Json, Router,
  body::Bytes,
  extract::{DefaultBodyLimit, State},
  http::StatusCode,
  response::{Html, IntoResponse, Response},
  routing::{get, post},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use image::{ImageFormat, RgbImage};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tokio::{net::TcpListener, sync::Semaphore};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::{
  detector::{DetectorError, HazardDetector, HazardRecord},
  frame::ModelFrame,
  input::{InputError, decode_image_bytes},
  model::{ClassId, DetectResult, Model},
};

/// 默认并发推理数，超出的请求排队等待
pub const DEFAULT_CONCURRENCY: usize = 1;
/// 默认上传大小上限（MB）
pub const DEFAULT_MAX_UPLOAD_MB: usize = 16;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
  pub concurrency: usize,
  pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      concurrency: DEFAULT_CONCURRENCY,
      max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
    }
  }
}

pub struct AppState<M> {
  detector: Arc<HazardDetector<M>>,
  queue: Arc<Semaphore>,
  concurrency: usize,
}

#[derive(Error, Debug)]
pub enum ApiError {
  #[error("图像数据无效: {0}")]
  BadImage(#[from] InputError),
  #[error("推理失败: {0}")]
  Detector(#[from] DetectorError),
  #[error("图像编码失败: {0}")]
  Encode(#[from] image::ImageError),
  #[error("推理任务异常退出: {0}")]
  Join(#[from] tokio::task::JoinError),
  #[error("推理队列已关闭")]
  QueueClosed,
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::BadImage(_) | ApiError::Detector(DetectorError::FrameError(_)) => {
        StatusCode::BAD_REQUEST
      }
      ApiError::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!("请求处理失败: {}", self);
    } else {
      warn!("请求被拒绝: {}", self);
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
  /// PNG 格式的标注图像，data URL
  pub image: String,
  #[serde(flatten)]
  pub record: HazardRecord,
}

pub fn encode_png_data_url(image: &RgbImage) -> Result<String, image::ImageError> {
  let mut buf = Vec::new();
  image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
  Ok(format!("data:image/png;base64,{}", STANDARD.encode(&buf)))
}

pub fn router<M>(detector: HazardDetector<M>, config: &ServiceConfig) -> Router
where
  M: Model<Input = ModelFrame, Output = DetectResult<ClassId>> + Send + Sync + 'static,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  let concurrency = config.concurrency.max(1);
  let state = Arc::new(AppState {
    detector: Arc::new(detector),
    queue: Arc::new(Semaphore::new(concurrency)),
    concurrency,
  });

  Router::new()
    .route("/", get(index_handler))
    .route("/api/health", get(health_handler::<M>))
    .route("/api/predict", post(predict_handler::<M>))
    .layer(DefaultBodyLimit::max(config.max_upload_bytes))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// 启动服务，`shutdown` 完成后优雅退出
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
  F: Future<Output = ()> + Send + 'static,
{
  if let Ok(addr) = listener.local_addr() {
    info!("网页界面已启动: http://{}", addr);
  }
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown)
    .await
}

async fn index_handler() -> Html<&'static str> {
  Html(html::INDEX_HTML)
}

async fn health_handler<M>(State(state): State<Arc<AppState<M>>>) -> impl IntoResponse
where
  M: Model<Input = ModelFrame, Output = DetectResult<ClassId>> + Send + Sync + 'static,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  Json(json!({
    "status": "ok",
    "labels": state.detector.labels().len(),
    "concurrency": state.concurrency,
  }))
}

async fn predict_handler<M>(
  State(state): State<Arc<AppState<M>>>,
  body: Bytes,
) -> Result<Json<PredictResponse>, ApiError>
where
  M: Model<Input = ModelFrame, Output = DetectResult<ClassId>> + Send + Sync + 'static,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  debug!("收到推理请求，数据大小: {} 字节", body.len());

  // 许可在推理结束后才释放，与请求是否被取消无关
  let permit = Arc::clone(&state.queue)
    .acquire_owned()
    .await
    .map_err(|_| ApiError::QueueClosed)?;
  let detector = Arc::clone(&state.detector);
  let (report, image_url) = tokio::task::spawn_blocking(move || {
    let _permit = permit;
    let image = decode_image_bytes(&body)?;
    let report = detector.detect_hazards(&image)?;
    let image_url = encode_png_data_url(&report.annotated)?;
    Ok::<_, ApiError>((report, image_url))
  })
  .await??;

  Ok(Json(PredictResponse {
    image: image_url,
    record: report.to_record(),
  }))
}
