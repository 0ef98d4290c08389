// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// tests/service.rs - 网页接口测试
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

#![cfg(feature = "web_ui")]

mod common;

use std::{
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Request, StatusCode},
};
use raincity_hazard::{
  detector::HazardDetector,
  frame::ModelFrame,
  model::{ClassId, DetectResult, Model},
  service::{ServiceConfig, router},
};
use serde_json::Value;
use tower::ServiceExt;

use common::*;

fn app() -> Router {
  let detector = HazardDetector::new(road_model(), road_labels()).unwrap();
  router(detector, &ServiceConfig::default())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
  let response = app.oneshot(request).await.unwrap();
  let status = response.status();
  let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  (status, body.to_vec())
}

fn predict(body: Vec<u8>) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri("/api/predict")
    .header("content-type", "image/png")
    .body(Body::from(body))
    .unwrap()
}

#[tokio::test]
async fn index_serves_widget() {
  let request = Request::builder().uri("/").body(Body::empty()).unwrap();
  let (status, body) = send(app(), request).await;
  assert_eq!(status, StatusCode::OK);
  let html = String::from_utf8(body).unwrap();
  assert!(html.contains("/api/predict"));
}

#[tokio::test]
async fn health_reports_configuration() {
  let request = Request::builder()
    .uri("/api/health")
    .body(Body::empty())
    .unwrap();
  let (status, body) = send(app(), request).await;
  assert_eq!(status, StatusCode::OK);
  let json: Value = serde_json::from_slice(&body).unwrap();
  assert_eq!(json["status"], "ok");
  assert_eq!(json["labels"], 2);
  assert_eq!(json["concurrency"], 1);
}

#[tokio::test]
async fn predict_returns_image_and_summary() {
  let (status, body) = send(app(), predict(png_bytes(&road_image()))).await;
  assert_eq!(status, StatusCode::OK);

  let json: Value = serde_json::from_slice(&body).unwrap();
  assert!(
    json["image"]
      .as_str()
      .unwrap()
      .starts_with("data:image/png;base64,")
  );
  assert_eq!(
    json["detections"],
    serde_json::json!([
      { "label": "pothole", "confidence": 0.85 },
      { "label": "debris", "confidence": 0.912 },
    ])
  );
  assert_eq!(json["raw_count"], 4);
  assert_eq!(json["assessment"]["debris_items"], 1);
  assert!(json["inferred_at"].is_string());
}

#[tokio::test]
async fn undecodable_image_is_bad_request() {
  let (status, body) = send(app(), predict(b"not an image".to_vec())).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let json: Value = serde_json::from_slice(&body).unwrap();
  assert!(json["error"].is_string());
}

#[tokio::test]
async fn empty_body_is_bad_request() {
  let (status, _) = send(app(), predict(Vec::new())).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn model_failure_is_server_error() {
  let detector = HazardDetector::new(FailingModel, road_labels()).unwrap();
  let app = router(detector, &ServiceConfig::default());
  let (status, body) = send(app, predict(png_bytes(&road_image()))).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  let json: Value = serde_json::from_slice(&body).unwrap();
  assert!(json["error"].as_str().unwrap().contains("inference failed"));
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
  let detector = HazardDetector::new(road_model(), road_labels()).unwrap();
  let config = ServiceConfig {
    max_upload_bytes: 64,
    ..ServiceConfig::default()
  };
  let app = router(detector, &config);
  let (status, _) = send(app, predict(vec![0u8; 1024])).await;
  assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

/// 记录同时进行的推理数的慢速模型
struct SlowModel {
  active: Arc<AtomicUsize>,
  peak: Arc<AtomicUsize>,
}

impl Model for SlowModel {
  type Input = ModelFrame;
  type Output = DetectResult<ClassId>;
  type Error = std::io::Error;

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
    self.peak.fetch_max(running, Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(300));
    self.active.fetch_sub(1, Ordering::SeqCst);
    Ok(DetectResult::from(Vec::new()))
  }
}

#[tokio::test]
async fn cancelled_request_holds_queue_until_inference_ends() {
  let active = Arc::new(AtomicUsize::new(0));
  let peak = Arc::new(AtomicUsize::new(0));
  let model = SlowModel {
    active: Arc::clone(&active),
    peak: Arc::clone(&peak),
  };
  let detector = HazardDetector::new(model, road_labels()).unwrap();
  let app = router(detector, &ServiceConfig::default());

  let first = tokio::spawn(app.clone().oneshot(predict(png_bytes(&road_image()))));
  while active.load(Ordering::SeqCst) == 0 {
    tokio::time::sleep(Duration::from_millis(5)).await;
  }
  // 客户端断开，推理仍在后台进行
  first.abort();
  let _ = first.await;

  let (status, _) = send(app, predict(png_bytes(&road_image()))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(peak.load(Ordering::SeqCst), 1);
}
