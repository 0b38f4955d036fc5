//! End-to-end HTTP surface tests, driven through the router directly via
//! `tower::ServiceExt::oneshot` rather than a bound TCP listener.

use axum::{
  body::Body,
  http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use vaultstore_server::{
  config::{AiConfig, AppConfig, StorageConfig, VectorConfig},
  get_router,
  state::AppState,
};

async fn test_state() -> AppState {
  let dir = tempfile::tempdir().unwrap().keep();
  let config = AppConfig {
    storage: StorageConfig { base_path: dir.join("objects"), ..Default::default() },
    vector: VectorConfig { enabled: true, db_path: dir.join("vector.db"), dimension: 3 },
    ai: AiConfig { enabled: false, ..Default::default() },
    ..Default::default()
  };
  AppState::try_new(config).await.unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
  let bytes = response.into_body().collect().await.unwrap().to_bytes();
  serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthz_reports_healthy_and_provider_flags() {
  let state = test_state().await;
  let app = get_router(state).await.unwrap();

  let response = app
    .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);

  let body = body_json(response).await;
  assert_eq!(body["status"], "healthy");
  assert_eq!(body["vector_enabled"], true);
  assert_eq!(body["ai_enabled"], false);
}

#[tokio::test]
async fn bucket_and_object_lifecycle_over_http() {
  let state = test_state().await;
  let app = get_router(state).await.unwrap();

  let response = app
    .clone()
    .oneshot(Request::builder().method("PUT").uri("/my-bucket").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);

  let response = app
    .clone()
    .oneshot(
      Request::builder()
        .method("PUT")
        .uri("/my-bucket/hello.txt")
        .header("content-type", "text/plain")
        .body(Body::from("hello world"))
        .unwrap(),
    )
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert!(response.headers().get("etag").is_some());

  let response = app
    .clone()
    .oneshot(Request::builder().uri("/my-bucket/hello.txt").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  let bytes = response.into_body().collect().await.unwrap().to_bytes();
  assert_eq!(&bytes[..], b"hello world");

  let response = app
    .clone()
    .oneshot(Request::builder().uri("/my-bucket").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  let bytes = response.into_body().collect().await.unwrap().to_bytes();
  let xml = String::from_utf8(bytes.to_vec()).unwrap();
  assert!(xml.contains("<Key>hello.txt</Key>"));
}

#[tokio::test]
async fn get_object_missing_key_renders_s3_xml_error() {
  let state = test_state().await;
  let app = get_router(state).await.unwrap();

  let _ = app
    .clone()
    .oneshot(Request::builder().method("PUT").uri("/b").body(Body::empty()).unwrap())
    .await
    .unwrap();

  let response = app
    .oneshot(Request::builder().uri("/b/missing.txt").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
  assert_eq!(response.headers().get("content-type").unwrap(), "application/xml");
  let bytes = response.into_body().collect().await.unwrap().to_bytes();
  let xml = String::from_utf8(bytes.to_vec()).unwrap();
  assert!(xml.contains("<Code>ObjectNotFound</Code>"));
}

#[tokio::test]
async fn vector_store_then_search_over_json_api() {
  let state = test_state().await;
  let app = get_router(state).await.unwrap();

  let response = app
    .clone()
    .oneshot(
      Request::builder()
        .method("POST")
        .uri("/api/v1/vectors/embeddings")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&serde_json::json!({"id": "doc-1", "embedding": [1.0, 0.0, 0.0]})).unwrap()))
        .unwrap(),
    )
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::CREATED);

  let response = app
    .oneshot(
      Request::builder()
        .method("POST")
        .uri("/api/v1/vectors/search")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&serde_json::json!({"query": [1.0, 0.0, 0.0], "top_k": 1})).unwrap()))
        .unwrap(),
    )
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  let body = body_json(response).await;
  assert_eq!(body["count"], 1);
  assert_eq!(body["results"][0]["vector"]["id"], "doc-1");
}

#[tokio::test]
async fn vector_dimension_mismatch_is_rejected_with_bad_request() {
  let state = test_state().await;
  let app = get_router(state).await.unwrap();

  let response = app
    .oneshot(
      Request::builder()
        .method("POST")
        .uri("/api/v1/vectors/embeddings")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&serde_json::json!({"id": "bad", "embedding": [1.0, 0.0]})).unwrap()))
        .unwrap(),
    )
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_completions_fail_fast_when_ai_disabled() {
  let state = test_state().await;
  let app = get_router(state).await.unwrap();

  let response = app
    .oneshot(
      Request::builder()
        .method("POST")
        .uri("/api/v1/chat/completions")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&serde_json::json!({"query": "what is vaultstore?"})).unwrap()))
        .unwrap(),
    )
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
