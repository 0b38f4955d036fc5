//! S3-compatible HTTP surface (§6). Error bodies on this surface are XML,
//! not JSON — [`S3Error`] wraps [`AppError`] and renders via
//! [`crate::error::s3_error_xml`] instead of the default JSON `IntoResponse`.

use std::collections::BTreeMap;

use axum::{
  body::Bytes,
  extract::{Path, Query, State},
  http::{header, HeaderMap, HeaderName, StatusCode},
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;
use vaultstore_core::models::object::{validate_bucket_name, MAX_KEY_LEN};

use crate::{
  error::{s3_error_xml, AppError},
  state::AppState,
  storage::ListObjectsParams,
};

pub struct S3Error(AppError);

impl From<AppError> for S3Error {
  fn from(e: AppError) -> Self {
    S3Error(e)
  }
}

impl From<vaultstore_core::error::CoreError> for S3Error {
  fn from(e: vaultstore_core::error::CoreError) -> Self {
    S3Error(AppError::Core(e))
  }
}

impl IntoResponse for S3Error {
  fn into_response(self) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let status = self.0.status();
    let body = s3_error_xml(&self.0, "/", &request_id);
    (status, [(header::CONTENT_TYPE, "application/xml")], body).into_response()
  }
}

fn xml_escape(s: &str) -> String {
  s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

pub async fn list_all_buckets(State(state): State<AppState>) -> Result<Response, S3Error> {
  let buckets = state.object_store().list_buckets().await.map_err(AppError::from)?;
  let mut body = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ListAllMyBucketsResult>");
  body.push_str("<Owner><ID>vaultstore</ID><DisplayName>vaultstore</DisplayName></Owner><Buckets>");
  for bucket in buckets {
    body.push_str(&format!(
      "<Bucket><Name>{}</Name><CreationDate>{}</CreationDate></Bucket>",
      xml_escape(&bucket.name),
      bucket.created_at.to_rfc3339(),
    ));
  }
  body.push_str("</Buckets></ListAllMyBucketsResult>");
  Ok((StatusCode::OK, [(header::CONTENT_TYPE, "application/xml")], body).into_response())
}

pub async fn create_bucket(State(state): State<AppState>, Path(bucket): Path<String>) -> Result<Response, S3Error> {
  state.object_store().create_bucket(&bucket).await.map_err(AppError::from)?;
  Ok(StatusCode::OK.into_response())
}

pub async fn delete_bucket(State(state): State<AppState>, Path(bucket): Path<String>) -> Result<Response, S3Error> {
  state.object_store().delete_bucket(&bucket).await.map_err(AppError::from)?;
  Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Debug, Deserialize)]
pub struct ListObjectsQuery {
  #[serde(default)]
  pub prefix: String,
  pub delimiter: Option<String>,
  pub marker: Option<String>,
  #[serde(rename = "max-keys")]
  pub max_keys: Option<usize>,
}

pub async fn list_objects(
  State(state): State<AppState>,
  Path(bucket): Path<String>,
  Query(query): Query<ListObjectsQuery>,
) -> Result<Response, S3Error> {
  validate_bucket_name(&bucket).map_err(AppError::from)?;

  let params = ListObjectsParams {
    prefix: query.prefix.clone(),
    delimiter: query.delimiter.clone(),
    marker: query.marker.clone(),
    max_keys: query.max_keys.unwrap_or(1000),
  };
  let result = state.object_store().list_objects(&bucket, params).await.map_err(AppError::from)?;

  let mut body = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ListBucketResult>");
  body.push_str(&format!("<Name>{}</Name><Prefix>{}</Prefix>", xml_escape(&bucket), xml_escape(&query.prefix)));
  if let Some(marker) = &query.marker {
    body.push_str(&format!("<Marker>{}</Marker>", xml_escape(marker)));
  }
  body.push_str(&format!("<IsTruncated>{}</IsTruncated>", result.is_truncated));
  if let Some(next_marker) = &result.next_marker {
    body.push_str(&format!("<NextMarker>{}</NextMarker>", xml_escape(next_marker)));
  }
  for object in &result.contents {
    body.push_str(&format!(
      "<Contents><Key>{}</Key><LastModified>{}</LastModified><ETag>{}</ETag><Size>{}</Size></Contents>",
      xml_escape(&object.key),
      object.last_modified.to_rfc3339(),
      xml_escape(&object.etag),
      object.size,
    ));
  }
  for prefix in &result.common_prefixes {
    body.push_str(&format!("<CommonPrefixes><Prefix>{}</Prefix></CommonPrefixes>", xml_escape(prefix)));
  }
  body.push_str("</ListBucketResult>");

  Ok((StatusCode::OK, [(header::CONTENT_TYPE, "application/xml")], body).into_response())
}

/// Extracts `X-Amz-Meta-*` request headers into the lowercased user
/// metadata mapping, per §3/§6.
fn extract_user_metadata(headers: &HeaderMap) -> BTreeMap<String, String> {
  let mut metadata = BTreeMap::new();
  for (name, value) in headers {
    if let Some(key) = name.as_str().to_ascii_lowercase().strip_prefix("x-amz-meta-") {
      if let Ok(value) = value.to_str() {
        metadata.insert(key.to_string(), value.to_string());
      }
    }
  }
  metadata
}

pub async fn put_object(
  State(state): State<AppState>,
  Path((bucket, key)): Path<(String, String)>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Response, S3Error> {
  if key.len() > MAX_KEY_LEN {
    return Err(vaultstore_core::error::CoreError::InvalidObjectName(key).into());
  }

  let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("application/octet-stream").to_string();
  let user_metadata = extract_user_metadata(&headers);
  let bytes = body.to_vec();

  let meta = state
    .object_store()
    .put_object(&bucket, &key, bytes.clone(), content_type.clone(), user_metadata)
    .await
    .map_err(AppError::from)?;

  if let Some(hook) = state.ingestion_hook() {
    let indexing_enabled = state
      .object_store()
      .get_bucket(&bucket)
      .await
      .map(|b| crate::ingestion::bucket_indexing_enabled(&b.user_metadata))
      .unwrap_or(true);
    if indexing_enabled {
      hook.on_object_put(&bucket, &key, &bytes, &content_type).await;
    }
  }

  Ok((StatusCode::OK, [(header::ETAG, meta.etag)]).into_response())
}

fn object_response_headers(meta: &vaultstore_core::models::ObjectMeta) -> HeaderMap {
  let mut headers = HeaderMap::new();
  if let Ok(v) = meta.content_type.parse() {
    headers.insert(header::CONTENT_TYPE, v);
  }
  headers.insert(header::CONTENT_LENGTH, meta.size.into());
  if let Ok(v) = meta.etag.parse() {
    headers.insert(header::ETAG, v);
  }
  if let Ok(v) = meta.last_modified.to_rfc2822().parse() {
    headers.insert(header::LAST_MODIFIED, v);
  }
  for (key, value) in &meta.user_metadata {
    if let (Ok(name), Ok(v)) = (format!("x-amz-meta-{key}").parse::<HeaderName>(), value.parse()) {
      headers.insert(name, v);
    }
  }
  headers
}

pub async fn get_object(State(state): State<AppState>, Path((bucket, key)): Path<(String, String)>) -> Result<Response, S3Error> {
  let (bytes, meta) = state.object_store().get_object(&bucket, &key).await.map_err(AppError::from)?;
  let headers = object_response_headers(&meta);
  Ok((StatusCode::OK, headers, bytes).into_response())
}

pub async fn head_object(State(state): State<AppState>, Path((bucket, key)): Path<(String, String)>) -> Result<Response, S3Error> {
  let meta = state.object_store().head_object(&bucket, &key).await.map_err(AppError::from)?;
  let headers = object_response_headers(&meta);
  Ok((StatusCode::OK, headers).into_response())
}

pub async fn delete_object(State(state): State<AppState>, Path((bucket, key)): Path<(String, String)>) -> Result<Response, S3Error> {
  state.object_store().delete_object(&bucket, &key).await.map_err(AppError::from)?;
  Ok(StatusCode::NO_CONTENT.into_response())
}
