use axum::{
  body::Body,
  http::StatusCode,
  response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

use vaultstore_core::error::CoreError;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("database error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("config error: {0}")]
  Config(String),

  #[error("internal error: {0}")]
  AnyError(#[from] anyhow::Error),
}

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::Core(e) => core_status(e),
      AppError::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AppError::AnyError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// Code string surfaced in both the S3 `<Code>` body and JSON `error.code`.
  pub fn code(&self) -> String {
    match self {
      AppError::Core(e) => e.code().to_string(),
      AppError::Sqlx(_) => "InternalError".to_string(),
      AppError::Io(_) => "InternalError".to_string(),
      AppError::Config(_) => "InternalError".to_string(),
      AppError::AnyError(_) => "InternalError".to_string(),
    }
  }
}

fn core_status(e: &CoreError) -> StatusCode {
  match e {
    CoreError::BucketAlreadyExists(_) => StatusCode::CONFLICT,
    CoreError::BucketNotFound(_) => StatusCode::NOT_FOUND,
    CoreError::BucketNotEmpty(_) => StatusCode::CONFLICT,
    CoreError::ObjectNotFound { .. } => StatusCode::NOT_FOUND,
    CoreError::InvalidBucketName(_) => StatusCode::BAD_REQUEST,
    CoreError::InvalidObjectName(_) => StatusCode::BAD_REQUEST,
    CoreError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
    CoreError::DimensionMismatch { .. } => StatusCode::BAD_REQUEST,
    CoreError::InvalidVector(_) => StatusCode::BAD_REQUEST,
    CoreError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    CoreError::ProviderTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
    CoreError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
    CoreError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
    CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
    CoreError::InvalidSignature => StatusCode::FORBIDDEN,
    CoreError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

#[derive(Debug, Serialize)]
pub struct ErrorOutput {
  pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
  pub code: String,
  pub message: String,
}

/// S3-style XML error body: `<Error><Code/><Message/><Resource/><RequestId/></Error>`.
pub fn s3_error_xml(err: &AppError, resource: &str, request_id: &str) -> String {
  format!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Error><Code>{}</Code><Message>{}</Message><Resource>{}</Resource><RequestId>{}</RequestId></Error>",
    xml_escape(&err.code()),
    xml_escape(&err.to_string()),
    xml_escape(resource),
    xml_escape(request_id),
  )
}

fn xml_escape(s: &str) -> String {
  s.replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response<Body> {
    let status = self.status();
    let body = Json(ErrorOutput {
      error: ErrorBody { code: self.code(), message: self.to_string() },
    });
    (status, body).into_response()
  }
}
