//! Cross-cutting HTTP middleware. Kept as a single module: one
//! `from_fn_with_state` layer, one concern. Full SigV4 verification is a
//! collaborator concern (§6) — only the access-key prefix of the
//! `Authorization` header is validated here.

use axum::{
  extract::{Request, State},
  http::StatusCode,
  middleware::Next,
  response::{IntoResponse, Response},
};

use crate::{config::AuthDriver, error::ErrorBody, state::AppState};

pub async fn require_signature(State(state): State<AppState>, request: Request, next: Next) -> Response {
  let auth = &state.config().auth;
  if !auth.enabled || auth.driver == AuthDriver::None {
    return next.run(request).await;
  }

  let header = request.headers().get("Authorization").and_then(|v| v.to_str().ok());
  let Some(header) = header else {
    return unauthorized("missing Authorization header");
  };

  let Some(credential) = header.strip_prefix("AWS4-HMAC-SHA256 Credential=").or_else(|| {
    header.split_once("Credential=").map(|(_, rest)| rest)
  }) else {
    return unauthorized("malformed Authorization header");
  };

  let access_key = credential.split('/').next().unwrap_or("");
  if access_key != auth.default_access_key {
    return unauthorized("unknown access key");
  }

  next.run(request).await
}

fn unauthorized(message: &str) -> Response {
  (
    StatusCode::UNAUTHORIZED,
    axum::Json(crate::error::ErrorOutput { error: ErrorBody { code: "Unauthorized".to_string(), message: message.to_string() } }),
  )
    .into_response()
}
