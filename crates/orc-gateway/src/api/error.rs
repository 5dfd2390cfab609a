//! Maps `orc_domain::error::Error` to an HTTP response (spec §6, §7).
//!
//! `Error` lives in `orc-domain` and `IntoResponse` lives in `axum`, so
//! neither crate can carry the impl — a thin local newtype is the usual way
//! around that, and it's where the teacher puts its own `ApiError` too.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orc_domain::error::Error;
use serde_json::json;

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            "invalid_input" | "transfer_denied" => StatusCode::BAD_REQUEST,
            "unknown_resource" => StatusCode::NOT_FOUND,
            "session_busy" => StatusCode::CONFLICT,
            "auth_rejected" => StatusCode::UNAUTHORIZED,
            "payload_too_large" => StatusCode::PAYLOAD_TOO_LARGE,
            "tool_timeout" | "request_timeout" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, kind = self.0.kind(), "request failed");
        }
        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn unknown_resource_maps_to_404() {
        let response = ApiError(Error::UnknownResource("session 'x'".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn session_busy_maps_to_409() {
        let response = ApiError(Error::SessionBusy("s1".into())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn internal_error_body_carries_message() {
        let response = ApiError(Error::Internal("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "internal: boom");
    }
}
