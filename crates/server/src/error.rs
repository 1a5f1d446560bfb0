//! HTTP rendering of engine errors.
//!
//! Every failure becomes `{"detail": [{"type": ..., "msg": ...}]}` with the
//! status carried by the error itself.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pagefront_core::{Error, ErrorBody};

/// Structured errors for the pagefront server.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error_type = self.0.error_type(), "{}", self.0);
        } else {
            tracing::warn!(error_type = self.0.error_type(), "{}", self.0);
        }

        (status, Json(ErrorBody::from(&self.0))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn render(err: Error) -> (StatusCode, serde_json::Value) {
        let response = ApiError::from(err).into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_missing_parameter_response() {
        let (status, body) = render(Error::MissingParameter("url".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            serde_json::json!({"detail": [{"type": "missing_parameter", "msg": "Missing required parameter: url"}]})
        );
    }

    #[tokio::test]
    async fn test_fetch_error_response() {
        let (status, body) = render(Error::FetchFailed("navigation failed: boom".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"][0]["type"], "fetch_error");
        assert!(body["detail"][0]["msg"].as_str().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_timeout_response() {
        let (status, body) = render(Error::FetchTimeout(100)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"][0]["type"], "fetch_timeout");
    }
}
