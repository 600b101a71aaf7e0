/*
 * Responsibility
 * - App-wide AppError
 * - IntoResponse (HTTP status + JSON error body)
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    // Deterministic for a given origin/config pair; retrying does not help.
    #[error("origin not allowed: {origin}")]
    OriginRejected { origin: String },
}

impl AppError {
    pub fn origin_rejected(origin: impl Into<String>) -> Self {
        Self::OriginRejected {
            origin: origin.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::OriginRejected { .. } => (StatusCode::FORBIDDEN, "ORIGIN_REJECTED"),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn origin_rejected_is_forbidden_with_json_body() {
        let res = AppError::origin_rejected("https://evil.example.com").into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"]["code"], "ORIGIN_REJECTED");
        assert_eq!(
            body["error"]["message"],
            "origin not allowed: https://evil.example.com"
        );
    }
}
