//! Client-facing error taxonomy.
//!
//! Storage and transport failures are wrapped as `Unavailable`/`Upstream` and
//! logged server side; the response body only carries a stable machine-readable
//! kind plus a human message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("too many requests, try again later")]
    RateLimited,
    #[error("service unavailable")]
    Unavailable(anyhow::Error),
    #[error("upstream request failed")]
    Upstream(anyhow::Error),
}

impl ApiError {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Conflict(_) => "conflict",
            Self::RateLimited => "rate_limited",
            Self::Unavailable(_) => "unavailable",
            Self::Upstream(_) => "upstream_error",
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unavailable(err)
    }
}

/// Body shape shared by every error response.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal causes are logged, never echoed to the client
        match &self {
            Self::Unavailable(cause) => error!("Storage failure: {cause:#}"),
            Self::Upstream(cause) => error!("Upstream failure: {cause:#}"),
            _ => {}
        }

        let body = ErrorBody {
            error: self.kind().to_string(),
            message: self.to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};

    #[test]
    fn kind_and_status_mapping() {
        let cases = [
            (
                ApiError::Validation("missing field".to_string()),
                "validation_error",
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Unauthorized("invalid credentials".to_string()),
                "unauthorized",
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Forbidden("device already used".to_string()),
                "forbidden",
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::Conflict("username taken".to_string()),
                "conflict",
                StatusCode::CONFLICT,
            ),
            (
                ApiError::RateLimited,
                "rate_limited",
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                ApiError::Unavailable(anyhow!("pool timeout")),
                "unavailable",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Upstream(anyhow!("connect refused")),
                "upstream_error",
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, kind, status) in cases {
            assert_eq!(err.kind(), kind);
            assert_eq!(err.status(), status);
        }
    }

    #[tokio::test]
    async fn response_body_carries_kind_and_message() -> Result<()> {
        let response = ApiError::Conflict("username taken".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(value["error"], "conflict");
        assert_eq!(value["message"], "username taken");
        Ok(())
    }

    #[tokio::test]
    async fn internal_cause_is_not_echoed() -> Result<()> {
        let response =
            ApiError::Unavailable(anyhow!("connection pool exhausted at 10.0.0.1")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = String::from_utf8(bytes.to_vec())?;
        assert!(!body.contains("10.0.0.1"));
        assert!(body.contains("service unavailable"));
        Ok(())
    }

    #[test]
    fn anyhow_errors_map_to_unavailable() {
        let err = ApiError::from(anyhow!("boom"));
        assert_eq!(err.kind(), "unavailable");
    }
}
