//! HTTP error responses.
//!
//! Every failure leaves the server as `{"error": <message>, "status": "error"}`
//! with a status code derived from the failure category.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::error::{AgentError, UpstreamKind};

/// Failures surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The multipart body carried no `image` field.
    #[error("No image file provided")]
    NoImage,

    /// The `image` field is not `image/*`.
    #[error("Only image files are allowed!")]
    NotAnImage,

    /// The upload exceeded the configured ceiling.
    #[error("File too large. Maximum size is {limit_mb}MB")]
    TooLarge {
        /// Limit in megabytes.
        limit_mb: usize,
    },

    /// The request was otherwise malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The staged image could not be read back.
    #[error("Invalid image file")]
    UnreadableImage(#[source] std::io::Error),

    /// The pipeline failed.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Maps a multipart extraction failure, recognising body-limit hits.
    #[must_use]
    pub fn from_multipart(err: &MultipartError, limit_mb: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::TooLarge { limit_mb }
        } else {
            Self::BadRequest(err.body_text())
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoImage
            | Self::NotAnImage
            | Self::TooLarge { .. }
            | Self::BadRequest(_)
            | Self::UnreadableImage(_)
            | Self::Agent(AgentError::InvalidRequest { .. }) => StatusCode::BAD_REQUEST,
            Self::Agent(AgentError::Upstream {
                kind: UpstreamKind::QuotaExceeded,
                ..
            }) => StatusCode::PAYMENT_REQUIRED,
            Self::Agent(AgentError::Upstream {
                kind: UpstreamKind::InvalidCredentials,
                ..
            }) => StatusCode::UNAUTHORIZED,
            Self::Agent(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response body.
    fn message(&self) -> String {
        match self {
            Self::Agent(AgentError::Upstream {
                kind: UpstreamKind::QuotaExceeded,
                ..
            }) => "OpenAI API quota exceeded".to_string(),
            Self::Agent(AgentError::Upstream {
                kind: UpstreamKind::InvalidCredentials,
                ..
            }) => "Invalid OpenAI API key".to_string(),
            Self::Agent(AgentError::InvalidRequest { message }) => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::info!(status = status.as_u16(), error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: self.message(),
            status: "error",
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn upstream(kind: UpstreamKind) -> ApiError {
        ApiError::Agent(AgentError::Upstream {
            kind,
            message: "boom".to_string(),
        })
    }

    #[test_case(ApiError::NoImage, StatusCode::BAD_REQUEST ; "no image")]
    #[test_case(ApiError::NotAnImage, StatusCode::BAD_REQUEST ; "not an image")]
    #[test_case(ApiError::TooLarge { limit_mb: 10 }, StatusCode::BAD_REQUEST ; "too large")]
    #[test_case(upstream(UpstreamKind::QuotaExceeded), StatusCode::PAYMENT_REQUIRED ; "quota")]
    #[test_case(upstream(UpstreamKind::InvalidCredentials), StatusCode::UNAUTHORIZED ; "bad key")]
    #[test_case(upstream(UpstreamKind::Transient), StatusCode::INTERNAL_SERVER_ERROR ; "transient")]
    #[test_case(upstream(UpstreamKind::Other), StatusCode::INTERNAL_SERVER_ERROR ; "other")]
    #[test_case(ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR ; "internal")]
    fn test_status_mapping(err: ApiError, expected: StatusCode) {
        assert_eq!(err.status(), expected);
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::NoImage.message(), "No image file provided");
        assert_eq!(ApiError::NotAnImage.message(), "Only image files are allowed!");
        assert_eq!(
            ApiError::TooLarge { limit_mb: 10 }.message(),
            "File too large. Maximum size is 10MB"
        );
        assert_eq!(
            upstream(UpstreamKind::QuotaExceeded).message(),
            "OpenAI API quota exceeded"
        );
        assert_eq!(
            upstream(UpstreamKind::InvalidCredentials).message(),
            "Invalid OpenAI API key"
        );
    }
}
