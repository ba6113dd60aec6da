use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

pub const INVALID_POST_TYPE_MESSAGE: &str = "Invalid type. Use 'popular' or 'latest'.";

/// Failure of a single outbound call. One of these aborts the whole fan-out.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Request failed with status code {status}")]
    Status { status: u16 },

    #[error("Upstream request failed: {0}")]
    Transport(String),

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    #[error("Upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to build upstream client: {0}")]
    Client(String),
}

impl UpstreamError {
    /// Status reported to our caller: the upstream's own status when it sent one.
    pub fn status_code(&self) -> StatusCode {
        match self {
            UpstreamError::Status { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            UpstreamError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(err: serde_json::Error) -> Self {
        UpstreamError::Decode(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", INVALID_POST_TYPE_MESSAGE)]
    InvalidPostType,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidPostType => StatusCode::BAD_REQUEST,
            AppError::Upstream(err) => err.status_code(),
        }
    }
}
