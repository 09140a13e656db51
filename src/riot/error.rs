use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

pub type RiotApiResponse<T> = Result<T, ApiError>;

/// Failure of a single Riot API call. The client never retries; callers
/// decide what to do with transient failures.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rate limited by the Riot API (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("resource not found")]
    NotFound,

    #[error("unexpected status {status}")]
    Unexpected { status: StatusCode },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed payload: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn from_status(status: StatusCode, retry_after: Option<Duration>) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited { retry_after },
            StatusCode::NOT_FOUND => Self::NotFound,
            status => Self::Unexpected { status },
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout | Self::Transport(_) => true,
            Self::Unexpected { status } => status.is_server_error(),
            Self::NotFound | Self::Decode(_) => false,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
