//! Crate-wide error type.
//!
//! Every failure is `Clone` so that all callers awaiting one shared refresh
//! observe the same outcome. Sources that are not `Clone` are kept behind `Arc`.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::rest::errors::ErrorResponse;

#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Construction-time configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// Explicitly named credentials source does not exist
    #[error("Credentials file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Transport failure, including timeouts
    #[error("HTTP error: {0}")]
    Http(#[source] Arc<reqwest::Error>),

    /// Token endpoint answered with a non-2xx status
    #[error("Token endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(#[source] Arc<serde_json::Error>),

    #[error("Signing error: {0}")]
    Signing(#[source] Arc<jsonwebtoken::errors::Error>),

    /// Request to a Google Cloud API failed and should not be retried
    #[error("Request failed with status {status_code}: {}", error.message.as_deref().unwrap_or("unknown error"))]
    Request { status_code: u16, error: ErrorResponse },

    /// Request to a Google Cloud API failed, but it can be retried
    #[error("Service unavailable ({status_code}): {}", error.message.as_deref().unwrap_or("unknown error"))]
    ServiceUnavailable { status_code: u16, error: ErrorResponse },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Transient errors a retry decorator may reasonably try again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Status { .. } | Error::Decode(_) | Error::ServiceUnavailable { .. }
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(Arc::new(err))
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Signing(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
