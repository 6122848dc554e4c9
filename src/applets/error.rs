//! Error types for the applet registry.

use thiserror::Error;

use crate::error::Cancelled;

/// Errors raised by the applet store itself.
#[derive(Debug, Error)]
pub enum AppletError {
    #[error(
        "No \"targetApplication\" designated for the applet store. \
         Pass a valid target application when creating the store or set it directly"
    )]
    MissingTargetApplication,

    #[error("Applet '{0}' not found")]
    AppletNotFound(String),
}

/// Errors that can occur while fetching the applet list.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Applet API returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid applet list: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Applet request was cancelled")]
    Cancelled(#[source] Cancelled),

    #[error("Applet API unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    /// Whether this failure came from an aborted request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled(_))
    }
}

/// Result type for applet store operations.
pub type AppletResult<T> = Result<T, AppletError>;

/// Result type for applet API calls.
pub type ApiResult<T> = Result<T, ApiError>;
