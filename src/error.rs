//! Error types for cmp-applets
//!
//! Provides standardized error handling across the crate.

use thiserror::Error;

/// Errors that can occur in cmp-applets
#[derive(Debug, Error)]
pub enum CmpError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for cmp-applets operations
pub type CmpResult<T> = Result<T, CmpError>;

/// Marker error for work aborted because the user navigated away.
///
/// Warning and error alerts whose cause chain contains this marker are
/// dropped instead of shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;
