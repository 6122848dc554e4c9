//! Error types for the alert store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Invalid alert type: {0}")]
    InvalidType(String),
}

pub type AlertResult<T> = Result<T, AlertError>;
