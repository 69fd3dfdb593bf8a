//! Error types shared across Reality Check crates

use thiserror::Error;

/// Workspace-wide error type
#[derive(Error, Debug)]
pub enum RealityError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RealityError {
    pub fn api(msg: impl Into<String>) -> Self {
        RealityError::Api(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        RealityError::Network(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        RealityError::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        RealityError::Config(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        RealityError::Storage(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        RealityError::Internal(msg.into())
    }
}

/// Result type alias for Reality Check operations
pub type RealityResult<T> = Result<T, RealityError>;
