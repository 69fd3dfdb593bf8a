//! Error types for fetching events

use reality_core::RealityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: RealityError,
    },

    #[error("Unexpected events payload: {0}")]
    Payload(String),
}
