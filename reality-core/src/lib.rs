//! Core types for Reality Check
//!
//! This crate defines the shared data structures used across the workspace:
//! the normalized market snapshot fetched from upstream, the compact record
//! persisted to the dataset file, and the provider tag stored with it.

pub mod error;
pub mod market;
pub mod platform;
pub mod precision;

pub use error::{RealityError, RealityResult};
pub use market::{MarketRecord, MarketSnapshot};
pub use platform::Platform;
pub use precision::{round_to, round_vector, PROBABILITY_PRECISION, VECTOR_PRECISION};
