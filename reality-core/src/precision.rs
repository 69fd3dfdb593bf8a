//! Fixed-precision rounding for persisted floats
//!
//! Values are rounded half-to-even on their exact binary value, so the
//! same input always produces the same persisted bytes.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for probabilities
pub const PROBABILITY_PRECISION: u32 = 4;

/// Decimal places kept for embedding components
pub const VECTOR_PRECISION: u32 = 5;

/// Round a float to `places` decimal places
///
/// Values outside the decimal range are returned unchanged.
pub fn round_to(value: f64, places: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Round every component of an embedding vector
pub fn round_vector(vector: &[f32], places: u32) -> Vec<f64> {
    vector.iter().map(|&v| round_to(f64::from(v), places)).collect()
}
