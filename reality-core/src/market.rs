//! Market types
//!
//! `MarketSnapshot` is the normalized view of one upstream event for a single
//! run. `MarketRecord` is the compact unit persisted to the dataset file.

use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::precision::{round_to, round_vector, PROBABILITY_PRECISION, VECTOR_PRECISION};

/// A market as fetched from upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Event ticker (unique identifier)
    pub id: String,
    /// Whitespace-normalized title
    pub title: String,
    /// YES probability (0.0 - 1.0)
    pub probability: f64,
}

impl MarketSnapshot {
    pub fn new(id: impl Into<String>, title: impl Into<String>, probability: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            probability,
        }
    }
}

/// A market as persisted in the dataset file
///
/// Field names are shortened on disk to keep the file small:
/// `{"id":..,"t":..,"p":..,"v":[..],"s":"K"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub id: String,

    #[serde(rename = "t")]
    pub title: String,

    /// Probability rounded to 4 decimal places
    #[serde(rename = "p")]
    pub probability: f64,

    /// Title embedding, components rounded to 5 decimal places
    #[serde(rename = "v")]
    pub vector: Vec<f64>,

    #[serde(rename = "s")]
    pub source: Platform,
}

impl MarketRecord {
    /// Build a record for a market seen for the first time
    pub fn embedded(snapshot: &MarketSnapshot, embedding: &[f32], source: Platform) -> Self {
        Self {
            id: snapshot.id.clone(),
            title: snapshot.title.clone(),
            probability: round_to(snapshot.probability, PROBABILITY_PRECISION),
            vector: round_vector(embedding, VECTOR_PRECISION),
            source,
        }
    }

    /// Build the next version of an existing record
    ///
    /// Title and probability come from the fresh snapshot; the vector is
    /// carried over untouched.
    pub fn refreshed(&self, snapshot: &MarketSnapshot, source: Platform) -> Self {
        Self {
            id: self.id.clone(),
            title: snapshot.title.clone(),
            probability: round_to(snapshot.probability, PROBABILITY_PRECISION),
            vector: self.vector.clone(),
            source,
        }
    }
}
