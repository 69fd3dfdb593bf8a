//! Market data providers

use serde::{Deserialize, Serialize};

/// Providers a record can originate from
///
/// Serialized as the one-letter tag stored in the `s` field of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Kalshi - US regulated prediction market
    #[serde(rename = "K")]
    Kalshi,
}
