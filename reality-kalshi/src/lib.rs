//! Kalshi integration for Reality Check
//!
//! This crate provides a client for walking the Kalshi events endpoint page
//! by page, retrying failed requests with exponential backoff, and shaping
//! each event into a `MarketSnapshot`.

pub mod client;
pub mod error;
pub mod retry;
pub mod transport;
pub mod types;

pub use client::{KalshiClient, KalshiConfig};
pub use error::FetchError;
pub use retry::RetryPolicy;
pub use transport::{EventsQuery, EventsTransport, HttpEventsTransport};
