//! Title embeddings for prediction markets
//!
//! This crate maps batches of market titles to fixed-dimension vectors.
//! The `TitleEmbedder` trait is the seam the reconciliation driver depends
//! on; `EmbeddingClient` implements it on top of OpenAI's embeddings API.
//!
//! ## Features
//! - Batched requests that preserve input order
//! - Count, dimension and finiteness checks on every batch

pub mod client;
pub mod error;
pub mod types;

pub use client::{EmbeddingClient, EmbeddingConfig};
pub use error::{EmbeddingError, Result};
pub use types::{check_batch, EmbeddingVector, TitleEmbedder};
