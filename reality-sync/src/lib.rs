//! Delta reconciliation for the Reality Check dataset
//!
//! This crate ties the events client and the embedding generator to the
//! dataset file. Each run fetches the open events, compares them with the
//! stored records, embeds only markets seen for the first time, refreshes
//! probabilities for the rest, drops expired markets and writes the result.

pub mod config;
pub mod delta;
pub mod error;
pub mod job;
pub mod reconcile;
pub mod store;

pub use config::SyncConfig;
pub use delta::{dedupe_snapshots, DeltaPlan};
pub use error::SyncError;
pub use job::{BootstrapReport, EventSource, UpdateJob, UpdateOutcome};
pub use reconcile::{ReconcileSummary, Reconciled, Reconciler};
pub use store::{DatasetStore, LoadStatus, LoadedDataset};
