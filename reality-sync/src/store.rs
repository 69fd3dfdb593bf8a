//! Dataset file storage
//!
//! The dataset is a single compact JSON array of `MarketRecord`s. It is
//! both the input of a run (for diffing) and its output.

use reality_core::{MarketRecord, RealityError, RealityResult};
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

/// How the stored dataset was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No file yet
    Absent,
    /// File exists but could not be decoded; treated as empty
    Corrupt { reason: String },
    /// File decoded
    Loaded { count: usize },
}

/// Stored records keyed by id
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    pub records: HashMap<String, MarketRecord>,
    pub status: LoadStatus,
}

impl LoadedDataset {
    fn empty(status: LoadStatus) -> Self {
        Self {
            records: HashMap::new(),
            status,
        }
    }
}

/// Reads and writes the dataset file
#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored records
    ///
    /// A missing or undecodable file yields an empty dataset; any other I/O
    /// failure is returned as an error.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> RealityResult<LoadedDataset> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No dataset at {}, starting empty", self.path.display());
                return Ok(LoadedDataset::empty(LoadStatus::Absent));
            }
            Err(e) => {
                return Err(RealityError::storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let dataset = Self::decode(&bytes);
        match &dataset.status {
            LoadStatus::Corrupt { reason } => {
                warn!("Dataset {} is unreadable, starting empty: {}", self.path.display(), reason)
            }
            LoadStatus::Loaded { count } => debug!("Loaded {} stored markets", count),
            LoadStatus::Absent => {}
        }
        Ok(dataset)
    }

    /// Decode file contents, falling back to an empty dataset
    pub fn decode(bytes: &[u8]) -> LoadedDataset {
        match serde_json::from_slice::<Vec<MarketRecord>>(bytes) {
            Ok(records) => {
                let records: HashMap<String, MarketRecord> =
                    records.into_iter().map(|r| (r.id.clone(), r)).collect();
                LoadedDataset {
                    status: LoadStatus::Loaded {
                        count: records.len(),
                    },
                    records,
                }
            }
            Err(e) => LoadedDataset::empty(LoadStatus::Corrupt {
                reason: e.to_string(),
            }),
        }
    }

    /// Replace the dataset with `records`
    ///
    /// Writes compact JSON to a temporary file next to the target and
    /// renames it over the target. Returns the number of bytes written.
    #[instrument(skip(self, records), fields(path = %self.path.display(), count = records.len()))]
    pub fn save(&self, records: &[MarketRecord]) -> RealityResult<u64> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        fs::create_dir_all(dir).map_err(|e| {
            RealityError::storage(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let bytes = serde_json::to_vec(records)
            .map_err(|e| RealityError::storage(format!("Failed to serialize dataset: {}", e)))?;

        let mut file = NamedTempFile::new_in(dir)
            .map_err(|e| RealityError::storage(format!("Failed to create temp file: {}", e)))?;
        file.write_all(&bytes)
            .and_then(|_| file.as_file().sync_all())
            .map_err(|e| RealityError::storage(format!("Failed to write dataset: {}", e)))?;
        file.persist(&self.path).map_err(|e| {
            RealityError::storage(format!("Failed to replace {}: {}", self.path.display(), e.error))
        })?;

        debug!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(bytes.len() as u64)
    }
}
