//! Delta planning between fetched and stored markets

use itertools::Itertools;
use reality_core::{MarketRecord, MarketSnapshot};
use std::collections::{BTreeSet, HashMap};

/// Partition of ids into new, updated and expired
///
/// The three sets are disjoint: `new` is in the feed only, `updated` is in
/// both, `expired` is in the stored dataset only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaPlan {
    pub new_ids: BTreeSet<String>,
    pub updated_ids: BTreeSet<String>,
    pub expired_ids: BTreeSet<String>,
}

impl DeltaPlan {
    pub fn compute(current: &[MarketSnapshot], previous: &HashMap<String, MarketRecord>) -> Self {
        let current_ids: BTreeSet<&str> = current.iter().map(|s| s.id.as_str()).collect();

        let (updated_ids, new_ids): (BTreeSet<String>, BTreeSet<String>) = current_ids
            .iter()
            .map(|id| id.to_string())
            .partition(|id| previous.contains_key(id));

        let expired_ids = previous
            .keys()
            .filter(|id| !current_ids.contains(id.as_str()))
            .cloned()
            .collect();

        Self {
            new_ids,
            updated_ids,
            expired_ids,
        }
    }

    pub fn is_new(&self, id: &str) -> bool {
        self.new_ids.contains(id)
    }

    pub fn has_new(&self) -> bool {
        !self.new_ids.is_empty()
    }
}

/// Drop repeated ids from a feed, keeping the first occurrence
pub fn dedupe_snapshots(snapshots: Vec<MarketSnapshot>) -> Vec<MarketSnapshot> {
    snapshots
        .into_iter()
        .unique_by(|s| s.id.clone())
        .collect()
}
