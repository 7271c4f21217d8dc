//! Ranked holder snapshots
//!
//! An [`Entry`] is one holder at one point in time; a [`Snapshot`] is the
//! complete ranked list captured in one fetch. Both are plain values: a new
//! snapshot is built every cycle and the stored one is replaced wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::units;

/// One ranked holder
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// 1-based position in the snapshot
    pub rank: u32,
    /// Opaque ledger address, the natural key within a snapshot
    pub address: String,
    /// Balance in smallest indivisible units
    pub balance_sats: u64,
}

impl Entry {
    /// Create a new entry
    pub fn new(rank: u32, address: impl Into<String>, balance_sats: u64) -> Self {
        Self {
            rank,
            address: address.into(),
            balance_sats,
        }
    }

    /// Balance rendered in the main unit, for display only
    pub fn balance_units(&self, decimals: u32) -> String {
        units::format_units(self.balance_sats, decimals)
    }
}

/// The complete top-N list at one capture time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    captured_at: DateTime<Utc>,
    entries: Vec<Entry>,
}

impl Snapshot {
    /// Create a snapshot captured now
    pub fn new(entries: Vec<Entry>) -> Self {
        Self::with_captured_at(entries, Utc::now())
    }

    /// Create a snapshot with an explicit capture time
    pub fn with_captured_at(entries: Vec<Entry>, captured_at: DateTime<Utc>) -> Self {
        Self {
            captured_at,
            entries,
        }
    }

    /// The empty snapshot (no prior state)
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Build a snapshot from `(address, balance)` pairs already in rank order
    ///
    /// Ranks are assigned 1..k in iteration order.
    pub fn from_ordered<I, S>(holders: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let entries = holders
            .into_iter()
            .enumerate()
            .map(|(i, (address, balance))| Entry::new(i as u32 + 1, address, balance))
            .collect();
        Self::new(entries)
    }

    /// When the snapshot was captured
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Entries in the order they are stored
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate an untrusted snapshot and return it sorted by rank
    ///
    /// Rejects, with [`Error::InvalidSnapshot`]:
    /// - more than `limit` entries
    /// - ranks that are not exactly 1..k (gaps, duplicates, zero)
    /// - empty or duplicate addresses
    pub fn validate(mut self, limit: usize) -> Result<Self> {
        let k = self.entries.len();
        if k > limit {
            return Err(Error::invalid_snapshot(format!(
                "{} entries exceed the limit of {}",
                k, limit
            )));
        }

        let mut seen_ranks = vec![false; k];
        let mut seen_addresses = HashSet::with_capacity(k);

        for entry in &self.entries {
            let rank = entry.rank as usize;
            if rank == 0 || rank > k {
                return Err(Error::invalid_snapshot(format!(
                    "rank {} for {} is outside 1..={} (ranks must be dense)",
                    entry.rank, entry.address, k
                )));
            }
            if seen_ranks[rank - 1] {
                return Err(Error::invalid_snapshot(format!(
                    "duplicate rank {}",
                    entry.rank
                )));
            }
            seen_ranks[rank - 1] = true;

            if entry.address.trim().is_empty() {
                return Err(Error::invalid_snapshot(format!(
                    "empty address at rank {}",
                    entry.rank
                )));
            }
            if !seen_addresses.insert(entry.address.as_str()) {
                return Err(Error::invalid_snapshot(format!(
                    "duplicate address {}",
                    entry.address
                )));
            }
        }

        self.entries.sort_by_key(|entry| entry.rank);
        Ok(self)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
