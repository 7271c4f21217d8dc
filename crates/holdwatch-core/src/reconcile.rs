//! Snapshot reconciliation
//!
//! [`reconcile`] compares the stored snapshot with a freshly fetched one and
//! returns every difference as a [`ChangeEvent`]. It is a pure function: the
//! same inputs always produce the same events in the same order.
//!
//! ## Event order
//!
//! 1. `New` events, in the current snapshot's rank order
//! 2. `RankChanged` / `BalanceChanged` events for addresses present in both,
//!    in the current snapshot's rank order
//! 3. `Removed` events, in the prior snapshot's rank order

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::snapshot::{Entry, Snapshot};

/// One detected difference between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// Address entered the list
    New {
        address: String,
        rank: u32,
        balance_sats: u64,
    },

    /// Address changed position
    RankChanged {
        address: String,
        old_rank: u32,
        new_rank: u32,
    },

    /// Address balance moved by at least the threshold
    BalanceChanged {
        address: String,
        old_balance_sats: u64,
        new_balance_sats: u64,
        /// `new - old`, in smallest units
        delta_sats: i128,
    },

    /// Address left the list
    Removed {
        address: String,
        rank: u32,
        balance_sats: u64,
    },
}

impl ChangeEvent {
    /// The address this event is about
    pub fn address(&self) -> &str {
        match self {
            ChangeEvent::New { address, .. }
            | ChangeEvent::RankChanged { address, .. }
            | ChangeEvent::BalanceChanged { address, .. }
            | ChangeEvent::Removed { address, .. } => address,
        }
    }
}

/// Compare two snapshots and list their differences
///
/// A balance change is reported when the absolute delta is non-zero and at
/// least `balance_threshold_sats`. Rank and balance checks are independent,
/// so one address can produce both a `RankChanged` and a `BalanceChanged`.
///
/// An empty result means the snapshots hold the same addresses with the same
/// ranks and no material balance movement.
pub fn reconcile(
    prior: &Snapshot,
    current: &Snapshot,
    balance_threshold_sats: u64,
) -> Vec<ChangeEvent> {
    let prior_by_address = index_by_address(prior);
    let current_by_address = index_by_address(current);

    let current_ranked = ranked(current);
    let prior_ranked = ranked(prior);

    let mut events = Vec::new();

    for entry in &current_ranked {
        if !prior_by_address.contains_key(entry.address.as_str()) {
            events.push(ChangeEvent::New {
                address: entry.address.clone(),
                rank: entry.rank,
                balance_sats: entry.balance_sats,
            });
        }
    }

    for entry in &current_ranked {
        let Some(before) = prior_by_address.get(entry.address.as_str()) else {
            continue;
        };

        if before.rank != entry.rank {
            events.push(ChangeEvent::RankChanged {
                address: entry.address.clone(),
                old_rank: before.rank,
                new_rank: entry.rank,
            });
        }

        let delta = entry.balance_sats as i128 - before.balance_sats as i128;
        if delta != 0 && delta.unsigned_abs() >= balance_threshold_sats as u128 {
            events.push(ChangeEvent::BalanceChanged {
                address: entry.address.clone(),
                old_balance_sats: before.balance_sats,
                new_balance_sats: entry.balance_sats,
                delta_sats: delta,
            });
        }
    }

    for entry in &prior_ranked {
        if !current_by_address.contains_key(entry.address.as_str()) {
            events.push(ChangeEvent::Removed {
                address: entry.address.clone(),
                rank: entry.rank,
                balance_sats: entry.balance_sats,
            });
        }
    }

    events
}

fn index_by_address(snapshot: &Snapshot) -> HashMap<&str, &Entry> {
    snapshot
        .entries()
        .iter()
        .map(|entry| (entry.address.as_str(), entry))
        .collect()
}

// Stable sort keeps source order for equal ranks in unvalidated input.
fn ranked(snapshot: &Snapshot) -> Vec<&Entry> {
    let mut entries: Vec<&Entry> = snapshot.entries().iter().collect();
    entries.sort_by_key(|entry| entry.rank);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: u64 = 1_000_000;

    fn snapshot(rows: &[(u32, &str, u64)]) -> Snapshot {
        Snapshot::new(
            rows.iter()
                .map(|(rank, address, balance)| Entry::new(*rank, *address, *balance))
                .collect(),
        )
    }

    #[test]
    fn test_identical_snapshots_yield_nothing() {
        let prior = snapshot(&[(1, "addrA", 500_000_000), (2, "addrB", 300_000_000)]);
        let current = prior.clone();
        assert!(reconcile(&prior, &current, THRESHOLD).is_empty());
    }

    #[test]
    fn test_new_entrant() {
        let prior = snapshot(&[(1, "addrA", 500_000_000)]);
        let current = snapshot(&[(1, "addrA", 500_000_000), (2, "addrB", 100_000_000)]);

        assert_eq!(
            reconcile(&prior, &current, THRESHOLD),
            vec![ChangeEvent::New {
                address: "addrB".into(),
                rank: 2,
                balance_sats: 100_000_000,
            }]
        );
    }

    #[test]
    fn test_rank_swap() {
        let prior = snapshot(&[(1, "addrA", 500_000_000), (2, "addrB", 300_000_000)]);
        let current = snapshot(&[(1, "addrB", 300_000_000), (2, "addrA", 500_000_000)]);

        assert_eq!(
            reconcile(&prior, &current, THRESHOLD),
            vec![
                ChangeEvent::RankChanged {
                    address: "addrB".into(),
                    old_rank: 2,
                    new_rank: 1,
                },
                ChangeEvent::RankChanged {
                    address: "addrA".into(),
                    old_rank: 1,
                    new_rank: 2,
                },
            ]
        );
    }

    #[test]
    fn test_balance_drop_at_threshold() {
        let prior = snapshot(&[(1, "addrA", 500_000_000)]);
        let current = snapshot(&[(1, "addrA", 498_000_000)]);

        assert_eq!(
            reconcile(&prior, &current, THRESHOLD),
            vec![ChangeEvent::BalanceChanged {
                address: "addrA".into(),
                old_balance_sats: 500_000_000,
                new_balance_sats: 498_000_000,
                delta_sats: -2_000_000,
            }]
        );
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let prior = snapshot(&[(1, "addrA", 500_000_000)]);

        let exactly = snapshot(&[(1, "addrA", 500_000_000 + THRESHOLD)]);
        assert_eq!(reconcile(&prior, &exactly, THRESHOLD).len(), 1);

        let just_below = snapshot(&[(1, "addrA", 500_000_000 + THRESHOLD - 1)]);
        assert!(reconcile(&prior, &just_below, THRESHOLD).is_empty());
    }

    #[test]
    fn test_zero_threshold_ignores_unchanged_balance() {
        let prior = snapshot(&[(1, "addrA", 500_000_000)]);
        assert!(reconcile(&prior, &prior.clone(), 0).is_empty());
    }

    #[test]
    fn test_removed() {
        let prior = snapshot(&[(1, "addrA", 500_000_000)]);
        let current = Snapshot::empty();

        assert_eq!(
            reconcile(&prior, &current, THRESHOLD),
            vec![ChangeEvent::Removed {
                address: "addrA".into(),
                rank: 1,
                balance_sats: 500_000_000,
            }]
        );
    }

    #[test]
    fn test_first_run_reports_only_new() {
        let current = snapshot(&[(1, "addrA", 5), (2, "addrB", 4), (3, "addrC", 3)]);
        let events = reconcile(&Snapshot::empty(), &current, THRESHOLD);

        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| matches!(e, ChangeEvent::New { .. })));
        let order: Vec<&str> = events.iter().map(|e| e.address()).collect();
        assert_eq!(order, vec!["addrA", "addrB", "addrC"]);
    }

    #[test]
    fn test_rank_and_balance_fire_together() {
        let prior = snapshot(&[(1, "addrA", 900_000_000), (2, "addrB", 800_000_000)]);
        let current = snapshot(&[(1, "addrB", 950_000_000), (2, "addrA", 900_000_000)]);

        let events = reconcile(&prior, &current, THRESHOLD);
        assert_eq!(
            events,
            vec![
                ChangeEvent::RankChanged {
                    address: "addrB".into(),
                    old_rank: 2,
                    new_rank: 1,
                },
                ChangeEvent::BalanceChanged {
                    address: "addrB".into(),
                    old_balance_sats: 800_000_000,
                    new_balance_sats: 950_000_000,
                    delta_sats: 150_000_000,
                },
                ChangeEvent::RankChanged {
                    address: "addrA".into(),
                    old_rank: 1,
                    new_rank: 2,
                },
            ]
        );
    }

    #[test]
    fn test_block_ordering() {
        let prior = snapshot(&[
            (1, "gone1", 900),
            (2, "stay", 800),
            (3, "gone2", 700),
        ]);
        let current = snapshot(&[(1, "fresh1", 1000), (2, "stay", 800), (3, "fresh2", 600)]);

        let events = reconcile(&prior, &current, 1);
        let summary: Vec<(&str, &str)> = events
            .iter()
            .map(|e| {
                let kind = match e {
                    ChangeEvent::New { .. } => "new",
                    ChangeEvent::RankChanged { .. } => "rank",
                    ChangeEvent::BalanceChanged { .. } => "balance",
                    ChangeEvent::Removed { .. } => "removed",
                };
                (kind, e.address())
            })
            .collect();

        assert_eq!(
            summary,
            vec![
                ("new", "fresh1"),
                ("new", "fresh2"),
                ("removed", "gone1"),
                ("removed", "gone2"),
            ]
        );
    }

    #[test]
    fn test_reconcile_is_repeatable() {
        let prior = snapshot(&[(1, "a", 10), (2, "b", 9), (3, "c", 8)]);
        let current = snapshot(&[(1, "c", 20), (2, "d", 9), (3, "a", 1)]);

        let first = reconcile(&prior, &current, 1);
        let second = reconcile(&prior, &current, 1);
        assert_eq!(first, second);
    }
}
