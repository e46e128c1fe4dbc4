//! Reconciliation of batch outcomes into the catalog document.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::catalog::PackageCatalog;
use crate::processor::CommitAction;

use super::types::EntryOutcome;

/// Apply a batch's outcomes to the catalog.
///
/// Outcomes are applied in ascending commit-timestamp order regardless of
/// the order workers finished in, so when two entries in one batch touch
/// the same package the chronologically later one wins.
///
/// Returns the maximum commit timestamp seen across all outcomes (the
/// cursor target for this unit of work), or `None` for an empty batch.
pub fn apply_outcomes(
    catalog: &mut PackageCatalog,
    mut outcomes: Vec<EntryOutcome>,
) -> Option<DateTime<Utc>> {
    outcomes.sort_by_key(|o| o.entry.commit_timestamp);

    let mut max_seen = None;

    for outcome in outcomes {
        let entry = &outcome.entry;
        max_seen = Some(match max_seen {
            None => entry.commit_timestamp,
            Some(prev) => entry.commit_timestamp.max(prev),
        });

        match outcome.action {
            CommitAction::LatestStable {
                version,
                commit_id,
                download_url,
                have_idx,
            } => {
                catalog.set_latest_stable(
                    &entry.package_id,
                    &version,
                    &commit_id,
                    entry.commit_timestamp,
                    download_url,
                    have_idx,
                );
            }
            CommitAction::Delist => {
                catalog.delist(&entry.package_id);
            }
            CommitAction::Skip => {
                debug!(
                    "no action for {} {}",
                    entry.package_id, entry.package_version
                );
            }
        }
    }

    max_seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn latest(version: &str, commit_id: &str) -> CommitAction {
        CommitAction::LatestStable {
            version: version.to_string(),
            commit_id: commit_id.to_string(),
            download_url: None,
            have_idx: false,
        }
    }

    #[test]
    fn test_empty_batch_returns_none() {
        let mut catalog = PackageCatalog::new("http://feed/index.json");
        assert!(apply_outcomes(&mut catalog, vec![]).is_none());
    }

    #[test]
    fn test_delist_then_readd_restores() {
        let mut catalog = PackageCatalog::new("http://feed/index.json");

        let outcomes = vec![
            EntryOutcome {
                entry: fixtures::details_entry("Pkg", "1.0.0", 100),
                action: latest("1.0.0", "c1"),
            },
            EntryOutcome {
                entry: fixtures::delete_entry("Pkg", "1.0.0", 200),
                action: CommitAction::Delist,
            },
            EntryOutcome {
                entry: fixtures::details_entry("Pkg", "2.0.0", 300),
                action: latest("2.0.0", "c3"),
            },
        ];

        let max = apply_outcomes(&mut catalog, outcomes).unwrap();
        assert_eq!(max, fixtures::ts(300));
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get("pkg").unwrap().latest_stable_version.as_deref(),
            Some("2.0.0")
        );
    }

    #[test]
    fn test_outcomes_applied_in_commit_order_not_arrival_order() {
        let mut catalog = PackageCatalog::new("http://feed/index.json");

        // Arrival order has the delete last, but it is chronologically
        // older than the re-add.
        let outcomes = vec![
            EntryOutcome {
                entry: fixtures::details_entry("Pkg", "2.0.0", 300),
                action: latest("2.0.0", "c3"),
            },
            EntryOutcome {
                entry: fixtures::delete_entry("Pkg", "1.0.0", 200),
                action: CommitAction::Delist,
            },
        ];

        apply_outcomes(&mut catalog, outcomes);
        // The chronologically later LatestStable wins.
        assert_eq!(
            catalog.get("pkg").unwrap().latest_stable_version.as_deref(),
            Some("2.0.0")
        );
    }

    #[test]
    fn test_skip_counts_toward_cursor_but_mutates_nothing() {
        let mut catalog = PackageCatalog::new("http://feed/index.json");

        let outcomes = vec![EntryOutcome {
            entry: fixtures::details_entry("Pkg", "1.0.0", 500),
            action: CommitAction::Skip,
        }];

        let max = apply_outcomes(&mut catalog, outcomes).unwrap();
        assert_eq!(max, fixtures::ts(500));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_delist_of_absent_package_is_noop() {
        let mut catalog = PackageCatalog::new("http://feed/index.json");

        let outcomes = vec![EntryOutcome {
            entry: fixtures::delete_entry("Never.Seen", "1.0.0", 100),
            action: CommitAction::Delist,
        }];

        apply_outcomes(&mut catalog, outcomes);
        assert!(catalog.is_empty());
    }
}
