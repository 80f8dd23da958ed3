//! Change-to-store mapping: which discovered stores does a commit range touch.

use crate::config::DetectConfig;
use crate::git;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// First path segment reserved for automation metadata; changes under it
/// never mark a store.
const METADATA_DIR: &str = ".github";

/// Computes the subset of `stores` changed since the configured last sync
/// commit.
///
/// With no prior reference the whole indexable set is returned (cold start).
/// An invalid or unreachable reference degrades to the full set with a
/// warning instead of failing the caller. An empty diff yields an empty set.
pub fn changed_stores(config: &DetectConfig, stores: &[String]) -> Vec<String> {
    let reference = match &config.last_sync_commit {
        Some(reference) => reference,
        None => {
            info!("First (or full) sync, returning all indexable stores");
            return full_set(stores);
        }
    };

    if !git::commit_exists(&config.docs.docs_path, reference) {
        warn!(
            reference,
            "Last sync commit not found in history, falling back to full resync"
        );
        return full_set(stores);
    }

    let paths = match git::changed_paths(&config.docs.docs_path, reference) {
        Ok(paths) => paths,
        Err(e) => {
            warn!(error = ?e, reference, "git diff failed, falling back to full resync");
            return full_set(stores);
        }
    };

    if paths.is_empty() {
        info!(reference, "No changes since last sync");
        return Vec::new();
    }

    map_paths_to_stores(&paths, stores)
}

fn full_set(stores: &[String]) -> Vec<String> {
    let mut all: Vec<String> = stores.to_vec();
    all.sort();
    all
}

/// Maps changed file paths onto store identities.
///
/// Paths under the automation-metadata directory or containing a hidden
/// segment are discarded. Each remaining path marks at most one store: the
/// candidates are tried sorted by identity length descending, so when stores
/// nest the most specific prefix wins regardless of discovery order.
pub fn map_paths_to_stores(paths: &[String], stores: &[String]) -> Vec<String> {
    let mut by_specificity: Vec<&str> = stores.iter().map(String::as_str).collect();
    by_specificity.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut changed: BTreeSet<String> = BTreeSet::new();
    for path in paths {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.first() == Some(&METADATA_DIR) {
            debug!(path, "Ignoring automation-metadata change");
            continue;
        }
        if segments.iter().any(|segment| segment.starts_with('.')) {
            debug!(path, "Ignoring hidden path");
            continue;
        }

        let matched = by_specificity
            .iter()
            .copied()
            .find(|&store| path.as_str() == store || path.starts_with(&format!("{store}/")));
        match matched {
            Some(store) => {
                changed.insert(store.to_string());
            }
            None => {
                // A change under a namespace container that never became a
                // store maps to nothing.
                debug!(path, "Changed path matches no indexable store");
            }
        }
    }

    let changed: Vec<String> = changed.into_iter().collect();
    info!(
        changed_paths = paths.len(),
        changed_stores = changed.len(),
        "Mapped changed paths to stores"
    );
    changed
}
