//! Destructive maintenance tools: duplicate removal and denylist cleanup.

use crate::audit::{format_size, group_by_display_name};
use crate::store::{StoreClient, StoreError};
use tracing::{error, info, warn};

/// Store display names known to be mistakes: internal project directories
/// that were indexed from the wrong checkout. Deleted on sight.
const DENYLIST: &[&str] = &[
    "src",
    "dist",
    "node_modules",
    "scripts",
    "target",
    ".github",
    "README.md",
    "package.json",
    "package-lock.json",
    "tsconfig.json",
    ".gitignore",
];

/// Known-good documentation stores, kept and reported as such.
const KEEPLIST: &[&str] = &["context", "Factory-AI", "Factory-AI/factory"];

/// Result of a duplicate-cleanup pass.
#[derive(Debug, Default, PartialEq)]
pub struct DuplicateCleanup {
    pub deleted: usize,
    pub freed_bytes: u64,
}

/// Removes duplicate stores, keeping the most recently created copy of each
/// display name. With `dry_run` nothing is deleted, only counted.
pub async fn cleanup_duplicates<C>(
    client: &C,
    dry_run: bool,
) -> Result<DuplicateCleanup, StoreError>
where
    C: StoreClient,
{
    info!(dry_run, "Fetching all file search stores");
    let stores = client.list_stores().await?;
    let groups = group_by_display_name(&stores);

    let mut outcome = DuplicateCleanup::default();
    for (name, copies) in groups {
        if copies.len() < 2 {
            continue;
        }
        // Groups come back newest-first; the head is the keeper.
        let keep = &copies[0];
        info!(
            display_name = %name,
            copies = copies.len(),
            keeping = %keep.name,
            "Duplicate store group"
        );
        for old in &copies[1..] {
            if dry_run {
                info!(store = %old.name, created = %old.create_time, "Would delete duplicate");
                outcome.deleted += 1;
                outcome.freed_bytes += old.size_bytes;
                continue;
            }
            match client.delete_store(&old.name, true).await {
                Ok(()) => {
                    info!(store = %old.name, "Deleted duplicate store");
                    outcome.deleted += 1;
                    outcome.freed_bytes += old.size_bytes;
                }
                Err(e) => {
                    error!(store = %old.name, error = ?e, "Failed to delete duplicate store");
                }
            }
        }
    }

    info!(
        dry_run,
        deleted = outcome.deleted,
        freed = %format_size(outcome.freed_bytes),
        "Duplicate cleanup finished"
    );
    Ok(outcome)
}

/// Result of a denylist-cleanup pass.
#[derive(Debug, Default, PartialEq)]
pub struct DenylistCleanup {
    pub deleted: usize,
    pub kept: usize,
    pub unknown: Vec<String>,
}

/// Deletes every store whose display name is on the denylist. Known-good
/// names are kept; anything else is reported for manual review.
pub async fn cleanup_denylist<C>(client: &C) -> Result<DenylistCleanup, StoreError>
where
    C: StoreClient,
{
    info!("Fetching all file search stores");
    let stores = client.list_stores().await?;

    let mut outcome = DenylistCleanup::default();
    for store in stores {
        let display_name = store.display_name.as_str();
        if DENYLIST.contains(&display_name) {
            info!(display_name, resource = %store.name, "Deleting denylisted store");
            match client.delete_store(&store.name, true).await {
                Ok(()) => outcome.deleted += 1,
                Err(e) => {
                    error!(store = %store.name, error = ?e, "Failed to delete denylisted store");
                }
            }
        } else if KEEPLIST.contains(&display_name) {
            info!(display_name, "Keeping known documentation store");
            outcome.kept += 1;
        } else {
            warn!(display_name, resource = %store.name, "Unknown store, review manually");
            outcome.unknown.push(store.display_name);
        }
    }

    info!(
        deleted = outcome.deleted,
        kept = outcome.kept,
        unknown = outcome.unknown.len(),
        "Denylist cleanup finished"
    );
    Ok(outcome)
}
