//! Sync execution: delete and recreate remote stores for the changed
//! directories and re-upload their qualifying files.
//!
//! Uploads run through a flat bounded worker pool. Individual failures are
//! counted, never propagated; the aggregate failure rate is judged by the
//! caller after all tasks settle.

use crate::config::SyncConfig;
use crate::output::{self, SyncStats};
use crate::store::{Operation, StoreClient};
use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Files smaller than this are skipped as trivial.
const MIN_FILE_SIZE: u64 = 10;

/// Extensions accepted for upload. `.mdx` is rewritten to `.md` first.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "md", "mdx", "txt", "py", "js", "json", "ts", "tsx", "jsx", "rst",
];

/// Maximum uploads in flight at once.
const MAX_CONCURRENT_UPLOADS: usize = 10;

/// Interval between operation-status polls.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Upper bound on waiting for pending uploads per store.
const MAX_WAIT: Duration = Duration::from_secs(600);

/// Settle time after deleting a store before recreating it.
const DELETE_SETTLE: Duration = Duration::from_secs(2);

/// Indexing price per million tokens, for the cost estimate.
const COST_PER_MILLION_TOKENS: f64 = 0.15;

/// Decides whether a file qualifies for upload: allow-listed extension,
/// minimum size, and near-empty `__init__.py` markers skipped.
pub fn should_process(path: &Path) -> bool {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match extension {
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => return false,
    }

    let size = match path.metadata() {
        Ok(meta) => meta.len(),
        Err(_) => return false,
    };
    if size < MIN_FILE_SIZE {
        return false;
    }
    if path.file_name().and_then(|n| n.to_str()) == Some("__init__.py") && size < 100 {
        return false;
    }
    true
}

/// Walks a store's subtree and partitions files into uploadable and skipped.
/// Hidden files count as skipped.
pub fn collect_files(dir: &Path) -> std::io::Result<(Vec<PathBuf>, usize)> {
    let mut files = Vec::new();
    let mut skipped = 0usize;

    fn visit(
        dir: &Path,
        files: &mut Vec<PathBuf>,
        skipped: &mut usize,
    ) -> std::io::Result<()> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|res| res.ok())
            .map(|entry| entry.path())
            .collect();
        entries.sort();
        for path in entries {
            if path.is_dir() {
                visit(&path, files, skipped)?;
            } else if path.is_file() {
                let hidden = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
                if !hidden && should_process(&path) {
                    files.push(path);
                } else {
                    *skipped += 1;
                }
            }
        }
        Ok(())
    }

    visit(dir, &mut files, &mut skipped)?;
    Ok((files, skipped))
}

/// Prepares a file for upload. `.mdx` files get a `.md` copy in `temp_dir`
/// for upload compatibility; the display name keeps the original filename.
pub fn prepare_for_upload(path: &Path, temp_dir: &Path) -> std::io::Result<(PathBuf, String)> {
    let display_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let is_mdx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mdx"));
    if is_mdx {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = temp_dir.join(format!("{stem}.md"));
        std::fs::copy(path, &temp_path)?;
        debug!(file = %path.display(), "Rewrote .mdx file as .md for upload");
        Ok((temp_path, display_name))
    } else {
        Ok((path.to_path_buf(), display_name))
    }
}

/// Outcome of one queued upload, before the operation settles.
struct UploadOutcome {
    operation: Option<Operation>,
    estimated_tokens: u64,
    file: PathBuf,
    error: Option<String>,
}

/// Recreates and repopulates every changed store. Writes the summary file and
/// the `synced_count` sink entry; returns aggregate statistics.
pub async fn sync_stores<C>(client: &C, config: &SyncConfig) -> Result<SyncStats>
where
    C: StoreClient,
{
    if config.changed_dirs.is_empty() {
        info!("No directories changed, skipping sync");
        let stats = SyncStats::default();
        output::write_summary(&config.summary_path, &stats)?;
        output::write_output("synced_count", "0")?;
        return Ok(stats);
    }

    // One listing up front; repeated lookups go through this cache.
    info!("Fetching existing file search stores");
    let stores_by_display: HashMap<String, String> = match client.list_stores().await {
        Ok(stores) => stores
            .into_iter()
            .map(|s| (s.display_name, s.name))
            .collect(),
        Err(e) => {
            warn!(error = ?e, "Could not list existing stores, assuming none");
            HashMap::new()
        }
    };

    let mut stats = SyncStats {
        synced_count: config.changed_dirs.len(),
        ..SyncStats::default()
    };

    for store_name in &config.changed_dirs {
        info!(store = %store_name, "Processing store");

        if let Some(existing) = stores_by_display.get(store_name) {
            info!(store = %store_name, resource = %existing, "Deleting existing store");
            match client.delete_store(existing, true).await {
                Ok(()) => tokio::time::sleep(DELETE_SETTLE).await,
                Err(e) => {
                    error!(store = %store_name, error = ?e, "Failed to delete existing store, continuing with creation");
                }
            }
        }

        let store = match client.create_store(store_name).await {
            Ok(store) => store,
            Err(e) => {
                error!(store = %store_name, error = ?e, "Failed to create store, skipping");
                continue;
            }
        };

        let store_dir = config.docs.docs_path.join(store_name);
        if !store_dir.is_dir() {
            warn!(path = %store_dir.display(), "Store directory does not exist, skipping");
            continue;
        }

        let (files, skipped) = collect_files(&store_dir)?;
        stats.files_skipped += skipped;
        info!(
            store = %store_name,
            files = files.len(),
            skipped,
            "Collected files for upload"
        );
        if files.is_empty() {
            warn!(store = %store_name, "No files remain after filtering, skipping store");
            continue;
        }

        let temp_dir = tempfile::tempdir()?;
        let temp_path = temp_dir.path();
        let store_resource = store.name.as_str();

        let outcomes: Vec<UploadOutcome> = stream::iter(files.into_iter())
            .map(|file| async move {
                let (upload_path, display_name) = match prepare_for_upload(&file, temp_path) {
                    Ok(prepared) => prepared,
                    Err(e) => {
                        return UploadOutcome {
                            operation: None,
                            estimated_tokens: 0,
                            file,
                            error: Some(e.to_string()),
                        }
                    }
                };
                let size = match tokio::fs::metadata(&upload_path).await {
                    Ok(meta) => meta.len(),
                    Err(e) => {
                        return UploadOutcome {
                            operation: None,
                            estimated_tokens: 0,
                            file,
                            error: Some(e.to_string()),
                        }
                    }
                };
                match client
                    .upload_file(store_resource, &upload_path, &display_name)
                    .await
                {
                    Ok(op) => UploadOutcome {
                        operation: Some(op),
                        estimated_tokens: size / 4,
                        file,
                        error: None,
                    },
                    Err(e) => UploadOutcome {
                        operation: None,
                        estimated_tokens: 0,
                        file,
                        error: Some(e.to_string()),
                    },
                }
            })
            .buffer_unordered(MAX_CONCURRENT_UPLOADS)
            .collect()
            .await;

        let mut operations = Vec::new();
        let mut store_tokens = 0u64;
        let mut store_failed = 0usize;
        for outcome in outcomes {
            match outcome.operation {
                Some(op) => {
                    operations.push(op);
                    store_tokens += outcome.estimated_tokens;
                    stats.files_uploaded += 1;
                }
                None => {
                    store_failed += 1;
                    stats.files_failed += 1;
                    error!(
                        file = %outcome.file.display(),
                        error = outcome.error.as_deref().unwrap_or("unknown"),
                        "Upload failed"
                    );
                }
            }
        }

        wait_for_operations(client, &mut operations).await;

        let cost = (store_tokens as f64 / 1_000_000.0) * COST_PER_MILLION_TOKENS;
        stats.total_cost += cost;
        info!(
            store = %store_name,
            indexed = operations.len(),
            skipped,
            failed = store_failed,
            estimated_tokens = store_tokens,
            cost,
            "Store sync complete"
        );
    }

    output::write_summary(&config.summary_path, &stats)?;
    output::write_output("synced_count", &stats.synced_count.to_string())?;

    info!(
        synced = stats.synced_count,
        uploaded = stats.files_uploaded,
        skipped = stats.files_skipped,
        failed = stats.files_failed,
        total_cost = stats.total_cost,
        "Total sync summary"
    );
    Ok(stats)
}

/// Polls pending operations until all settle or the wait budget is spent.
/// Status-check errors are ignored; the next round retries.
async fn wait_for_operations<C>(client: &C, operations: &mut [Operation])
where
    C: StoreClient,
{
    let pending = operations.iter().filter(|op| !op.done).count();
    if pending == 0 {
        return;
    }
    info!(pending, "Waiting for upload operations to finish");

    let start = Instant::now();
    loop {
        let mut remaining = 0usize;
        for op in operations.iter_mut() {
            if op.done {
                continue;
            }
            match client.get_operation(&op.name).await {
                Ok(refreshed) => {
                    *op = refreshed;
                    if !op.done {
                        remaining += 1;
                    }
                }
                Err(_) => remaining += 1,
            }
        }
        if remaining == 0 {
            info!("All upload operations completed");
            return;
        }
        if start.elapsed() > MAX_WAIT {
            warn!(remaining, "Timeout while waiting for upload operations");
            return;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
