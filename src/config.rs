use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Default maximum scan depth for store discovery.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Settings describing the documentation tree itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsConfig {
    /// Root of the documentation tree.
    pub docs_path: PathBuf,
    /// Maximum depth at which namespace containers are still searched.
    pub max_depth: usize,
    /// Flat file with exclusion patterns, one per line. May be absent.
    pub exclude_file: PathBuf,
}

impl DocsConfig {
    pub fn trace_loaded(&self) {
        info!(
            docs_path = %self.docs_path.display(),
            max_depth = self.max_depth,
            exclude_file = %self.exclude_file.display(),
            "Loaded docs config"
        );
        debug!(?self, "Docs config (full debug)");
    }
}

/// Configuration for the detect stage: discovery plus change mapping.
#[derive(Debug, Clone)]
pub struct DetectConfig {
    pub docs: DocsConfig,
    /// Commit reference of the previous sync. `None` forces full discovery.
    pub last_sync_commit: Option<String>,
}

impl DetectConfig {
    pub fn trace_loaded(&self) {
        self.docs.trace_loaded();
        info!(
            last_sync_commit = self.last_sync_commit.as_deref().unwrap_or("<none>"),
            "Loaded detect config"
        );
    }
}

/// Configuration for the sync stage: which stores to recreate and where.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub docs: DocsConfig,
    /// Store identities to delete, recreate and re-upload.
    pub changed_dirs: Vec<String>,
    /// Path the summary statistics file is written to.
    pub summary_path: PathBuf,
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        self.docs.trace_loaded();
        info!(
            changed_count = self.changed_dirs.len(),
            summary_path = %self.summary_path.display(),
            "Loaded sync config"
        );
    }
}
