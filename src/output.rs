//! Key/value sink and summary-file writers consumed by the invoking
//! automation.

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Appends `key=value` to the key/value sink named by `GITHUB_OUTPUT`. A
/// missing sink is not an error; local runs simply skip it.
pub fn write_output(key: &str, value: &str) -> Result<()> {
    let Some(sink) = sink_path() else {
        debug!(key, "No output sink configured, skipping");
        return Ok(());
    };
    let mut file = OpenOptions::new().create(true).append(true).open(&sink)?;
    writeln!(file, "{key}={value}")?;
    debug!(key, value, sink = %sink, "Wrote output entry");
    Ok(())
}

/// Appends a multi-line entry in heredoc form, used for the `changed_dirs`
/// JSON payload.
pub fn write_output_multiline(key: &str, value: &str) -> Result<()> {
    let Some(sink) = sink_path() else {
        debug!(key, "No output sink configured, skipping");
        return Ok(());
    };
    let mut file = OpenOptions::new().create(true).append(true).open(&sink)?;
    writeln!(file, "{key}<<EOF")?;
    writeln!(file, "{value}")?;
    writeln!(file, "EOF")?;
    debug!(key, sink = %sink, "Wrote multi-line output entry");
    Ok(())
}

fn sink_path() -> Option<String> {
    std::env::var("GITHUB_OUTPUT").ok().filter(|p| !p.is_empty())
}

/// Statistics accumulated over one sync run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStats {
    pub synced_count: usize,
    pub total_cost: f64,
    pub files_uploaded: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
}

impl SyncStats {
    /// Fraction of attempted uploads that failed. Zero when nothing was
    /// attempted.
    pub fn failure_rate(&self) -> f64 {
        let attempted = self.files_uploaded + self.files_failed;
        if attempted == 0 {
            0.0
        } else {
            self.files_failed as f64 / attempted as f64
        }
    }
}

/// Writes the summary statistics file consumed by the workflow.
pub fn write_summary(path: &Path, stats: &SyncStats) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "synced_count={}", stats.synced_count)?;
    writeln!(file, "total_cost={:.4}", stats.total_cost)?;
    writeln!(file, "files_uploaded={}", stats.files_uploaded)?;
    writeln!(file, "files_skipped={}", stats.files_skipped)?;
    writeln!(file, "files_failed={}", stats.files_failed)?;
    info!(path = %path.display(), ?stats, "Wrote sync summary");
    Ok(())
}
