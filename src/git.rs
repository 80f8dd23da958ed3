//! Bounded git subprocess queries used by change detection.

use anyhow::Result;
use std::path::Path;
use std::process::Command;
use tracing::{debug, error, info};

/// Checks whether `reference` resolves to a commit reachable from the
/// checkout containing `workdir`.
pub fn commit_exists(workdir: &Path, reference: &str) -> bool {
    let status = Command::new("git")
        .arg("-C")
        .arg(workdir)
        .arg("rev-parse")
        .arg("--verify")
        .arg("--quiet")
        .arg(format!("{reference}^{{commit}}"))
        .status();

    match status {
        Ok(s) if s.success() => {
            debug!(reference, "Commit reference resolved");
            true
        }
        Ok(s) => {
            info!(reference, status = ?s, "Commit reference did not resolve");
            false
        }
        Err(e) => {
            error!(error = ?e, reference, "Failed to launch git rev-parse");
            false
        }
    }
}

/// Lists the paths that differ between `reference` and HEAD, relative to
/// `workdir` (the documentation root). A two-dot diff against the current
/// tree, scoped to the working directory.
pub fn changed_paths(workdir: &Path, reference: &str) -> Result<Vec<String>> {
    let output = Command::new("git")
        .arg("-C")
        .arg(workdir)
        .arg("diff")
        .arg("--name-only")
        .arg("--relative")
        .arg(reference)
        .arg("HEAD")
        .arg("--")
        .arg(".")
        .output();

    let output = match output {
        Ok(out) => out,
        Err(e) => {
            error!(error = ?e, reference, "Failed to launch git diff");
            return Err(anyhow::anyhow!("Failed to launch git diff: {e}"));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(
            reference,
            status = ?output.status,
            stderr = %stderr,
            "git diff exited with non-zero code"
        );
        return Err(anyhow::anyhow!(
            "git diff {reference}..HEAD failed: {stderr}"
        ));
    }

    let paths: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    info!(reference, changed_files = paths.len(), "Computed git diff");
    Ok(paths)
}
