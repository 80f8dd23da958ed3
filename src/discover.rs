//! Store discovery: classify documentation subtrees as indexable stores.
//!
//! A directory is a store iff it holds at least one non-hidden regular file
//! directly at its own root. Directories with only subdirectories are
//! namespace containers and are searched recursively up to a depth bound.
//! Stores are leaves: a qualifying directory is never descended into.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// Names starting with this marker never contribute to discovery.
const HIDDEN_MARKER: char = '.';

fn is_hidden(name: &str) -> bool {
    name.starts_with(HIDDEN_MARKER)
}

/// A single exclusion rule loaded from the pattern file.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    /// Excludes exactly one store identity.
    Exact(String),
    /// `prefix/*`: excludes `prefix` itself and every identity under it.
    Subtree(String),
}

/// Set of exclusion patterns applied to discovered store identities.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    /// Parses patterns from raw lines. Blank lines and `#` comments are
    /// ignored.
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let patterns = lines
            .into_iter()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| match line.strip_suffix("/*") {
                Some(prefix) => Pattern::Subtree(prefix.to_string()),
                None => Pattern::Exact(line.to_string()),
            })
            .collect();
        ExcludeSet { patterns }
    }

    /// Loads the pattern file. A missing file yields an empty set, not an
    /// error.
    pub fn load(path: &Path) -> io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => {
                let set = Self::from_lines(content.lines());
                info!(
                    path = %path.display(),
                    patterns = set.patterns.len(),
                    "Loaded exclusion patterns"
                );
                Ok(set)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No exclusion file, empty pattern set");
                Ok(ExcludeSet::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True if the given store identity matches any pattern.
    pub fn matches(&self, identity: &str) -> bool {
        self.patterns.iter().any(|pattern| match pattern {
            Pattern::Exact(name) => identity == name,
            Pattern::Subtree(prefix) => {
                identity == prefix || identity.starts_with(&format!("{prefix}/"))
            }
        })
    }
}

/// Discovers all indexable stores under `root`, as `/`-joined identities
/// relative to the root, in lexicographic traversal order.
///
/// A missing root returns an empty set so the caller stays idempotent when
/// the documentation tree has not been checked out yet.
pub fn indexable_stores(
    root: &Path,
    max_depth: usize,
    excludes: &ExcludeSet,
) -> io::Result<Vec<String>> {
    if !root.is_dir() {
        warn!(root = %root.display(), "Docs root does not exist, no stores discovered");
        return Ok(Vec::new());
    }

    let mut stores = Vec::new();
    for entry in sorted_entries(root)? {
        let name = entry.0;
        let path = entry.1;
        if path.is_dir() && !is_hidden(&name) {
            scan_directory(&path, &name, 0, max_depth, excludes, &mut stores)?;
        }
    }
    info!(count = stores.len(), root = %root.display(), "Store discovery complete");
    Ok(stores)
}

/// Classifies one directory and recurses into namespace containers.
fn scan_directory(
    path: &Path,
    identity: &str,
    depth: usize,
    max_depth: usize,
    excludes: &ExcludeSet,
    stores: &mut Vec<String>,
) -> io::Result<()> {
    if depth > max_depth {
        debug!(identity, depth, "Beyond max depth, ignoring subtree");
        return Ok(());
    }

    let entries = sorted_entries(path)?;
    let files_at_root = entries
        .iter()
        .filter(|(name, p)| p.is_file() && !is_hidden(name))
        .count();

    if files_at_root > 0 {
        // A store is a leaf: subdirectories belong to it and are not
        // searched for nested stores.
        if excludes.matches(identity) {
            info!(identity, "Store excluded by pattern");
        } else {
            debug!(identity, files_at_root, "Indexable store");
            stores.push(identity.to_string());
        }
        return Ok(());
    }

    debug!(identity, "Namespace container, checking subdirectories");
    for (name, child) in entries {
        if child.is_dir() && !is_hidden(&name) {
            let child_identity = format!("{identity}/{name}");
            scan_directory(&child, &child_identity, depth + 1, max_depth, excludes, stores)?;
        }
    }
    Ok(())
}

/// Directory entries sorted by name for reproducible traversal order.
fn sorted_entries(dir: &Path) -> io::Result<Vec<(String, std::path::PathBuf)>> {
    let mut entries: Vec<(String, std::path::PathBuf)> = fs::read_dir(dir)?
        .filter_map(|res| res.ok())
        .map(|entry| {
            (
                entry.file_name().to_string_lossy().into_owned(),
                entry.path(),
            )
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}
