use crate::config::{DetectConfig, DocsConfig, SyncConfig, DEFAULT_MAX_DEPTH};
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Default location of the summary statistics file written after a sync run.
pub const DEFAULT_SUMMARY_PATH: &str = "/tmp/sync_summary.txt";

/// Default exclusion-pattern file, relative to the working directory.
pub const DEFAULT_EXCLUDE_FILE: &str = ".sync-exclude";

#[derive(Deserialize, Default)]
struct StaticConfig {
    #[serde(default)]
    docs_path: Option<PathBuf>,
    #[serde(default)]
    max_depth: Option<usize>,
    #[serde(default)]
    exclude_file: Option<PathBuf>,
}

/// Loads the optional static YAML config file (no secrets) and merges it with
/// environment overrides. Returns the shared docs settings.
fn load_docs_config(path: Option<&Path>) -> Result<DocsConfig> {
    let static_conf = match path {
        Some(path_ref) => {
            info!(config_path = ?path_ref, "Loading configuration from file");
            let config_content = match fs::read_to_string(path_ref) {
                Ok(content) => {
                    info!(config_path = ?path_ref, "Config file read successfully");
                    content
                }
                Err(e) => {
                    error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
                    return Err(anyhow::anyhow!(
                        "Failed to read config file {:?}: {}",
                        path_ref,
                        e
                    ));
                }
            };
            match serde_yaml::from_str::<StaticConfig>(&config_content) {
                Ok(conf) => {
                    info!(config_path = ?path_ref, "Parsed config YAML successfully");
                    conf
                }
                Err(e) => {
                    error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                    return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
                }
            }
        }
        None => StaticConfig::default(),
    };

    // DOCS_PATH from the environment wins over the file, as in the invoking
    // automation.
    let docs_path = match std::env::var("DOCS_PATH") {
        Ok(p) if !p.is_empty() => PathBuf::from(p),
        _ => static_conf
            .docs_path
            .unwrap_or_else(|| PathBuf::from("docs")),
    };

    Ok(DocsConfig {
        docs_path,
        max_depth: static_conf.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        exclude_file: static_conf
            .exclude_file
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXCLUDE_FILE)),
    })
}

/// Builds the detect-stage config. `LAST_SYNC_COMMIT` is optional: when it is
/// unset or empty the caller performs a full resync.
pub fn load_detect_config(path: Option<&Path>) -> Result<DetectConfig> {
    let docs = load_docs_config(path)?;
    let last_sync_commit = match std::env::var("LAST_SYNC_COMMIT") {
        Ok(reference) if !reference.trim().is_empty() => Some(reference.trim().to_string()),
        _ => {
            info!("LAST_SYNC_COMMIT not set, full discovery will be performed");
            None
        }
    };
    Ok(DetectConfig {
        docs,
        last_sync_commit,
    })
}

/// Builds the sync-stage config. `CHANGED_DIRS` must hold a JSON array of
/// store identities; anything else is a fatal configuration error.
pub fn load_sync_config(path: Option<&Path>) -> Result<SyncConfig> {
    let docs = load_docs_config(path)?;

    let raw_changed = std::env::var("CHANGED_DIRS").unwrap_or_else(|_| "[]".to_string());
    let changed_dirs: Vec<String> = match serde_json::from_str(&raw_changed) {
        Ok(dirs) => dirs,
        Err(e) => {
            error!(error = ?e, raw = %raw_changed, "CHANGED_DIRS is not a valid JSON array");
            return Err(anyhow::anyhow!(
                "Invalid CHANGED_DIRS value ({e}): {raw_changed}"
            ));
        }
    };

    info!(changed_count = changed_dirs.len(), "Parsed CHANGED_DIRS");

    Ok(SyncConfig {
        docs,
        changed_dirs,
        summary_path: PathBuf::from(DEFAULT_SUMMARY_PATH),
    })
}

/// Reads the required API credential. Missing key is a fatal startup error.
pub fn api_key_from_env() -> Result<String> {
    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.is_empty() => {
            info!("GEMINI_API_KEY found in env");
            Ok(key)
        }
        _ => {
            error!("GEMINI_API_KEY environment variable not set");
            Err(anyhow::anyhow!(
                "GEMINI_API_KEY environment variable not set"
            ))
        }
    }
}
