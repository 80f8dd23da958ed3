pub mod audit;
pub mod changes;
pub mod cleanup;
pub mod client;
pub mod config;
pub mod discover;
pub mod git;
pub mod load_config;
pub mod output;
pub mod store;
pub mod sync;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use client::ApiClient;
use discover::ExcludeSet;
use load_config::{api_key_from_env, load_detect_config, load_sync_config};

/// Sync runs fail when more than this fraction of uploads failed.
pub const FAILURE_THRESHOLD: f64 = 0.20;

/// CLI for store-sync: keep documentation directories mirrored into hosted
/// file search stores.
#[derive(Parser)]
#[clap(
    name = "store-sync",
    version,
    about = "Detect changed documentation directories and sync them into file search stores"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover indexable stores and print the changed subset as JSON
    Detect {
        /// Path to the optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Delete, recreate and re-upload every store listed in CHANGED_DIRS
    Sync {
        /// Path to the optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Report statistics, duplicates and failures over all remote stores
    Audit {
        /// Show detailed information for each store
        #[clap(long, short)]
        verbose: bool,
    },
    /// Delete duplicate stores, keeping the newest copy per display name
    CleanupDuplicates {
        /// Report what would be deleted without deleting anything
        #[clap(long)]
        dry_run: bool,
    },
    /// Delete stores on the hard-coded denylist
    Cleanup,
}

/// Resolves the exclusion file relative to the docs root unless absolute.
fn exclude_path(docs_path: &Path, exclude_file: &Path) -> PathBuf {
    if exclude_file.is_absolute() {
        exclude_file.to_path_buf()
    } else {
        docs_path.join(exclude_file)
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Detect { config } => {
            let config = load_detect_config(config.as_deref())?;
            config.trace_loaded();
            let excludes = ExcludeSet::load(&exclude_path(
                &config.docs.docs_path,
                &config.docs.exclude_file,
            ))?;
            let stores =
                discover::indexable_stores(&config.docs.docs_path, config.docs.max_depth, &excludes)?;
            let changed = changes::changed_stores(&config, &stores);
            let json = serde_json::to_string(&changed)?;
            println!("{json}");
            output::write_output_multiline("changed_dirs", &json)?;
            Ok(())
        }
        Commands::Sync { config } => {
            let config = load_sync_config(config.as_deref())?;
            config.trace_loaded();
            let client = ApiClient::new(api_key_from_env()?);
            let stats = sync::sync_stores(&client, &config).await?;
            let rate = stats.failure_rate();
            if rate > FAILURE_THRESHOLD {
                eprintln!("[ERROR] High failure rate: {:.1}%", rate * 100.0);
                anyhow::bail!("upload failure rate {:.1}% exceeds threshold", rate * 100.0);
            }
            println!(
                "Sync complete: {} stores, {} uploaded, {} skipped, {} failed, ${:.4}",
                stats.synced_count,
                stats.files_uploaded,
                stats.files_skipped,
                stats.files_failed,
                stats.total_cost
            );
            Ok(())
        }
        Commands::Audit { verbose } => {
            let client = ApiClient::new(api_key_from_env()?);
            let report = audit::audit(&client, verbose)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("{report}");
            Ok(())
        }
        Commands::CleanupDuplicates { dry_run } => {
            let client = ApiClient::new(api_key_from_env()?);
            let outcome = cleanup::cleanup_duplicates(&client, dry_run)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            if dry_run {
                println!(
                    "Dry run: would delete {} duplicate stores, freeing {}",
                    outcome.deleted,
                    audit::format_size(outcome.freed_bytes)
                );
            } else {
                println!(
                    "Deleted {} duplicate stores, freed {}",
                    outcome.deleted,
                    audit::format_size(outcome.freed_bytes)
                );
            }
            Ok(())
        }
        Commands::Cleanup => {
            let client = ApiClient::new(api_key_from_env()?);
            let outcome = cleanup::cleanup_denylist(&client)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!(
                "Cleanup complete: deleted {}, kept {}, unknown {}",
                outcome.deleted,
                outcome.kept,
                outcome.unknown.len()
            );
            for name in &outcome.unknown {
                println!("  review manually: {name}");
            }
            Ok(())
        }
    }
}
