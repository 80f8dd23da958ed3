//! Read-only audit report over the remote store collection: totals, quota
//! usage, duplicates and failed documents.

use crate::store::{Store, StoreClient, StoreError};
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::info;

const GIB: u64 = 1024 * 1024 * 1024;

/// Quota tiers the usage table is evaluated against.
const QUOTA_TIERS: &[(&str, u64)] = &[
    ("Free", GIB),
    ("Tier 1", 10 * GIB),
    ("Tier 2", 100 * GIB),
    ("Tier 3", 1024 * GIB),
];

/// Formats a byte count as a human-readable size.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{size:.2} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.2} PB")
}

/// Groups stores by display name, each group sorted newest-first by
/// creation time.
pub fn group_by_display_name(stores: &[Store]) -> BTreeMap<String, Vec<Store>> {
    let mut groups: BTreeMap<String, Vec<Store>> = BTreeMap::new();
    for store in stores {
        groups
            .entry(store.display_name.clone())
            .or_default()
            .push(store.clone());
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| b.create_time.cmp(&a.create_time));
    }
    groups
}

/// Builds the audit report text for a snapshot of the store collection.
pub fn build_report(stores: &[Store], verbose: bool) -> String {
    let mut out = String::new();

    if stores.is_empty() {
        out.push_str("No file search stores found\n");
        return out;
    }

    let groups = group_by_display_name(stores);
    let total_size: u64 = stores.iter().map(|s| s.size_bytes).sum();
    let total_active: u64 = stores.iter().map(|s| s.active_documents_count).sum();
    let total_pending: u64 = stores.iter().map(|s| s.pending_documents_count).sum();
    let total_failed: u64 = stores.iter().map(|s| s.failed_documents_count).sum();

    let _ = writeln!(out, "OVERALL STATISTICS");
    let _ = writeln!(out, "Total stores:            {}", stores.len());
    let _ = writeln!(out, "Unique store names:      {}", groups.len());
    let _ = writeln!(out, "Total storage used:      {}", format_size(total_size));
    let _ = writeln!(out, "Total active documents:  {total_active}");
    let _ = writeln!(out, "Total pending documents: {total_pending}");
    let _ = writeln!(out, "Total failed documents:  {total_failed}");
    out.push('\n');

    let _ = writeln!(out, "QUOTA USAGE (by tier):");
    for (tier, limit) in QUOTA_TIERS {
        let percentage = (total_size as f64 / *limit as f64) * 100.0;
        let _ = writeln!(
            out,
            "  {tier:8} ({:>10}): {percentage:>6.2}% used",
            format_size(*limit)
        );
    }
    out.push('\n');

    let duplicates: BTreeMap<&String, &Vec<Store>> =
        groups.iter().filter(|(_, v)| v.len() > 1).collect();
    if !duplicates.is_empty() {
        let _ = writeln!(
            out,
            "DUPLICATE STORES DETECTED: {} store names",
            duplicates.len()
        );
        let mut wasted = 0u64;
        for (name, copies) in &duplicates {
            let _ = writeln!(out, "'{name}' - {} copies:", copies.len());
            for (i, store) in copies.iter().enumerate() {
                let age = if i == 0 {
                    "newest".to_string()
                } else {
                    format!("#{}", i + 1)
                };
                let _ = writeln!(
                    out,
                    "  {age:8} | {} | created {} | {} | {} docs",
                    store.name,
                    store.create_time,
                    format_size(store.size_bytes),
                    store.active_documents_count
                );
                if i > 0 {
                    wasted += store.size_bytes;
                }
            }
        }
        let _ = writeln!(out, "Wasted storage from duplicates: {}", format_size(wasted));
        let _ = writeln!(out, "Run cleanup-duplicates to remove them");
        out.push('\n');
    }

    let with_failures: Vec<&Store> = stores
        .iter()
        .filter(|s| s.failed_documents_count > 0)
        .collect();
    if !with_failures.is_empty() {
        let _ = writeln!(out, "STORES WITH FAILED DOCUMENTS: {}", with_failures.len());
        for store in &with_failures {
            let _ = writeln!(
                out,
                "  {} ({}) failed: {} active: {}",
                store.display_name,
                store.name,
                store.failed_documents_count,
                store.active_documents_count
            );
        }
        out.push('\n');
    }

    if verbose {
        let _ = writeln!(out, "ALL STORES (detailed)");
        for (name, copies) in &groups {
            for store in copies {
                let _ = writeln!(out, "{name}");
                let _ = writeln!(out, "  Name:          {}", store.name);
                let _ = writeln!(out, "  Created:       {}", store.create_time);
                let _ = writeln!(out, "  Size:          {}", format_size(store.size_bytes));
                let _ = writeln!(out, "  Active docs:   {}", store.active_documents_count);
                let _ = writeln!(out, "  Pending docs:  {}", store.pending_documents_count);
                let _ = writeln!(out, "  Failed docs:   {}", store.failed_documents_count);
            }
        }
        out.push('\n');
    }

    let _ = writeln!(out, "RECOMMENDATIONS");
    if !duplicates.is_empty() {
        let _ = writeln!(out, "- Run cleanup-duplicates to remove duplicate stores");
    }
    if !with_failures.is_empty() {
        let _ = writeln!(out, "- Investigate failed documents and consider re-indexing");
    }
    if total_size > 20 * GIB {
        let _ = writeln!(
            out,
            "- Total storage > 20 GB, consider splitting stores for latency"
        );
    }
    if duplicates.is_empty() && with_failures.is_empty() {
        let _ = writeln!(out, "- All stores look healthy");
    }
    out
}

/// Fetches the store collection and renders the audit report.
pub async fn audit<C>(client: &C, verbose: bool) -> Result<String, StoreError>
where
    C: StoreClient,
{
    info!("Fetching all file search stores for audit");
    let stores = client.list_stores().await?;
    Ok(build_report(&stores, verbose))
}
