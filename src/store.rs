//! Interface to the hosted file-search-store collection.
//!
//! This module defines the [`StoreClient`] trait and the plain data types it
//! exchanges. Implementors connect to the remote API (see [`crate::client`])
//! or stand in as deterministic mocks in tests.
//!
//! All methods are async and return boxed errors, so callers decide whether
//! a failure is fatal or just accounted for.

use async_trait::async_trait;
use std::path::Path;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Error type shared by all client operations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// A remote file-search store as reported by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Store {
    /// Opaque resource name assigned by the service.
    pub name: String,
    /// Human-chosen display name; sync uses the store identity here.
    pub display_name: String,
    /// RFC 3339 creation timestamp. Lexicographic order is creation order.
    pub create_time: String,
    pub size_bytes: u64,
    pub active_documents_count: u64,
    pub pending_documents_count: u64,
    pub failed_documents_count: u64,
}

/// A long-running upload operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Opaque operation resource name.
    pub name: String,
    pub done: bool,
}

/// Async client for listing, creating, deleting and populating stores.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// List every store in the collection.
    async fn list_stores(&self) -> Result<Vec<Store>, StoreError>;

    /// Create a new store with the given display name.
    async fn create_store(&self, display_name: &str) -> Result<Store, StoreError>;

    /// Delete a store by resource name. `force` cascades to its documents.
    async fn delete_store(&self, name: &str, force: bool) -> Result<(), StoreError>;

    /// Upload one local file into a store, returning the pending operation.
    async fn upload_file(
        &self,
        store_name: &str,
        path: &Path,
        display_name: &str,
    ) -> Result<Operation, StoreError>;

    /// Refresh the state of a previously returned operation.
    async fn get_operation(&self, name: &str) -> Result<Operation, StoreError>;
}
