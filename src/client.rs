//! Reqwest implementation of [`StoreClient`] against the hosted
//! file-search-store REST API.
//!
//! The caller resolves the API key (see `load_config::api_key_from_env`);
//! all transport, serialization and pagination details live here.

use crate::store::{Operation, Store, StoreClient, StoreError};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, error, info};

const API_BASE: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";
const PAGE_SIZE: usize = 100;

pub struct ApiClient {
    http: reqwest::Client,
    api_key: String,
}

// The service reports int64 fields as JSON strings.
fn parse_count(raw: &Option<String>) -> u64 {
    raw.as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

#[derive(Deserialize)]
struct ApiStore {
    name: String,
    #[serde(default, rename = "displayName")]
    display_name: Option<String>,
    #[serde(default, rename = "createTime")]
    create_time: Option<String>,
    #[serde(default, rename = "sizeBytes")]
    size_bytes: Option<String>,
    #[serde(default, rename = "activeDocumentsCount")]
    active_documents_count: Option<String>,
    #[serde(default, rename = "pendingDocumentsCount")]
    pending_documents_count: Option<String>,
    #[serde(default, rename = "failedDocumentsCount")]
    failed_documents_count: Option<String>,
}

impl From<ApiStore> for Store {
    fn from(api: ApiStore) -> Self {
        Store {
            name: api.name,
            display_name: api.display_name.unwrap_or_default(),
            create_time: api.create_time.unwrap_or_default(),
            size_bytes: parse_count(&api.size_bytes),
            active_documents_count: parse_count(&api.active_documents_count),
            pending_documents_count: parse_count(&api.pending_documents_count),
            failed_documents_count: parse_count(&api.failed_documents_count),
        }
    }
}

#[derive(Deserialize)]
struct ListStoresResponse {
    #[serde(default, rename = "fileSearchStores")]
    file_search_stores: Vec<ApiStore>,
    #[serde(default, rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ApiOperation {
    name: String,
    #[serde(default)]
    done: bool,
}

impl ApiClient {
    pub fn new(api_key: String) -> Self {
        debug!("Initialized store API client");
        ApiClient {
            http: reqwest::Client::new(),
            api_key,
        }
    }

    fn url(&self, resource: &str) -> String {
        format!("{API_BASE}/{API_VERSION}/{resource}")
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            error!(status = %status, body = %body, "Store API returned error");
            Err(format!("API error {status}: {body}").into())
        }
    }
}

#[async_trait]
impl StoreClient for ApiClient {
    async fn list_stores(&self) -> Result<Vec<Store>, StoreError> {
        let mut stores = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .http
                .get(self.url("fileSearchStores"))
                .header("x-goog-api-key", &self.api_key)
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let response = Self::check(request.send().await?).await?;
            let page: ListStoresResponse = response.json().await?;
            stores.extend(page.file_search_stores.into_iter().map(Store::from));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!(count = stores.len(), "Listed file search stores");
        Ok(stores)
    }

    async fn create_store(&self, display_name: &str) -> Result<Store, StoreError> {
        info!(display_name, "Creating file search store");
        let response = self
            .http
            .post(self.url("fileSearchStores"))
            .header("x-goog-api-key", &self.api_key)
            .json(&serde_json::json!({ "displayName": display_name }))
            .send()
            .await?;
        let response = Self::check(response).await?;
        let api: ApiStore = response.json().await?;
        info!(name = %api.name, "Created file search store");
        Ok(api.into())
    }

    async fn delete_store(&self, name: &str, force: bool) -> Result<(), StoreError> {
        info!(name, force, "Deleting file search store");
        let response = self
            .http
            .delete(self.url(name))
            .header("x-goog-api-key", &self.api_key)
            .query(&[("force", force.to_string())])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn upload_file(
        &self,
        store_name: &str,
        path: &Path,
        display_name: &str,
    ) -> Result<Operation, StoreError> {
        debug!(store_name, file = %path.display(), "Uploading file to store");
        let content = tokio::fs::read(path).await?;
        let metadata = serde_json::json!({ "displayName": display_name }).to_string();
        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata).mime_str("application/json")?,
            )
            .part(
                "file",
                reqwest::multipart::Part::bytes(content).file_name(display_name.to_string()),
            );

        let url = format!(
            "{API_BASE}/upload/{API_VERSION}/{store_name}:uploadToFileSearchStore"
        );
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let api: ApiOperation = response.json().await?;
        Ok(Operation {
            name: api.name,
            done: api.done,
        })
    }

    async fn get_operation(&self, name: &str) -> Result<Operation, StoreError> {
        let response = self
            .http
            .get(self.url(name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let api: ApiOperation = response.json().await?;
        Ok(Operation {
            name: api.name,
            done: api.done,
        })
    }
}
