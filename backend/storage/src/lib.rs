//! Storage adapters for uploaded images and detection rows.
//!
//! The connection string selects the backend:
//! - Azure Storage (`AccountName=...;AccountKey=...` or a SAS), including Azurite
//! - a local directory (`LocalStoragePath=...`) with a SQLite results table
//!
//! `memory` holds in-process stores for tests.

pub mod azure_blob;
pub mod azure_table;
pub mod connection;
pub mod local;
pub mod memory;
pub mod shared_key;
pub mod sqlite_table;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use roachwatch_core::{BlobStore, ResultStore};
use tracing::info;

pub use azure_blob::AzureBlobStore;
pub use azure_table::AzureTableStore;
pub use connection::{AzureAccount, ConnectionStringError, Credential, StorageConnection};
pub use local::LocalBlobStore;
pub use memory::{InMemoryBlobStore, InMemoryResultStore};
pub use sqlite_table::SqliteResultStore;

/// File name of the local results database inside the storage root.
pub const LOCAL_DB_FILE: &str = "detections.db";

/// Where images and rows go.
pub struct StorageOptions<'a> {
    pub connection_string: &'a str,
    pub blob_container: &'a str,
    pub results_table: &'a str,
    /// Base URL this server is reachable on; local image links are built from it.
    pub public_url: &'a str,
}

/// The blob and table adapters opened from one connection string.
pub struct StorageBackends {
    pub blob: Arc<dyn BlobStore>,
    pub results: Arc<dyn ResultStore>,
    /// Directory of locally stored images, served under `/images`.
    pub media_dir: Option<PathBuf>,
}

/// Open the adapters selected by `opts.connection_string`.
pub fn open_backends(opts: &StorageOptions<'_>) -> Result<StorageBackends> {
    let connection = StorageConnection::parse(opts.connection_string)
        .context("Invalid storage connection string")?;

    match connection {
        StorageConnection::Azure(account) => {
            info!(
                account = %account.name,
                blob = %account.blob_endpoint,
                table = %account.table_endpoint,
                "Using Azure storage"
            );
            let http = reqwest::Client::new();
            let account = Arc::new(account);
            Ok(StorageBackends {
                blob: Arc::new(AzureBlobStore::new(http.clone(), Arc::clone(&account), opts.blob_container)),
                results: Arc::new(AzureTableStore::new(http, account, opts.results_table)),
                media_dir: None,
            })
        }
        StorageConnection::Local { root } => {
            info!(root = %root.display(), "Using local storage");
            std::fs::create_dir_all(&root)
                .with_context(|| format!("Failed to create storage root {}", root.display()))?;
            let media_dir = root.join(opts.blob_container);
            let blob = LocalBlobStore::new(&media_dir, format!("{}/images", opts.public_url));
            let results = SqliteResultStore::open(root.join(LOCAL_DB_FILE), opts.results_table)?;
            Ok(StorageBackends {
                blob: Arc::new(blob),
                results: Arc::new(results),
                media_dir: Some(media_dir),
            })
        }
    }
}
