//! In-process stores for tests and dry runs.
//!
//! Both record every call so callers can assert on side effects, and both can
//! be switched into a failing mode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use roachwatch_core::{BlobStore, DetectionEvent, ResultStore, WatchError};
use tokio::sync::RwLock;

pub struct InMemoryBlobStore {
    base_url: String,
    blobs: RwLock<HashMap<String, Bytes>>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl InMemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            blobs: RwLock::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every later upload fail.
    pub fn fail_uploads(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Number of upload attempts, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn get(&self, blob_name: &str) -> Option<Bytes> {
        self.blobs.read().await.get(blob_name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        self.blobs.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upload(&self, blob_name: &str, data: Bytes) -> Result<String, WatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(WatchError::Blob("in-memory blob store set to fail".into()));
        }
        self.blobs.write().await.insert(blob_name.to_string(), data);
        Ok(format!("{}/{}", self.base_url, blob_name))
    }
}

#[derive(Default)]
pub struct InMemoryResultStore {
    events: RwLock<Vec<DetectionEvent>>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later append fail.
    pub fn fail_appends(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Number of append attempts, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn events(&self) -> Vec<DetectionEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, event: &DetectionEvent) -> Result<(), WatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(WatchError::Table("in-memory result store set to fail".into()));
        }
        self.events.write().await.push(event.clone());
        Ok(())
    }
}
