use async_trait::async_trait;
use models::StoreDocument;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::{DocumentStore, ImageHost, ImageUpload};

/// In-process document store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    document: RwLock<Value>,
    saves: AtomicUsize,
    fail_fetches: AtomicBool,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new(document: StoreDocument) -> Self {
        Self::from_value(serde_json::to_value(document).unwrap_or_default())
    }

    pub fn from_value(document: Value) -> Self {
        Self {
            document: RwLock::new(document),
            ..Default::default()
        }
    }

    /// The held document as typed data; empty if it does not parse.
    pub async fn snapshot(&self) -> StoreDocument {
        serde_json::from_value(self.raw_snapshot().await).unwrap_or_default()
    }

    pub async fn raw_snapshot(&self) -> Value {
        self.document.read().await.clone()
    }

    /// Number of successful saves so far.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    fn unavailable() -> StoreError {
        StoreError::Upstream {
            service: "memory",
            status: 503,
            message: "store unavailable".to_string(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_raw(&self) -> Result<Value> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self.raw_snapshot().await)
    }

    async fn save_raw(&self, document: &Value) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        *self.document.write().await = document.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Image host that keeps nothing and hands back `memory://` URLs.
#[derive(Default)]
pub struct MemoryImageHost {
    uploads: AtomicUsize,
    fail: AtomicBool,
}

impl MemoryImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageHost for MemoryImageHost {
    async fn upload(&self, image: ImageUpload) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Upstream {
                service: "memory",
                status: 400,
                message: "Upload failed: Unknown error".to_string(),
            });
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("memory://{}/{}", n, image.file_name))
    }
}
