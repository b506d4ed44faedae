pub mod cloudinary;
pub mod error;
pub mod file;
pub mod jsonbin;
pub mod memory;

#[cfg(test)]
mod test_support;

use async_trait::async_trait;
use models::StoreDocument;
use serde_json::Value;

pub use cloudinary::{CloudinaryConfig, CloudinaryHost};
pub use error::{Result, StoreError};
pub use file::FileStore;
pub use jsonbin::{JsonBinConfig, JsonBinStore};
pub use memory::{MemoryImageHost, MemoryStore};

/// Whole-document persistence.
///
/// There is no partial update and no version check: a save replaces whatever
/// the backend currently holds. The raw methods move the document exactly as
/// stored; the typed ones go through [`StoreDocument`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch_raw(&self) -> Result<Value>;
    async fn save_raw(&self, document: &Value) -> Result<()>;
    /// Short label for logs.
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<StoreDocument> {
        Ok(serde_json::from_value(self.fetch_raw().await?)?)
    }

    async fn save(&self, document: &StoreDocument) -> Result<()> {
        self.save_raw(&serde_json::to_value(document)?).await
    }
}

/// Number of entries in a raw document's `trades` array.
pub fn trade_count(document: &Value) -> usize {
    document.get("trades").and_then(Value::as_array).map_or(0, Vec::len)
}

/// An image file received from a client, ready to be forwarded to an image host.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Hosted image storage. Returns the public URL of the stored image.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<String>;
}

/// Image host used when no Cloudinary account is configured. Every upload fails.
pub struct UnconfiguredImageHost;

#[async_trait]
impl ImageHost for UnconfiguredImageHost {
    async fn upload(&self, _image: ImageUpload) -> Result<String> {
        Err(StoreError::NotConfigured("Cloudinary"))
    }
}
