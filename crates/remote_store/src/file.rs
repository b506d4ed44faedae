use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::error::Result;
use crate::{trade_count, DocumentStore};

/// Legacy local store: the whole document in one JSON file (`data/store.json`).
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// What a file that does not exist yet reads as.
    fn fallback() -> Value {
        json!({ "trades": [], "profile": {} })
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    /// A missing file reads as an empty document. Anything else that stops
    /// the file from being read or parsed is an error, so a write can never
    /// replace a damaged file with the fallback.
    async fn fetch_raw(&self) -> Result<Value> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store file missing; reading as empty");
                return Ok(Self::fallback());
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "error reading store");
                return Err(e.into());
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            error!(path = %self.path.display(), error = %e, "error parsing store");
            e.into()
        })
    }

    async fn save_raw(&self, document: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // 4-space indentation, matching the files the old server wrote
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document.serialize(&mut ser)?;

        tokio::fs::write(&self.path, buf).await?;
        debug!(path = %self.path.display(), trades = trade_count(document), "store written");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
