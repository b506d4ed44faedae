use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::{trade_count, DocumentStore};

const SERVICE: &str = "JSONBin";
const MASTER_KEY_HEADER: &str = "X-Master-Key";

/// Connection details for one JSONBin bin.
#[derive(Debug, Clone)]
pub struct JsonBinConfig {
    pub base_url: String,
    pub bin_id: String,
    pub master_key: String,
}

/// Document store backed by a single JSONBin bin.
///
/// Reads hit `GET {base}/{bin}/latest` and unwrap the `record` field; writes
/// `PUT {base}/{bin}` with the full document as the body.
#[derive(Debug, Clone)]
pub struct JsonBinStore {
    http: Client,
    latest_url: Url,
    bin_url: Url,
}

#[derive(Debug, Deserialize)]
struct BinEnvelope {
    #[serde(default)]
    record: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct BinErrorBody {
    message: Option<String>,
}

impl JsonBinStore {
    pub fn new(config: JsonBinConfig) -> Result<Self> {
        if config.bin_id.trim().is_empty() || config.master_key.trim().is_empty() {
            return Err(StoreError::NotConfigured(SERVICE));
        }

        let base = config.base_url.trim_end_matches('/');
        let bin_url = format!("{}/{}", base, config.bin_id);
        let latest_url = format!("{}/latest", bin_url);

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.master_key)
            .map_err(|_| StoreError::NotConfigured(SERVICE))?;
        headers.insert(MASTER_KEY_HEADER, key);

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            latest_url: Url::parse(&latest_url).map_err(|_| StoreError::InvalidUrl(latest_url.clone()))?,
            bin_url: Url::parse(&bin_url).map_err(|_| StoreError::InvalidUrl(bin_url.clone()))?,
        })
    }
}

#[async_trait]
impl DocumentStore for JsonBinStore {
    async fn fetch_raw(&self) -> Result<Value> {
        debug!(url = %self.latest_url, "fetching document from JSONBin");
        let response = self.http.get(self.latest_url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }

        let envelope: BinEnvelope = response.json().await?;
        let document = envelope
            .record
            .filter(|record| !record.is_null())
            .unwrap_or_else(|| json!({}));
        info!(trades = trade_count(&document), "fetched document from JSONBin");
        Ok(document)
    }

    async fn save_raw(&self, document: &Value) -> Result<()> {
        debug!(url = %self.bin_url, trades = trade_count(document), "saving document to JSONBin");
        let response = self.http.put(self.bin_url.clone()).json(document).send().await?;
        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }
        info!(trades = trade_count(document), "saved document to JSONBin");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "jsonbin"
    }
}

async fn upstream_error(response: Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<BinErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
    StoreError::Upstream {
        service: SERVICE,
        status: status.as_u16(),
        message,
    }
}
