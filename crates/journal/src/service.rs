//! Read-modify-write over the whole store document.
//!
//! Every mutation fetches the full document, changes it in memory and writes
//! it back. There is no version check, so concurrent writers race and the last
//! one wins.

use chrono::{SecondsFormat, Utc};
use models::{Profile, StoreDocument, Trade};
use remote_store::{trade_count, DocumentStore, ImageHost, ImageUpload};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{JournalError, Result};
use crate::filter::TradeFilter;
use crate::form::TradeForm;

/// Optional chart screenshots sent with a new trade.
#[derive(Debug, Clone, Default)]
pub struct TradeImages {
    pub before: Option<ImageUpload>,
    pub after: Option<ImageUpload>,
}

pub struct TradeJournal {
    store: Arc<dyn DocumentStore>,
    images: Arc<dyn ImageHost>,
    default_profile_name: String,
}

impl TradeJournal {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        images: Arc<dyn ImageHost>,
        default_profile_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            images,
            default_profile_name: default_profile_name.into(),
        }
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// Fetch for mutation: errors propagate so a failed read never turns into
    /// an overwrite with an empty document.
    async fn load(&self) -> Result<StoreDocument> {
        let document = self.store.fetch().await?;
        Ok(document.with_default_profile(&self.default_profile_name))
    }

    async fn persist(&self, document: &StoreDocument) -> Result<()> {
        self.store.save(document).await?;
        Ok(())
    }

    /// Fetch for display. A failed read falls back to an empty document.
    pub async fn document(&self) -> StoreDocument {
        match self.load().await {
            Ok(document) => {
                info!(store = self.store_name(), trades = document.trades.len(), "loaded trades");
                document
            }
            Err(e) => {
                warn!(store = self.store_name(), error = %e, "returning empty state as fallback");
                StoreDocument::empty(&self.default_profile_name)
            }
        }
    }

    /// The document exactly as stored, for the whole-document endpoints.
    /// A failed read falls back to an empty document.
    pub async fn raw_document(&self) -> Value {
        match self.store.fetch_raw().await {
            Ok(document) => {
                info!(store = self.store_name(), trades = trade_count(&document), "loaded document");
                document
            }
            Err(e) => {
                warn!(store = self.store_name(), error = %e, "returning empty state as fallback");
                serde_json::to_value(StoreDocument::empty(&self.default_profile_name)).unwrap_or_default()
            }
        }
    }

    /// Overwrite the whole document with whatever JSON the client sent.
    pub async fn replace_document(&self, document: Value) -> Result<()> {
        self.store.save_raw(&document).await?;
        info!(store = self.store_name(), trades = trade_count(&document), "document replaced");
        Ok(())
    }

    pub async fn list_trades(&self, filter: &TradeFilter) -> Vec<Trade> {
        let trades = self.document().await.trades;
        if filter.is_unfiltered() {
            return trades;
        }
        debug!(?filter, "filtering trades");
        filter.apply_owned(trades)
    }

    pub async fn get_trade(&self, id: &str) -> Result<Trade> {
        self.load()
            .await?
            .find_trade(id)
            .cloned()
            .ok_or_else(|| JournalError::TradeNotFound(id.to_string()))
    }

    /// Upload images, then prepend the new trade and write the document.
    ///
    /// A failed upload leaves that image field null. If the final write fails
    /// the uploaded images stay orphaned on the image host.
    pub async fn add_trade(&self, form: TradeForm, images: TradeImages) -> Result<Trade> {
        form.validate()?;

        let image_before = self.try_upload(images.before, "before").await;
        let image_after = self.try_upload(images.after, "after").await;
        if image_before.is_none() {
            info!("logging trade without a 'before' image");
        }

        let mut document = self.load().await?;
        let id = next_trade_id(&document, Utc::now().timestamp_millis());
        let date = Utc::now().format("%Y-%m-%d").to_string();
        let trade = form.into_trade(id, date, image_before, image_after);

        document.trades.insert(0, trade.clone());
        if let Err(e) = self.persist(&document).await {
            let orphans: Vec<&str> = [trade.image_before(), trade.image_after()]
                .into_iter()
                .flatten()
                .collect();
            if !orphans.is_empty() {
                warn!(?orphans, "save failed after upload; images are orphaned");
            }
            return Err(e);
        }

        info!(id = %trade.id, instrument = %trade.instrument(), "trade logged");
        Ok(trade)
    }

    async fn try_upload(&self, image: Option<ImageUpload>, which: &str) -> Option<String> {
        let image = image?;
        match self.images.upload(image).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(image = which, error = %e, "image upload failed; trade will be logged without it");
                None
            }
        }
    }

    /// Removes the first trade with `id`. Returns false, without writing, when
    /// there is no such trade.
    pub async fn delete_trade(&self, id: &str) -> Result<bool> {
        let mut document = self.load().await?;
        let Some(pos) = document.trades.iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        document.trades.remove(pos);
        self.persist(&document).await?;
        info!(%id, "trade deleted");
        Ok(true)
    }

    pub async fn profile(&self) -> Profile {
        self.document().await.profile.unwrap_or_else(|| Profile::named(&self.default_profile_name))
    }

    pub async fn update_profile(&self, profile: Profile) -> Result<Profile> {
        let mut document = self.load().await?;
        document.profile = Some(profile.clone());
        self.persist(&document).await?;
        Ok(profile)
    }

    /// Upload a new profile photo. Unlike trade images, a failed upload is an error.
    pub async fn set_profile_photo(&self, image: ImageUpload) -> Result<Profile> {
        let url = self.images.upload(image).await?;
        let mut document = self.load().await?;
        let mut profile = document.profile.take().unwrap_or_default();
        profile.photo = Some(url);
        document.profile = Some(profile.clone());
        self.persist(&document).await?;
        info!("profile photo updated");
        Ok(profile)
    }

    pub async fn remove_profile_photo(&self) -> Result<Profile> {
        let mut document = self.load().await?;
        let mut profile = document.profile.take().unwrap_or_default();
        profile.photo = None;
        document.profile = Some(profile.clone());
        self.persist(&document).await?;
        Ok(profile)
    }

    /// Record an already-hosted image URL.
    ///
    /// With a trade id, the URL becomes that trade's `imageBefore`. Without
    /// one, a new image-only entry is prepended.
    pub async fn store_image_url(&self, image_url: &str, trade_id: Option<&str>) -> Result<StoreDocument> {
        let mut document = self.load().await?;

        match trade_id {
            Some(id) => {
                let trade = document
                    .trades
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| JournalError::TradeNotFound(id.to_string()))?;
                trade.image_before = Some(Some(image_url.to_string()));
            }
            None => {
                let now = Utc::now();
                let entry = Trade {
                    id: next_trade_id(&document, now.timestamp_millis()),
                    image_url: Some(image_url.to_string()),
                    timestamp: Some(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
                    ..Default::default()
                };
                document.trades.insert(0, entry);
            }
        }

        self.persist(&document).await?;
        Ok(document)
    }
}

/// Epoch milliseconds as the id, bumped until it is unused in `document`.
fn next_trade_id(document: &StoreDocument, now_millis: i64) -> String {
    let mut candidate = now_millis;
    while document.contains_id(&candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}
