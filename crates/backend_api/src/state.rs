use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use journal::{AuthGate, TradeJournal};
use remote_store::{
    CloudinaryConfig, CloudinaryHost, DocumentStore, FileStore, ImageHost, JsonBinConfig,
    JsonBinStore, UnconfiguredImageHost,
};
use settings_loader::Settings;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ApiError;

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    /// Primary journal, backed by JSONBin when configured.
    pub journal: Arc<TradeJournal>,
    /// Journal over the local `data/store.json`, used by the legacy endpoints.
    pub legacy: Arc<TradeJournal>,
    pub auth: Arc<AuthGate>,
}

impl AppState {
    pub fn new(journal: Arc<TradeJournal>, legacy: Arc<TradeJournal>, auth: Arc<AuthGate>) -> Self {
        Self { journal, legacy, auth }
    }

    /// Wire up stores, image host and auth gate from settings.
    ///
    /// Without JSONBin credentials the primary journal falls back to the
    /// legacy file; without a Cloudinary preset every upload fails.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let legacy_store: Arc<dyn DocumentStore> = Arc::new(FileStore::new(&settings.legacy.data_file));

        let primary_store: Arc<dyn DocumentStore> = if settings.jsonbin.is_configured() {
            info!(bin_id = %settings.jsonbin.bin_id, "using JSONBin document store");
            Arc::new(JsonBinStore::new(JsonBinConfig {
                base_url: settings.jsonbin.base_url.clone(),
                bin_id: settings.jsonbin.bin_id.clone(),
                master_key: settings.jsonbin.master_key.clone(),
            })?)
        } else {
            warn!(
                path = %settings.legacy.data_file.display(),
                "JSONBIN_BIN_ID / JSONBIN_MASTER_KEY not set; serving the local store file instead"
            );
            legacy_store.clone()
        };

        let images: Arc<dyn ImageHost> = match CloudinaryHost::new(CloudinaryConfig {
            api_base: settings.cloudinary.api_base.clone(),
            cloud_name: settings.cloudinary.cloud_name.clone(),
            upload_preset: settings.cloudinary.upload_preset.clone(),
            folder: settings.cloudinary.folder.clone(),
        }) {
            Ok(host) => Arc::new(host),
            Err(e) => {
                warn!(error = %e, "image uploads disabled");
                Arc::new(UnconfiguredImageHost)
            }
        };

        let name = &settings.profile.default_name;
        Ok(Self::new(
            Arc::new(TradeJournal::new(primary_store, images.clone(), name)),
            Arc::new(TradeJournal::new(legacy_store, images, name)),
            Arc::new(AuthGate::new(
                &settings.auth.admin_password,
                &settings.auth.delete_password,
            )),
        ))
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extractor that only succeeds for requests carrying a live admin session.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Admin login required".to_string()))?;
        if !state.auth.is_admin(token).await {
            return Err(ApiError::Unauthorized("Session expired or invalid".to_string()));
        }
        Ok(AdminSession {
            token: token.to_string(),
        })
    }
}
