use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use journal::{JournalError, TradeFilter, TradeForm, TradeImages};
use models::{Catalog, Profile};
use remote_store::ImageUpload;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    error::ApiError,
    extract::ApiJson,
    state::{bearer_token, AdminSession, AppState},
    Result,
};

pub const DELETE_PASSWORD_HEADER: &str = "x-delete-password";

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "trade-journal-api"
    }))
}

/// GET /api/catalog
/// Option lists and defaults for the new-trade form
pub async fn get_catalog() -> impl IntoResponse {
    Json(json!({
        "catalog": Catalog::standard(),
        "defaults": TradeForm::default(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/login
pub async fn login(State(state): State<AppState>, ApiJson(req): ApiJson<LoginRequest>) -> Result<impl IntoResponse> {
    match state.auth.login(&req.password).await {
        Some(token) => Ok(Json(json!({ "token": token }))),
        None => Err(ApiError::Unauthorized("Invalid Credentials".to_string())),
    }
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, session: AdminSession) -> impl IntoResponse {
    state.auth.logout(&session.token).await;
    Json(json!({ "status": "success" }))
}

/// GET /api/auth/session
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let is_admin = match bearer_token(&headers) {
        Some(token) => state.auth.is_admin(token).await,
        None => false,
    };
    Json(json!({ "isAdmin": is_admin }))
}

/// GET /api/jsonbin/data
/// Whole document from the primary store, as stored
pub async fn get_store_data(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.journal.raw_document().await)
}

/// PUT /api/jsonbin/data
/// Replaces the whole document in the primary store with the request body
pub async fn put_store_data(
    _admin: AdminSession,
    State(state): State<AppState>,
    ApiJson(document): ApiJson<Value>,
) -> Result<impl IntoResponse> {
    state.journal.replace_document(document).await?;
    Ok(Json(json!({ "status": "success" })))
}

#[derive(Debug, Deserialize)]
pub struct TradeQuery {
    pub category: Option<String>,
    pub outcome: Option<String>,
    pub instrument: Option<String>,
}

/// GET /api/trades?category=&outcome=&instrument=
pub async fn list_trades(State(state): State<AppState>, Query(query): Query<TradeQuery>) -> impl IntoResponse {
    let filter = TradeFilter::from_params(
        query.category.as_deref(),
        query.outcome.as_deref(),
        query.instrument.as_deref(),
    );
    let trades = state.journal.list_trades(&filter).await;
    Json(json!({
        "count": trades.len(),
        "trades": trades,
    }))
}

/// GET /api/trades/:id
pub async fn get_trade(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    Ok(Json(state.journal.get_trade(&id).await?))
}

/// POST /api/trades
/// Multipart form: text fields for the trade, optional `imageBefore` / `imageAfter` files
pub async fn create_trade(
    _admin: AdminSession,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut form = TradeForm::default();
    let mut images = TradeImages::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "imageBefore" | "imageAfter" => {
                let upload = read_image(field).await?;
                if name == "imageBefore" {
                    images.before = upload;
                } else {
                    images.after = upload;
                }
            }
            _ => {
                let value = field.text().await?;
                if !form.set_field(&name, value) {
                    warn!(field = %name, "ignoring unknown trade form field");
                }
            }
        }
    }

    let trade = state.journal.add_trade(form, images).await?;
    Ok((StatusCode::CREATED, Json(trade)))
}

/// DELETE /api/trades/:id
/// Requires an admin session and the delete password in `X-Delete-Password`
pub async fn delete_trade(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let password = headers
        .get(DELETE_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !state.auth.verify_delete_password(password) {
        return Err(ApiError::Forbidden("Incorrect password. Trade not deleted.".to_string()));
    }

    if state.journal.delete_trade(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::TradeNotFound(id))
    }
}

/// GET /api/profile
pub async fn get_profile(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.journal.profile().await)
}

/// PUT /api/profile
pub async fn put_profile(
    _admin: AdminSession,
    State(state): State<AppState>,
    ApiJson(profile): ApiJson<Profile>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.journal.update_profile(profile).await?))
}

/// POST /api/profile/photo
/// Multipart form with a single `file` field
pub async fn upload_profile_photo(
    _admin: AdminSession,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        if let Some(upload) = read_image(field).await? {
            let profile = state.journal.set_profile_photo(upload).await?;
            return Ok(Json(profile));
        }
    }
    Err(ApiError::BadRequest("file is required".to_string()))
}

/// DELETE /api/profile/photo
pub async fn delete_profile_photo(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.journal.remove_profile_photo().await?))
}

/// Empty file inputs arrive as zero-length parts; treat them as "no image".
async fn read_image(field: axum::extract::multipart::Field<'_>) -> Result<Option<ImageUpload>> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await?;
    if bytes.is_empty() {
        return Ok(None);
    }
    let mut upload = ImageUpload::new(file_name, bytes.to_vec());
    upload.content_type = content_type;
    Ok(Some(upload))
}

// ============================================
// Legacy file-backed endpoints
// ============================================

/// GET /api/data
pub async fn get_legacy_data(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.legacy.raw_document().await)
}

/// POST /api/data
pub async fn post_legacy_data(
    State(state): State<AppState>,
    ApiJson(document): ApiJson<Value>,
) -> Result<impl IntoResponse> {
    state
        .legacy
        .replace_document(document)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save data: {}", e)))?;
    Ok(Json(json!({ "status": "success" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreImageRequest {
    pub image_url: Option<String>,
    pub trade_id: Option<String>,
}

/// POST /store/image
/// Attach an image URL to a trade, or record it as a new image-only entry
pub async fn store_image(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<StoreImageRequest>,
) -> Result<impl IntoResponse> {
    let image_url = req
        .image_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("imageUrl is required".to_string()))?;

    let data = state
        .legacy
        .store_image_url(&image_url, req.trade_id.as_deref().filter(|id| !id.is_empty()))
        .await
        .map_err(|e| match e {
            JournalError::TradeNotFound(_) => ApiError::NotFound("Trade not found".to_string()),
            other => other.into(),
        })?;
    info!(trade_id = ?req.trade_id, "image URL stored");

    Ok(Json(json!({
        "status": "success",
        "message": "Image URL stored successfully",
        "data": data,
    })))
}
