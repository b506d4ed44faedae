//! # Settings Loader
//!
//! Centralized settings loading for the trade journal backend and its CLI tools.
//! Settings come from an optional JSON file (`settings.json` by default, or the
//! path in `JOURNAL_SETTINGS`) and are then overridden by environment variables.
//! Secrets such as the JSONBin master key are expected to come from the
//! environment (or a `.env` file) rather than the JSON file.
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use settings_loader;
//!
//! // Load settings.json (if present) and apply env overrides
//! let settings = settings_loader::load_from_env()?;
//!
//! // Load a specific file, without env overrides
//! let settings = settings_loader::load_settings("config/journal.json")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_SETTINGS_PATH: &str = "settings.json";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub jsonbin: JsonBinSettings,
    #[serde(default)]
    pub cloudinary: CloudinarySettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub legacy: LegacySettings,
    #[serde(default)]
    pub profile: ProfileSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8123
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonBinSettings {
    #[serde(default = "default_jsonbin_url")]
    pub base_url: String,
    #[serde(default)]
    pub bin_id: String,
    #[serde(default)]
    pub master_key: String,
}

fn default_jsonbin_url() -> String {
    "https://api.jsonbin.io/v3/b".to_string()
}

impl JsonBinSettings {
    /// JSONBin can only be used once both the bin id and the key are known.
    pub fn is_configured(&self) -> bool {
        !self.bin_id.trim().is_empty() && !self.master_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudinarySettings {
    #[serde(default = "default_cloudinary_url")]
    pub api_base: String,
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub upload_preset: String,
    #[serde(default = "default_folder")]
    pub folder: String,
}

fn default_cloudinary_url() -> String {
    "https://api.cloudinary.com".to_string()
}
fn default_folder() -> String {
    "Trade".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    #[serde(default = "default_delete_password")]
    pub delete_password: String,
}

fn default_admin_password() -> String {
    "admin123".to_string()
}
fn default_delete_password() -> String {
    "Gk1d#".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacySettings {
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data/store.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSettings {
    #[serde(default = "default_profile_name")]
    pub default_name: String,
}

fn default_profile_name() -> String {
    models::DEFAULT_PROFILE_NAME.to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

impl Default for JsonBinSettings {
    fn default() -> Self {
        Self { base_url: default_jsonbin_url(), bin_id: String::new(), master_key: String::new() }
    }
}

impl Default for CloudinarySettings {
    fn default() -> Self {
        Self {
            api_base: default_cloudinary_url(),
            cloud_name: String::new(),
            upload_preset: String::new(),
            folder: default_folder(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self { admin_password: default_admin_password(), delete_password: default_delete_password() }
    }
}

impl Default for LegacySettings {
    fn default() -> Self {
        Self { data_file: default_data_file() }
    }
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self { default_name: default_profile_name() }
    }
}

/// Loads settings from a JSON file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading settings file: {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("Parsing settings JSON in {}", path.display()))?;
    Ok(settings)
}

/// Loads settings from `path` when it exists, otherwise returns the defaults.
/// A file that exists but fails to parse is still an error.
pub fn load_settings_or_default<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if settings_file_exists(path) {
        load_settings(path)
    } else {
        Ok(Settings::default())
    }
}

/// Full startup load: `.env`, then the settings file, then env overrides.
pub fn load_from_env() -> Result<Settings> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let path = std::env::var("JOURNAL_SETTINGS").unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    let settings = load_settings_or_default(&path)?;
    apply_env_overrides(settings, |key| std::env::var(key).ok())
}

/// Applies environment overrides through `lookup`, so callers (and tests) can
/// supply their own variable source.
pub fn apply_env_overrides<F>(mut settings: Settings, lookup: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("HOST") {
        settings.server.host = v;
    }
    if let Some(v) = lookup("PORT") {
        settings.server.port = v
            .parse()
            .with_context(|| format!("PORT must be a valid port number, got '{}'", v))?;
    }
    if let Some(v) = lookup("JSONBIN_BASE_URL") {
        settings.jsonbin.base_url = v;
    }
    if let Some(v) = lookup("JSONBIN_BIN_ID") {
        settings.jsonbin.bin_id = v;
    }
    if let Some(v) = lookup("JSONBIN_MASTER_KEY") {
        settings.jsonbin.master_key = v;
    }
    if let Some(v) = lookup("CLOUDINARY_CLOUD_NAME") {
        settings.cloudinary.cloud_name = v;
    }
    if let Some(v) = lookup("CLOUDINARY_UPLOAD_PRESET") {
        settings.cloudinary.upload_preset = v;
    }
    if let Some(v) = lookup("CLOUDINARY_FOLDER") {
        settings.cloudinary.folder = v;
    }
    if let Some(v) = lookup("ADMIN_PASSWORD") {
        settings.auth.admin_password = v;
    }
    if let Some(v) = lookup("DELETE_PASSWORD") {
        settings.auth.delete_password = v;
    }
    if let Some(v) = lookup("LEGACY_DATA_FILE") {
        settings.legacy.data_file = PathBuf::from(v);
    }
    Ok(settings)
}

/// Checks if a settings file exists at the given path
pub fn settings_file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists() && path.as_ref().is_file()
}
