// src/config.rs

//! TOML configuration with defaults for every section.
//!
//! ```toml
//! database_path = "db/listings.db"
//!
//! [ingest]
//! command = ["python", "scrape.py"]   # or: input = "listings.json"
//!
//! [notify]
//! max_batch = 1
//!
//! [telegram]
//! api_key = "..."
//! chat_id = "-100123456"
//!
//! [geoapify]
//! api_key = "..."
//!
//! [map]
//! max_zoom = 11.5
//! center = { lat = 52.368418, lon = 4.890339 }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{AppError, Result};
use crate::geos::MapFraming;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    pub ingest: IngestConfig,
    pub notify: NotifyConfig,
    pub telegram: TelegramConfig,
    pub geoapify: GeoapifyConfig,
    pub map: MapFraming,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("db/listings.db"),
            ingest: IngestConfig::default(),
            notify: NotifyConfig::default(),
            telegram: TelegramConfig::default(),
            geoapify: GeoapifyConfig::default(),
            map: MapFraming::default(),
        }
    }
}

/// Where scraped rows come from. `input` wins when both are set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// JSON array exported by the scraper.
    pub input: Option<PathBuf>,
    /// Scraper program printing a JSON array on stdout.
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Listings announced per run.
    pub max_batch: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { max_batch: 1 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_base: String,
    pub api_key: String,
    pub chat_id: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            api_key: String::new(),
            chat_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeoapifyConfig {
    pub api_key: String,
    pub country: String,
    pub map_style: String,
    pub geocode_url: String,
    pub staticmap_url: String,
}

impl Default for GeoapifyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            country: "Netherlands".to_string(),
            map_style: "maptiler-3d".to_string(),
            geocode_url: "https://api.geoapify.com/v1/geocode/search".to_string(),
            staticmap_url: "https://maps.geoapify.com/v1/staticmap".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from `path`, falling back to defaults only when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("No config at {}, using defaults.", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Batch size for `notify`: the command-line value if given, else `notify.max_batch`.
    pub fn batch_size(&self, cli_override: Option<usize>) -> Result<usize> {
        match cli_override {
            Some(0) => Err(AppError::config("--max-batch must be at least 1")),
            Some(n) => Ok(n),
            None => Ok(self.notify.max_batch),
        }
    }

    /// Secrets from the environment override the file.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("TELEGRAM_API_KEY") {
            self.telegram.api_key = v;
        }
        if let Some(v) = lookup("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = v;
        }
        if let Some(v) = lookup("GEOAPIFY_API_KEY") {
            self.geoapify.api_key = v;
        }
    }

    /// Checks shared by every command.
    pub fn validate(&self) -> Result<()> {
        if self.notify.max_batch == 0 {
            return Err(AppError::config("notify.max_batch must be at least 1"));
        }
        if self.map.width == 0 || self.map.height == 0 {
            return Err(AppError::config("map.width and map.height must be positive"));
        }
        if self.map.margin <= 0.0 {
            return Err(AppError::config("map.margin must be positive"));
        }
        let r = &self.map.reference;
        if r.width_px <= 0.0 || r.height_px <= 0.0 || r.width_m <= 0.0 || r.height_m <= 0.0 {
            return Err(AppError::config("map.reference sizes must be positive"));
        }
        Ok(())
    }

    /// Extra checks before talking to Telegram and Geoapify.
    pub fn validate_for_notify(&self) -> Result<()> {
        self.validate()?;
        if self.telegram.api_key.is_empty() || self.telegram.chat_id.is_empty() {
            return Err(AppError::config(
                "telegram.api_key and telegram.chat_id are required (or TELEGRAM_API_KEY / TELEGRAM_CHAT_ID)",
            ));
        }
        if self.geoapify.api_key.is_empty() {
            return Err(AppError::config(
                "geoapify.api_key is required (or GEOAPIFY_API_KEY)",
            ));
        }
        Ok(())
    }
}
