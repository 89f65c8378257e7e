// errors.rs
use thiserror::Error;

/// Result alias for operations that abort the current invocation.
pub type Result<T> = std::result::Result<T, AppError>;

/// Fatal errors: the current ingest or notify run cannot safely continue.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The external scraper could not produce rows.
    #[error("Listing source error: {0}")]
    Source(String),
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn scraper(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }
}

/// Failure of a remote collaborator (geocoder, map renderer, chat).
///
/// Never fatal on its own; the dispatcher decides whether to fall back
/// or leave the listing pending.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// The remote answered but refused the request (e.g. Telegram `ok: false`).
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Which step of the map-enriched delivery gave up.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("address could not be geocoded")]
    NoCoordinates,

    #[error("geocoding failed: {0}")]
    Geocode(TransportError),

    #[error("map rendering failed: {0}")]
    Render(TransportError),

    #[error("photo delivery failed: {0}")]
    Photo(TransportError),
}
