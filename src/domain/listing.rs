// src/domain/listing.rs

use crate::scraper::models::{parse_int, ScrapedRow};
use chrono::NaiveDateTime;

/// A real-estate ad as we store and announce it.
///
/// Built from a scraped row; this is the anti-corruption layer between the
/// scraper's loose export and the `listings` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    /// Source URL; the natural key.
    pub id: String,
    pub address: String,
    pub postal_code: String,
    /// Asking price in euros.
    pub price: i64,
    /// Square metres.
    pub living_area: Option<i64>,
    pub room_count: Option<i64>,
    pub bedroom_count: Option<i64>,
    pub energy_label: Option<String>,
    pub year_built: Option<i64>,
}

/// A listing row read back from the store.
#[derive(Debug, Clone)]
pub struct StoredListing {
    pub seq: i64,
    pub listing: Listing,
    pub first_seen_at: NaiveDateTime,
    pub notification_sent: bool,
}

impl Listing {
    /// Validates the fields needed to identify and announce a listing.
    pub fn from_scraped_row(row: &ScrapedRow) -> Result<Self, String> {
        if let Some(reason) = &row.rejected {
            return Err(reason.clone());
        }

        let required = |value: Option<&str>, what: &str| {
            value
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| format!("Missing or empty {what}"))
        };

        let id = required(row.listing_url(), "url")?;
        let address = required(row.address.as_deref(), "address")?;
        let postal_code = required(row.postal_code.as_deref(), "postal code")?;

        let price = row
            .price
            .as_ref()
            .and_then(parse_int)
            .ok_or_else(|| format!("Missing or unreadable price for {id}"))?;

        let int = |v: &Option<serde_json::Value>| v.as_ref().and_then(parse_int);

        Ok(Listing {
            id,
            address,
            postal_code,
            price,
            living_area: int(&row.living_area),
            room_count: int(&row.room),
            bedroom_count: int(&row.bedroom),
            energy_label: row
                .energy_label
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            year_built: int(&row.year_built),
        })
    }
}
