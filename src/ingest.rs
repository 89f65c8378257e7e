// src/ingest.rs
use crate::db::ListingStore;
use crate::domain::Listing;
use crate::errors::Result;
use crate::scraper::ScrapedRow;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub fetched: usize,
    /// Unreadable rows, or rows missing an id, address, postal code or price.
    pub invalid: usize,
    /// Rows already stored, or repeated within this scrape.
    pub duplicates: usize,
    pub inserted: usize,
}

/// Dedup gate: stores the rows whose id has not been seen before.
pub fn ingest_rows(store: &mut dyn ListingStore, rows: &[ScrapedRow]) -> Result<IngestReport> {
    let mut seen = store.load_known_ids()?;
    log::info!("{} listings already known", seen.len());

    let mut report = IngestReport {
        fetched: rows.len(),
        ..Default::default()
    };

    let mut fresh = Vec::new();
    for row in rows {
        let listing = match Listing::from_scraped_row(row) {
            Ok(l) => l,
            Err(e) => {
                log::warn!("Skipping row: {e}");
                report.invalid += 1;
                continue;
            }
        };

        if seen.insert(listing.id.clone()) {
            fresh.push(listing);
        } else {
            report.duplicates += 1;
        }
    }

    report.inserted = store.append_new(&fresh)?;
    log::info!(
        "Ingested {} new listing(s) out of {} scraped ({} known, {} invalid)",
        report.inserted,
        report.fetched,
        report.duplicates,
        report.invalid
    );
    Ok(report)
}

