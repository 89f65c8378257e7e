//! Outbox dispatch.
//!
//! Each unsent listing is announced with a map when possible and as plain
//! text otherwise. A listing is marked sent right after its own delivery,
//! so a crash re-sends at most the listing that was in flight.

use crate::db::ListingStore;
use crate::domain::{Listing, StoredListing};
use crate::errors::{EnrichmentError, Result, TransportError};
use crate::geos::MapFraming;
use crate::notifier::caption::format_caption;
use crate::notifier::{ChatTransport, Geocoder, MapRenderer};

/// How a single listing ended up being announced.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// Map image with caption.
    WithMap,
    /// Caption only; the map could not be produced or sent.
    TextOnly(EnrichmentError),
    /// Nothing reached the chat. The listing stays in the outbox.
    Failed(TransportError),
}

impl DeliveryOutcome {
    pub fn delivered(&self) -> bool {
        !matches!(self, DeliveryOutcome::Failed(_))
    }
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Listings picked for this run.
    pub selected: usize,
    /// Unsent listings left for a later run because of `max_batch`.
    pub deferred: usize,
    /// Per listing id, in dispatch order.
    pub outcomes: Vec<(String, DeliveryOutcome)>,
}

impl DispatchReport {
    pub fn with_map(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::WithMap))
    }

    pub fn text_only(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::TextOnly(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&DeliveryOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

pub struct Dispatcher<'a> {
    geocoder: &'a dyn Geocoder,
    renderer: &'a dyn MapRenderer,
    chat: &'a dyn ChatTransport,
    framing: MapFraming,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        geocoder: &'a dyn Geocoder,
        renderer: &'a dyn MapRenderer,
        chat: &'a dyn ChatTransport,
        framing: MapFraming,
    ) -> Self {
        Self {
            geocoder,
            renderer,
            chat,
            framing,
        }
    }

    /// Announces up to `max_batch` unsent listings, oldest first.
    ///
    /// Transport failures are recorded per listing and never stop the batch.
    /// A store failure aborts the run; the listing being processed then
    /// stays unsent and is retried next time.
    pub fn dispatch_pending(
        &self,
        store: &mut dyn ListingStore,
        max_batch: usize,
    ) -> Result<DispatchReport> {
        let mut batch: Vec<StoredListing> = store.pending()?;
        let deferred = batch.len().saturating_sub(max_batch);
        batch.truncate(max_batch);

        let mut report = DispatchReport {
            selected: batch.len(),
            deferred,
            outcomes: Vec::with_capacity(batch.len()),
        };

        if batch.is_empty() {
            log::info!("No new listings to announce");
            return Ok(report);
        }
        log::info!(
            "Announcing {} listing(s), {} deferred to a later run",
            report.selected,
            report.deferred
        );

        for stored in &batch {
            debug_assert!(!stored.notification_sent);
            let listing = &stored.listing;
            log::info!(
                "📨 Sending #{} {} (first seen {})",
                stored.seq,
                listing.id,
                stored.first_seen_at
            );

            let outcome = self.deliver(listing);
            match &outcome {
                DeliveryOutcome::WithMap => {
                    log::info!("✅ Sent {} with map", listing.id);
                }
                DeliveryOutcome::TextOnly(reason) => {
                    log::warn!("Sent {} without map: {reason}", listing.id);
                }
                DeliveryOutcome::Failed(e) => {
                    log::error!("❌ Could not send {}: {e}", listing.id);
                }
            }

            if outcome.delivered() {
                store.mark_sent(&listing.id)?;
            }
            report.outcomes.push((listing.id.clone(), outcome));
        }

        Ok(report)
    }

    /// Tries the map first, then falls back to the bare caption.
    pub fn deliver(&self, listing: &Listing) -> DeliveryOutcome {
        let caption = format_caption(listing);

        match self.send_with_map(listing, &caption) {
            Ok(()) => DeliveryOutcome::WithMap,
            Err(reason) => match self.chat.send_text(&caption) {
                Ok(()) => DeliveryOutcome::TextOnly(reason),
                Err(e) => DeliveryOutcome::Failed(e),
            },
        }
    }

    fn send_with_map(
        &self,
        listing: &Listing,
        caption: &str,
    ) -> std::result::Result<(), EnrichmentError> {
        let marker = self
            .geocoder
            .resolve(&listing.address, &listing.postal_code)
            .map_err(EnrichmentError::Geocode)?
            .ok_or(EnrichmentError::NoCoordinates)?;

        let viewport = self.framing.frame(marker);
        log::debug!(
            "Framing {} at zoom {:.2} ({}x{})",
            listing.id,
            viewport.zoom,
            viewport.width_px,
            viewport.height_px
        );

        let image = self
            .renderer
            .render(&viewport)
            .map_err(EnrichmentError::Render)?;

        self.chat
            .send_photo(&image, caption)
            .map_err(EnrichmentError::Photo)
    }
}
