//! Announcing new listings: remote collaborators and the outbox dispatcher.

pub mod caption;
pub mod dispatcher;
pub mod geoapify;
pub mod telegram;

use crate::errors::TransportError;
use crate::geos::{Coordinate, Viewport};

pub use dispatcher::{DeliveryOutcome, DispatchReport, Dispatcher};
pub use geoapify::Geoapify;
pub use telegram::TelegramBot;

/// A rendered static map.
#[derive(Debug, Clone)]
pub struct MapImage {
    pub bytes: Vec<u8>,
    pub content_type: mime::Mime,
}

/// Address lookup. `Ok(None)` means the service answered with no match.
pub trait Geocoder {
    fn resolve(&self, address: &str, postal_code: &str)
        -> Result<Option<Coordinate>, TransportError>;
}

pub trait MapRenderer {
    fn render(&self, viewport: &Viewport) -> Result<MapImage, TransportError>;
}

/// Delivery into the chat channel. Neither call deduplicates.
pub trait ChatTransport {
    fn send_text(&self, text: &str) -> Result<(), TransportError>;
    fn send_photo(&self, image: &MapImage, caption: &str) -> Result<(), TransportError>;
}
