use crate::db::connection::Database;
use crate::domain::Listing;
use crate::errors::TransportError;
use crate::geos::{Coordinate, Viewport};
use crate::notifier::{ChatTransport, Geocoder, MapImage, MapRenderer};
use crate::scraper::ScrapedRow;
use serde_json::json;
use std::cell::{Cell, RefCell};

/// Fresh in-memory store; tables are created on first append.
pub fn init_test_db() -> Database {
    Database::open_in_memory().unwrap_or_else(|e| panic!("Database initialization failed: {e}"))
}

pub fn listing(n: usize) -> Listing {
    Listing {
        id: format!("https://www.funda.nl/koop/amsterdam/huis-{n}/"),
        address: format!("Prinsengracht {n}"),
        postal_code: "1015 DZ".to_string(),
        price: 350_000 + n as i64 * 1_000,
        living_area: Some(70),
        room_count: Some(3),
        bedroom_count: Some(2),
        energy_label: Some("A".to_string()),
        year_built: Some(1930),
    }
}

pub fn row(n: usize) -> ScrapedRow {
    serde_json::from_value(json!({
        "url": format!("https://www.funda.nl/koop/amsterdam/huis-{n}/"),
        "address": format!("Prinsengracht {n}"),
        "zip_code": "1015 DZ",
        "price": "€ 350.000 k.k.",
        "living_area": "70 m²",
        "room": "3 kamers (2 slaapkamers)",
        "bedroom": 2,
        "energy_label": "A",
        "year": "1930"
    }))
    .unwrap()
}

pub fn api_down() -> TransportError {
    TransportError::Api {
        status: 503,
        body: "service unavailable".to_string(),
    }
}

/// Resolves every address to a point near the Westerkerk, unless told to
/// find nothing (`miss`) or to be down (`fail`).
#[derive(Default)]
pub struct FakeGeocoder {
    pub miss: bool,
    pub fail: bool,
    pub calls: Cell<usize>,
}

pub const WESTERKERK: Coordinate = Coordinate::new(52.3745, 4.8840);

impl Geocoder for FakeGeocoder {
    fn resolve(
        &self,
        _address: &str,
        _postal_code: &str,
    ) -> Result<Option<Coordinate>, TransportError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(api_down());
        }
        if self.miss {
            return Ok(None);
        }
        Ok(Some(WESTERKERK))
    }
}

#[derive(Default)]
pub struct FakeRenderer {
    pub fail: bool,
    pub rendered: RefCell<Vec<Viewport>>,
}

impl MapRenderer for FakeRenderer {
    fn render(&self, viewport: &Viewport) -> Result<MapImage, TransportError> {
        if self.fail {
            return Err(api_down());
        }
        self.rendered.borrow_mut().push(*viewport);
        Ok(MapImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            content_type: mime::IMAGE_PNG,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text(String),
    Photo(String),
}

/// Records delivered messages. Any message mentioning `reject_containing`
/// fails, as does every photo when `photos_fail` is set.
#[derive(Default)]
pub struct FakeChat {
    pub reject_containing: Option<String>,
    pub photos_fail: bool,
    pub attempts: Cell<usize>,
    pub sent: RefCell<Vec<Sent>>,
}

impl FakeChat {
    fn rejects(&self, text: &str) -> bool {
        self.reject_containing
            .as_deref()
            .map_or(false, |needle| text.contains(needle))
    }

    pub fn texts(&self) -> usize {
        self.sent.borrow().iter().filter(|s| matches!(s, Sent::Text(_))).count()
    }

    pub fn photos(&self) -> usize {
        self.sent.borrow().iter().filter(|s| matches!(s, Sent::Photo(_))).count()
    }
}

impl ChatTransport for FakeChat {
    fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.attempts.set(self.attempts.get() + 1);
        if self.rejects(text) {
            return Err(TransportError::Rejected("Bad Request: chat not found".to_string()));
        }
        self.sent.borrow_mut().push(Sent::Text(text.to_string()));
        Ok(())
    }

    fn send_photo(&self, _image: &MapImage, caption: &str) -> Result<(), TransportError> {
        self.attempts.set(self.attempts.get() + 1);
        if self.photos_fail || self.rejects(caption) {
            return Err(api_down());
        }
        self.sent.borrow_mut().push(Sent::Photo(caption.to_string()));
        Ok(())
    }
}
