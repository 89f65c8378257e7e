use crate::errors::TransportError;
use crate::geos::{Coordinate, Viewport};
use crate::notifier::{Geocoder, MapImage, MapRenderer};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Geoapify geocoding and static-map client.
pub struct Geoapify {
    api_key: String,
    country: String,
    map_style: String,
    geocode_url: String,
    staticmap_url: String,
    client: Client,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    lat: f64,
    lon: f64,
}

impl Geoapify {
    pub fn new(
        api_key: impl Into<String>,
        country: impl Into<String>,
        map_style: impl Into<String>,
        geocode_url: impl Into<String>,
        staticmap_url: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            api_key: api_key.into(),
            country: country.into(),
            map_style: map_style.into(),
            geocode_url: geocode_url.into(),
            staticmap_url: staticmap_url.into(),
            client,
        })
    }

    pub fn geocode_request_url(
        &self,
        address: &str,
        postal_code: &str,
    ) -> Result<Url, TransportError> {
        let url = Url::parse_with_params(
            &self.geocode_url,
            &[
                ("name", address),
                ("postcode", postal_code),
                ("country", self.country.as_str()),
                ("format", "json"),
                ("apiKey", self.api_key.as_str()),
            ],
        )?;
        Ok(url)
    }

    pub fn staticmap_request_url(&self, viewport: &Viewport) -> Result<Url, TransportError> {
        let center = format!("lonlat:{},{}", viewport.center.lon, viewport.center.lat);
        let marker = format!(
            "lonlat:{},{};color:#ff0000;size:medium",
            viewport.marker.lon, viewport.marker.lat
        );

        let url = Url::parse_with_params(
            &self.staticmap_url,
            &[
                ("style", self.map_style.clone()),
                ("width", viewport.width_px.to_string()),
                ("height", viewport.height_px.to_string()),
                ("center", center),
                ("zoom", format!("{:.1}", viewport.zoom)),
                ("marker", marker),
                ("apiKey", self.api_key.clone()),
            ],
        )?;
        Ok(url)
    }
}

impl Geocoder for Geoapify {
    fn resolve(
        &self,
        address: &str,
        postal_code: &str,
    ) -> Result<Option<Coordinate>, TransportError> {
        let url = self.geocode_request_url(address, postal_code)?;
        log::debug!("Geocoding {address}, {postal_code}");

        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
            return Err(TransportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GeocodeResponse = resp.json()?;
        Ok(parsed
            .results
            .first()
            .map(|r| Coordinate::new(r.lat, r.lon)))
    }
}

impl MapRenderer for Geoapify {
    fn render(&self, viewport: &Viewport) -> Result<MapImage, TransportError> {
        let url = self.staticmap_request_url(viewport)?;
        log::debug!("Rendering map at zoom {:.1}", viewport.zoom);

        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
            return Err(TransportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<mime::Mime>().ok())
            .filter(|m| m.type_() == mime::IMAGE)
            .unwrap_or(mime::IMAGE_JPEG);

        let bytes = resp.bytes()?.to_vec();
        Ok(MapImage {
            bytes,
            content_type,
        })
    }
}
