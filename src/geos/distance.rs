use serde::{Deserialize, Serialize};

/// Earth radius used by the haversine formula, in metres (WGS84 equatorial).
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// A (latitude, longitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Great-circle distance in metres (haversine).
pub fn distance(p1: Coordinate, p2: Coordinate) -> f64 {
    let d_lat = (p2.lat - p1.lat).to_radians();
    let d_lon = (p2.lon - p1.lon).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + p1.lat.to_radians().cos() * p2.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Zoom level at which `distance_m` spans `viewport_px` pixels.
///
/// Anchored on a reference framing: `reference_distance_m` fills
/// `reference_viewport_px` at `reference_zoom`. Each zoom step halves the
/// ground distance per pixel. `distance_m` must be positive.
pub fn zoom_for_distance(
    distance_m: f64,
    viewport_px: f64,
    reference_distance_m: f64,
    reference_viewport_px: f64,
    reference_zoom: f64,
) -> f64 {
    let metres_per_px_at_zero =
        reference_distance_m / (reference_viewport_px * 2f64.powf(-reference_zoom));
    (viewport_px * metres_per_px_at_zero).log2() - distance_m.log2()
}
