use crate::geos::distance::{distance, zoom_for_distance, Coordinate};
use serde::{Deserialize, Serialize};

/// A known-good framing the zoom solver is calibrated against: at `zoom`,
/// a `width_px` × `height_px` map shows `width_m` × `height_m` of ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceView {
    pub width_px: f64,
    pub height_px: f64,
    pub width_m: f64,
    pub height_m: f64,
    pub zoom: f64,
}

impl Default for ReferenceView {
    fn default() -> Self {
        Self {
            width_px: 600.0,
            height_px: 400.0,
            width_m: 10_000.0,
            height_m: 6_350.0,
            zoom: 11.5,
        }
    }
}

/// Everything the map renderer needs for one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width_px: u32,
    pub height_px: u32,
    pub center: Coordinate,
    pub zoom: f64,
    pub marker: Coordinate,
}

/// Lowest zoom among the two axes that keeps `marker` on a
/// `width_px` × `height_px` map centred on `center`.
///
/// The marker offset is split into an east-west and a north-south leg.
/// Each leg is doubled (the marker may sit on either side) and padded by
/// `margin`. A zero-length leg constrains nothing, so a marker on the
/// center yields `f64::INFINITY`.
pub fn fit_marker(
    width_px: f64,
    height_px: f64,
    center: Coordinate,
    marker: Coordinate,
    reference: &ReferenceView,
    margin: f64,
) -> f64 {
    let east_west = distance(Coordinate::new(center.lat, marker.lon), center);
    let north_south = distance(Coordinate::new(marker.lat, center.lon), center);

    let axis_zoom = |leg_m: f64, px: f64, ref_m: f64, ref_px: f64| {
        if leg_m > 0.0 {
            zoom_for_distance(leg_m * 2.0 * margin, px, ref_m, ref_px, reference.zoom)
        } else {
            f64::INFINITY
        }
    };

    let zoom_x = axis_zoom(east_west, width_px, reference.width_m, reference.width_px);
    let zoom_y = axis_zoom(north_south, height_px, reference.height_m, reference.height_px);
    zoom_x.min(zoom_y)
}

/// Fixed map size and center that every notification is drawn on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapFraming {
    pub width: u32,
    pub height: u32,
    pub center: Coordinate,
    /// Never zoom in tighter than this, even for markers next to the center.
    pub max_zoom: f64,
    /// Padding factor around the marker.
    pub margin: f64,
    pub reference: ReferenceView,
}

impl Default for MapFraming {
    fn default() -> Self {
        // Amsterdam, Dam square area.
        Self {
            width: 600,
            height: 400,
            center: Coordinate::new(52.368418, 4.890339),
            max_zoom: 11.5,
            margin: 1.2,
            reference: ReferenceView::default(),
        }
    }
}

impl MapFraming {
    /// Capped zoom for `marker` on this framing.
    pub fn zoom_for(&self, marker: Coordinate) -> f64 {
        let zoom = fit_marker(
            self.width as f64,
            self.height as f64,
            self.center,
            marker,
            &self.reference,
            self.margin,
        );
        zoom.min(self.max_zoom)
    }

    pub fn frame(&self, marker: Coordinate) -> Viewport {
        Viewport {
            width_px: self.width,
            height_px: self.height,
            center: self.center,
            zoom: self.zoom_for(marker),
            marker,
        }
    }
}
