//! Geographic helpers: distances on the globe and static-map framing.

pub mod distance;
pub mod viewport;

pub use distance::{distance, zoom_for_distance, Coordinate};
pub use viewport::{fit_marker, MapFraming, ReferenceView, Viewport};
