//! # Geographic Utilities
//!
//! Core geographic computations shared by the track store, the position
//! resolver and the corridor assembler.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`polyline_length`] | Total length of a GPS path in meters |
//! | [`lerp_point`] | Linear interpolation between two GPS points |
//! | [`compute_bounds`] | Bounding box of a GPS path |
//!
//! ## Example
//!
//! ```rust
//! use corridor_survey::{GpsPoint, geo_utils};
//!
//! let path = vec![
//!     GpsPoint::new(0.3800, 32.6100),
//!     GpsPoint::new(0.3810, 32.6110),
//!     GpsPoint::new(0.3825, 32.6120),
//! ];
//!
//! let length = geo_utils::polyline_length(&path);
//! println!("Path length: {:.0}m", length);
//! ```
//!
//! All functions expect WGS84 coordinates in degrees.

use crate::{Bounds, GpsPoint};
use geo::{Distance, Haversine, Point};

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance between two GPS points in meters.
///
/// ```rust
/// use corridor_survey::{GpsPoint, geo_utils};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Total length of a polyline in meters. Empty or single-point paths are 0.0.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Linear interpolation in latitude/longitude space.
///
/// `t = 0.0` returns `a`, `t = 1.0` returns `b`. Over the sub-kilometre spans
/// used for track interpolation and densification the error against a true
/// great-circle interpolation is negligible.
#[inline]
pub fn lerp_point(a: &GpsPoint, b: &GpsPoint, t: f64) -> GpsPoint {
    GpsPoint::new(
        a.latitude + t * (b.latitude - a.latitude),
        a.longitude + t * (b.longitude - a.longitude),
    )
}

// =============================================================================
// Bounding Box
// =============================================================================

/// Bounding box of a GPS path. Returns `None` for empty input.
pub fn compute_bounds(points: &[GpsPoint]) -> Option<Bounds> {
    Bounds::from_points(points)
}

// =============================================================================
// Unit Tests
// =============================================================================
