//! Great-circle distance and arrival detection.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres (IUGG).
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Distance below which the plane counts as having reached its target.
pub const ARRIVAL_THRESHOLD_METERS: f64 = 200_000.0;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    /// Degrees north of the equator.
    pub latitude: f64,
    /// Degrees east of Greenwich.
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate from latitude and longitude.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Shift by the given deltas, clamping latitude to the poles and wrapping longitude.
    pub fn offset(self, d_lat: f64, d_lon: f64) -> Self {
        let latitude = (self.latitude + d_lat).clamp(-90.0, 90.0);
        let mut longitude = self.longitude + d_lon;
        if longitude > 180.0 {
            longitude -= 360.0;
        } else if longitude < -180.0 {
            longitude += 360.0;
        }
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine distance between two points, in metres.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// True when `current` lies strictly inside the arrival radius around `target`.
pub fn has_arrived(current: Coordinate, target: Coordinate) -> bool {
    distance_meters(current, target) < ARRIVAL_THRESHOLD_METERS
}

/// Screen heading from `from` towards `to`, in degrees clockwise from north.
///
/// This is a flat-map bearing used for orienting the plane glyph, not a true
/// initial great-circle course.
pub fn heading_degrees(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = to.latitude - from.latitude;
    let d_lon = to.longitude - from.longitude;
    let angle = d_lon.atan2(d_lat).to_degrees();
    if angle < 0.0 {
        angle + 360.0
    } else {
        angle
    }
}
