//! Great-circle distance on a spherical earth.

use shared_types::Position;

/// Earth radius in meters (WGS-84 equatorial).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Haversine distance between two positions, in meters.
#[must_use]
pub fn distance_m(a: Position, b: Position) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Whether `point` lies within `radius_m` of `center` (boundary included).
#[must_use]
pub fn within_radius(center: Position, point: Position, radius_m: f64) -> bool {
    distance_m(center, point) <= radius_m
}
