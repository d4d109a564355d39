//! Coordinate handling.
//!
//! Planar coordinates are converted with a fixed linear scale. This is an
//! approximation, not a geodetic transform: the upstream projection parameters
//! are undocumented, so results can be off by a noticeable margin.

/// Divisor applied to both components of a planar coordinate pair
pub const PLANAR_COORD_SCALE: f64 = 10_000_000.0;

/// Accepts a WGS84 pair, rejecting out-of-range values and the `(0, 0)`
/// placeholder several upstreams emit for "unknown".
pub fn wgs84(latitude: f64, longitude: f64) -> Option<(f64, f64)> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    if latitude == 0.0 && longitude == 0.0 {
        return None;
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }
    Some((latitude, longitude))
}

/// Approximates `(latitude, longitude)` from a planar `(x, y)` pair
pub fn planar_to_wgs84(x: f64, y: f64) -> Option<(f64, f64)> {
    wgs84(y / PLANAR_COORD_SCALE, x / PLANAR_COORD_SCALE)
}
