//! Spherical Web Mercator (EPSG:3857) projection.
//!
//! Upstream feature services deliver geometries and bounding-box attributes
//! in Web Mercator meters; the viewer works in WGS84 degrees. Both directions
//! use the spherical formulation (no ellipsoidal correction), matching what
//! the tile services themselves assume.

use std::f64::consts::PI;

/// Half the Earth's circumference at the equator in Web Mercator meters.
///
/// X and Y both span [-HALF_CIRCUMFERENCE, HALF_CIRCUMFERENCE].
pub const HALF_CIRCUMFERENCE: f64 = 20037508.34;

/// Convert Web Mercator (EPSG:3857) coordinates to WGS84 (EPSG:4326).
///
/// Returns `(lon, lat)` in degrees. Non-finite inputs propagate as
/// non-finite outputs; callers validate with their own finiteness checks.
pub fn mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / HALF_CIRCUMFERENCE) * 180.0;
    let lat = (y / HALF_CIRCUMFERENCE) * 180.0;
    let lat = 180.0 / PI * (2.0 * (lat * PI / 180.0).exp().atan() - PI / 2.0);
    (lon, lat)
}

/// Convert WGS84 (EPSG:4326) coordinates to Web Mercator (EPSG:3857).
///
/// Takes `(lon, lat)` in degrees, returns `(x, y)` in meters. Latitudes at
/// or beyond the poles produce non-finite Y.
pub fn wgs84_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon * HALF_CIRCUMFERENCE / 180.0;
    let y = ((90.0 + lat) * PI / 360.0).tan().ln() / (PI / 180.0);
    let y = y * HALF_CIRCUMFERENCE / 180.0;
    (x, y)
}
