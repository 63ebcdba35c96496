//! Coordinate Reference System codes and axis-order rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known CRS codes used by the viewer and its upstream services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
}

impl CrsCode {
    /// Parse a CRS string from a WMS request (supports both SRS and CRS formats).
    pub fn from_wms_string(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.to_uppercase();

        match normalized.as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:3857" | "EPSG:900913" => Ok(CrsCode::Epsg3857),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Get the axis order for this CRS in WMS 1.3.0.
    ///
    /// WMS 1.3.0 uses the "natural" axis order of the CRS:
    /// - Geographic CRS: lat, lon (y, x)
    /// - Projected CRS: easting, northing (x, y)
    pub fn axis_order_wms_1_3(&self) -> AxisOrder {
        match self {
            CrsCode::Epsg4326 => AxisOrder::LatLon,
            CrsCode::Epsg3857 => AxisOrder::XY,
        }
    }

    /// Get the axis order for WMS 1.1.x (always x, y regardless of CRS).
    pub fn axis_order_wms_1_1(&self) -> AxisOrder {
        AxisOrder::XY
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg3857 => "EPSG:3857",
        };
        write!(f, "{}", code)
    }
}

/// Axis order for coordinate interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    /// X (longitude/easting), Y (latitude/northing)
    XY,
    /// Y (latitude/northing), X (longitude/easting)
    LatLon,
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
