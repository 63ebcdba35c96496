//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::point::LatLng;

/// A projected bounding box.
///
/// Coordinates are in the units of the source CRS (meters for EPSG:3857).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a WMS BBOX parameter string: "minx,miny,maxx,maxy"
    pub fn from_wms_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        Ok(Self {
            min_x: parts[0]
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(parts[0].to_string()))?,
            min_y: parts[1]
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(parts[1].to_string()))?,
            max_x: parts[2]
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(parts[2].to_string()))?,
            max_y: parts[3]
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(parts[3].to_string()))?,
        })
    }

    /// Format as a WMS BBOX parameter string: "minx,miny,maxx,maxy"
    pub fn to_wms_string(&self) -> String {
        format!("{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// All four coordinates are finite and the corners are ordered.
    ///
    /// A box built from upstream attribute values fails this check when any
    /// coordinate was NaN or infinite, or when min exceeds max on an axis.
    pub fn is_valid(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }

    /// Coordinate-wise union: min of minimums, max of maximums.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// A geographic extent as south-west / north-east corners in degrees.
///
/// This is the form the viewer consumes: `[[south, west], [north, east]]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Extent {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Build an extent from corner coordinates in degrees.
    pub fn from_corners(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south_west: LatLng::new(south, west),
            north_east: LatLng::new(north, east),
        }
    }

    /// All four coordinates are finite and the corners are ordered.
    pub fn is_valid(&self) -> bool {
        self.south_west.lat.is_finite()
            && self.south_west.lon.is_finite()
            && self.north_east.lat.is_finite()
            && self.north_east.lon.is_finite()
            && self.south_west.lat <= self.north_east.lat
            && self.south_west.lon <= self.north_east.lon
    }

    /// Coordinate-wise union: southernmost/westernmost to northernmost/easternmost.
    pub fn union(&self, other: &Extent) -> Extent {
        Extent {
            south_west: LatLng::new(
                self.south_west.lat.min(other.south_west.lat),
                self.south_west.lon.min(other.south_west.lon),
            ),
            north_east: LatLng::new(
                self.north_east.lat.max(other.north_east.lat),
                self.north_east.lon.max(other.north_east.lon),
            ),
        }
    }

    /// Midpoint of the extent.
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lon + self.north_east.lon) / 2.0,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid BBOX format: {0}. Expected 'minx,miny,maxx,maxy'")]
    InvalidFormat(String),

    #[error("Invalid number in BBOX: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wms_bbox() {
        let bbox = BoundingBox::from_wms_string("1393891.0,7496404.0,1405765.0,7508620.0").unwrap();
        assert_eq!(bbox.min_x, 1393891.0);
        assert_eq!(bbox.min_y, 7496404.0);
        assert_eq!(bbox.max_x, 1405765.0);
        assert_eq!(bbox.max_y, 7508620.0);
    }

    #[test]
    fn test_wms_string_round_trip() {
        let bbox = BoundingBox::new(1.5, 2.5, 3.5, 4.5);
        let parsed = BoundingBox::from_wms_string(&bbox.to_wms_string()).unwrap();
        assert_eq!(parsed, bbox);
    }

    #[test]
    fn test_union_takes_coordinate_wise_min_max() {
        let a = BoundingBox::new(1.0, 1.0, 2.0, 2.0);
        let b = BoundingBox::new(0.0, 0.0, 4.0, 3.0);

        let u = a.union(&b);
        assert_eq!(u.min_x, 0.0);
        assert_eq!(u.min_y, 0.0);
        assert_eq!(u.max_x, 4.0);
        assert_eq!(u.max_y, 3.0);
    }

    #[test]
    fn test_non_finite_coordinate_invalidates() {
        assert!(BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0).is_valid());
        assert!(!BoundingBox::new(0.0, f64::NEG_INFINITY, 1.0, 1.0).is_valid());
        assert!(!BoundingBox::new(0.0, 0.0, f64::INFINITY, 1.0).is_valid());
        // Inverted corners are rejected too.
        assert!(!BoundingBox::new(2.0, 0.0, 1.0, 1.0).is_valid());
    }

    #[test]
    fn test_extent_union_and_center() {
        let a = Extent::from_corners(55.0, 12.0, 56.0, 13.0);
        let b = Extent::from_corners(54.5, 12.5, 55.5, 13.5);

        let u = a.union(&b);
        assert_eq!(u.south_west.lat, 54.5);
        assert_eq!(u.south_west.lon, 12.0);
        assert_eq!(u.north_east.lat, 56.0);
        assert_eq!(u.north_east.lon, 13.5);

        let c = a.center();
        assert_eq!(c.lat, 55.5);
        assert_eq!(c.lon, 12.5);
    }
}
