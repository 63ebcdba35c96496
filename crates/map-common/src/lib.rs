//! Common types and utilities shared across all worksite-maps crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod point;
pub mod record;

pub use bbox::{BoundingBox, Extent};
pub use crs::{AxisOrder, CrsCode};
pub use error::{MapError, MapResult};
pub use point::LatLng;
pub use record::RecordRef;
