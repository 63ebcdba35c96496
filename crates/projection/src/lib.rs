//! Coordinate reference system transformations.
//!
//! Implements map projections from scratch without external dependencies.

pub mod mercator;

pub use mercator::{mercator_to_wgs84, wgs84_to_mercator};
