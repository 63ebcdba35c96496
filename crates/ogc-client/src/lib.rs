//! Client-side OGC WMS and WFS request construction.
//!
//! Supports:
//! - WMS 1.1.0, 1.1.1 and 1.3.0 GetMap, GetLegendGraphic and GetFeatureInfo
//! - WFS 1.0.0 GetFeature with GeoJSON output
//! - CQL attribute filters
//!
//! All requests target remote third-party services; this crate never serves
//! OGC protocols itself.

pub mod cql;
pub mod error;
pub mod geojson;
pub mod wfs;
pub mod wms;

pub use cql::CqlFilter;
pub use error::OgcError;
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use wfs::{GetFeatureRequest, WfsClient};
pub use wms::{
    bbox_kvp, GetFeatureInfoRequest, GetLegendGraphicRequest, GetMapRequest, WmsVersion,
};
