//! Core viewer logic: the overlay registry, extent resolution and layer
//! composition for worksite maps.
//!
//! Everything here is independent of the HTTP surface. The registry is an
//! immutable table built at startup; resolution and composition are pure
//! functions of (registry, active set, record identifier) plus the WFS
//! responses fetched for one record.

pub mod active;
pub mod basemap;
pub mod compose;
pub mod labels;
pub mod registry;
pub mod resolve;
pub mod route;

pub use active::ActiveLayerSet;
pub use basemap::{BaseLayerChoice, BaseMapSelector, BaseMapSource};
pub use compose::{compose, RenderRequest};
pub use labels::{fetch_labels, PointLabel};
pub use registry::{
    LayerDefinition, LayerOverride, LayerRegistry, Legend, LegendEntry, PointSource,
    RegistryOverrides, SwatchKind,
};
pub use resolve::{
    ExtentResolver, ExtentSource, FeatureLookup, LookupOutcome, LookupRole, ResolvedExtent,
    SiteInfo, DEFAULT_EXTENT,
};
pub use route::{build_route, navigation_url, RouteOverlay};
