//! HTTP request handlers for the worksite map viewer.
//!
//! This module is organized into submodules:
//! - `view`: View bootstrap and layer composition handlers
//! - `points`: Point-label and route overlay handlers
//! - `info`: GetFeatureInfo click-probe proxy
//! - `pages`: The embedded viewer and root HTML pages
//! - `metrics`: Health checks, Prometheus metrics, and monitoring
//! - `common`: Shared utilities (error bodies, parameter parsing)

pub mod common;
pub mod info;
pub mod metrics;
pub mod pages;
pub mod points;
pub mod view;

pub use common::{error_response, parse_record, ErrorBody};

pub use view::{
    layers_handler,
    view_handler,
    ComposedLayer,
    LayerListing,
    ViewResponse,
};

pub use points::{
    points_handler,
    route_handler,
    RouteResponse,
};

pub use info::feature_info_handler;

pub use pages::{
    root_page_handler,
    viewer_page_handler,
};

pub use metrics::{
    api_stats_handler,
    health_handler,
    metrics_handler,
    ready_handler,
};
