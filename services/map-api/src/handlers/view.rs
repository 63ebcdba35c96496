//! View bootstrap and layer composition handlers.
//!
//! `view_handler` answers the first request the embedded viewer makes: the
//! resolved extent, worksite attributes, base-map choice and the layer panel
//! contents. `layers_handler` turns an active-layer selection into the
//! ordered WMS request templates the map draws with.

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use map_common::{Extent, MapError};
use viewer_core::{
    compose, ActiveLayerSet, BaseLayerChoice, ExtentSource, Legend, SiteInfo,
};

use super::common::{error_response, parse_record};
use crate::metrics::Timer;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Everything the viewer needs to draw the first frame of a worksite map.
#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub record: String,
    pub extent: Extent,
    pub extent_source: ExtentSource,
    pub site: SiteInfo,
    pub base_map: BaseLayerChoice,
    pub layers: Vec<LayerListing>,
    /// Layer ids enabled when the view opens.
    pub active: Vec<String>,
}

/// One overlay as presented in the layer panel.
#[derive(Debug, Serialize)]
pub struct LayerListing {
    pub id: String,
    pub title: String,
    pub draw_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    pub has_points: bool,
    pub default_active: bool,
}

/// One composed overlay: endpoint plus the static WMS parameters.
///
/// Bounding box and pixel size are left to the map client, which appends
/// them per tile.
#[derive(Debug, Serialize)]
pub struct ComposedLayer {
    pub id: String,
    pub title: String,
    pub endpoint: String,
    pub draw_order: i32,
    pub params: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_url: Option<String>,
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LayersQuery {
    /// Comma-separated layer ids; omitted means the default-active set.
    pub active: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/sites/:record/view - Resolve the view for a worksite record
#[instrument(skip(state))]
pub async fn view_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(record): Path<String>,
) -> Result<Json<ViewResponse>, Response> {
    let record = parse_record(&record, &state.contact_email)?;
    info!(record = %record, "View request");

    let timer = Timer::start();
    let (resolved, base_map) = tokio::join!(
        state.resolver.resolve(&record),
        state.basemap.select(&state.http),
    );

    let resolved = match resolved {
        Ok(resolved) => resolved,
        Err(err) => {
            if matches!(err, MapError::SiteUnavailable(_)) {
                state.metrics.record_site_unavailable();
                warn!(record = %record, "Worksite is no longer available");
            } else {
                error!(record = %record, error = %err, "View resolution failed");
            }
            return Err(error_response(&err, &state.contact_email));
        }
    };

    state
        .metrics
        .record_view(resolved.source.label(), timer.elapsed_us())
        .await;
    if base_map.source_id != state.basemap.primary().id {
        state.metrics.record_basemap_fallback();
    }

    let layers = state
        .registry
        .iter()
        .map(|layer| LayerListing {
            id: layer.id.clone(),
            title: layer.title.clone(),
            draw_order: layer.draw_order,
            group: layer.group.clone(),
            legend: layer.legend.clone(),
            has_points: layer.point_source.is_some(),
            default_active: layer.default_active,
        })
        .collect();

    let active = ActiveLayerSet::defaults(&state.registry)
        .iter()
        .map(String::from)
        .collect();

    Ok(Json(ViewResponse {
        record: record.as_segment(),
        extent: resolved.extent,
        extent_source: resolved.source,
        site: resolved.site,
        base_map,
        layers,
        active,
    }))
}

/// GET /api/sites/:record/layers - Composed overlay requests for a selection
#[instrument(skip(state))]
pub async fn layers_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(record): Path<String>,
    Query(query): Query<LayersQuery>,
) -> Result<Json<Vec<ComposedLayer>>, Response> {
    let record = parse_record(&record, &state.contact_email)?;

    let active = match &query.active {
        Some(csv) => ActiveLayerSet::from_ids(
            &state.registry,
            csv.split(',').map(str::trim).filter(|s| !s.is_empty()),
        ),
        None => ActiveLayerSet::defaults(&state.registry),
    };

    let composed = compose(&state.registry, &active, &record)
        .into_iter()
        .map(|request| ComposedLayer {
            params: request.static_params(),
            legend_url: request.legend_graphic_url().ok().map(|u| u.to_string()),
            endpoint: request.wms.endpoint.clone(),
            id: request.layer_id,
            title: request.title,
            draw_order: request.draw_order,
            legend: request.legend,
        })
        .collect();

    Ok(Json(composed))
}

// ============================================================================
// Tests
// ============================================================================
