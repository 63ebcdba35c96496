//! Click-probe proxy.
//!
//! Proxies a map click to the overlay's GetFeatureInfo endpoint so the
//! browser never talks to the credentialed services directly. The probe
//! keeps the record filter, so clicks only ever see the record's own
//! features.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{instrument, warn};
use url::Url;

use map_common::{BoundingBox, MapError};
use viewer_core::{compose, ActiveLayerSet};

use super::common::{error_response, parse_record};
use crate::state::AppState;

const DEFAULT_FEATURE_COUNT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct FeatureInfoQuery {
    pub layer: String,
    /// EPSG:3857 bbox of the rendered map: "minx,miny,maxx,maxy".
    pub bbox: String,
    pub width: u32,
    pub height: u32,
    /// Click pixel column within the rendered map.
    pub i: u32,
    /// Click pixel row within the rendered map.
    pub j: u32,
    pub feature_count: Option<u32>,
}

/// GET /api/sites/:record/feature-info - Probe a map click against a layer
#[instrument(skip(state))]
pub async fn feature_info_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(record): Path<String>,
    Query(query): Query<FeatureInfoQuery>,
) -> Result<Response, Response> {
    let record = parse_record(&record, &state.contact_email)?;

    let bbox = BoundingBox::from_wms_string(&query.bbox)
        .map_err(|e| error_response(&MapError::from(e), &state.contact_email))?;

    // Composing a single-layer selection reuses the token and filter wiring
    // the tile requests get. Group expansion may pull in siblings, so pick
    // the requested layer back out.
    let active = ActiveLayerSet::from_ids(&state.registry, [query.layer.as_str()]);
    let request = compose(&state.registry, &active, &record)
        .into_iter()
        .find(|r| r.layer_id == query.layer)
        .ok_or_else(|| {
            error_response(
                &MapError::LayerNotFound(query.layer.clone()),
                &state.contact_email,
            )
        })?;

    let probe = request.feature_info(query.feature_count.unwrap_or(DEFAULT_FEATURE_COUNT));
    let url = probe
        .to_url(&bbox, query.width, query.height, query.i, query.j)
        .map_err(|e| error_response(&MapError::from(e), &state.contact_email))?;

    match proxy_feature_info(&state.http, url).await {
        Ok(body) => Ok(Json(body).into_response()),
        Err(err) => {
            state.metrics.record_lookup_failure("feature_info");
            warn!(
                layer = %query.layer,
                record = %record,
                error = %err,
                "Feature info probe failed"
            );
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

async fn proxy_feature_info(
    client: &reqwest::Client,
    url: Url,
) -> Result<serde_json::Value, MapError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| MapError::Upstream(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(MapError::Upstream(format!(
            "GetFeatureInfo returned status {}",
            status.as_u16()
        )));
    }

    response
        .json()
        .await
        .map_err(|e| MapError::UpstreamFormat(e.to_string()))
}
