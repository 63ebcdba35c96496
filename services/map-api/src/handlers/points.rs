//! Point-label and route overlay handlers.
//!
//! Both endpoints read the same WFS point features for a record. Point
//! lookups are advisory: a failed upstream query degrades to an empty label
//! set rather than failing the view.

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};

use map_common::{LatLng, MapError, RecordRef};
use viewer_core::{build_route, fetch_labels, navigation_url, PointLabel, RouteOverlay};

use super::common::{error_response, parse_record, require_finite};
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// A route overlay plus the external navigation link for it.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub route: RouteOverlay,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_url: Option<String>,
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/sites/:record/points - Labeled point markers for a record
#[instrument(skip(state))]
pub async fn points_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(record): Path<String>,
) -> Result<Json<Vec<PointLabel>>, Response> {
    let record = parse_record(&record, &state.contact_email)?;

    let labels = collect_point_labels(&state, &record).await;
    state.metrics.record_point_request(labels.len());
    Ok(Json(labels))
}

/// GET /api/sites/:record/route?lat=..&lon=.. - Route overlay from a position
///
/// The route starts at the caller's position and visits the record's point
/// markers in feature order.
#[instrument(skip(state))]
pub async fn route_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(record): Path<String>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<RouteResponse>, Response> {
    let record = parse_record(&record, &state.contact_email)?;
    let center =
        parse_position(&query).map_err(|err| error_response(&err, &state.contact_email))?;

    let labels = collect_point_labels(&state, &record).await;
    let positions: Vec<LatLng> = labels.iter().map(|label| label.position).collect();

    let route = build_route(center, &positions);
    let navigation_url = navigation_url(&route.path).map(|url| url.to_string());

    Ok(Json(RouteResponse {
        route,
        navigation_url,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Fetch labels from every configured point source for the record.
///
/// Failures are logged and counted, never surfaced: the map without its
/// labels is still a usable map.
pub(super) async fn collect_point_labels(state: &AppState, record: &RecordRef) -> Vec<PointLabel> {
    let mut labels = Vec::new();
    for (layer, source) in state.registry.point_sources(|_| true) {
        match fetch_labels(&state.wfs, source, record).await {
            Ok(found) => labels.extend(found),
            Err(err) => {
                state.metrics.record_lookup_failure("points");
                warn!(
                    layer = %layer.id,
                    record = %record,
                    error = %err,
                    "Point lookup failed; dropping labels"
                );
            }
        }
    }
    labels
}

fn parse_position(query: &RouteQuery) -> Result<LatLng, MapError> {
    let lat = require_finite("lat", query.lat)?;
    let lon = require_finite("lon", query.lon)?;
    Ok(LatLng::new(lat, lon))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_requires_both_coordinates() {
        let query = RouteQuery {
            lat: Some(55.7),
            lon: None,
        };
        assert!(matches!(
            parse_position(&query).unwrap_err(),
            MapError::MissingParameter(p) if p == "lon"
        ));

        let query = RouteQuery {
            lat: Some(55.7),
            lon: Some(12.5),
        };
        let center = parse_position(&query).unwrap();
        assert_eq!(center.lat, 55.7);
        assert_eq!(center.lon, 12.5);
    }

    #[test]
    fn test_parse_position_rejects_non_finite() {
        let query = RouteQuery {
            lat: Some(f64::INFINITY),
            lon: Some(12.5),
        };
        assert!(matches!(
            parse_position(&query).unwrap_err(),
            MapError::InvalidParameter { param, .. } if param == "lat"
        ));
    }

    #[test]
    fn test_route_response_serialization() {
        let route = build_route(
            LatLng::new(55.7, 12.5),
            &[LatLng::new(55.8, 12.6)],
        );
        let navigation_url = navigation_url(&route.path).map(|u| u.to_string());
        let response = RouteResponse {
            route,
            navigation_url,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"visible\":true"));
        assert!(json.contains("google.com"));
    }
}
