//! Worksite extent resolution.
//!
//! Given a record identifier, runs the configured feature lookups against the
//! upstream WFS sources, combines whatever bounding boxes validate into a
//! geographic extent and collects the worksite attributes. The primary lookup
//! decides whether the worksite still exists at all; secondary lookups only
//! enrich the result.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use map_common::{BoundingBox, Extent, LatLng, MapError, MapResult, RecordRef};
use ogc_client::{CqlFilter, Feature, FeatureCollection, GetFeatureRequest, WfsClient};
use projection::mercator_to_wgs84;

use crate::registry::HDGIS_OWS;

/// Extent used when the worksite exists but no source box validates.
/// Frames the whole country.
pub const DEFAULT_EXTENT: Extent = Extent {
    south_west: LatLng { lat: 54.5, lon: 8.0 },
    north_east: LatLng { lat: 57.8, lon: 15.3 },
};

/// Whether a lookup decides existence or only enriches the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupRole {
    Primary,
    Secondary,
}

/// One named WFS feature lookup.
#[derive(Debug, Clone)]
pub struct FeatureLookup {
    pub name: String,
    pub endpoint: String,
    pub type_name: String,
    pub role: LookupRole,
}

impl FeatureLookup {
    pub fn primary(name: &str, endpoint: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            type_name: type_name.to_string(),
            role: LookupRole::Primary,
        }
    }

    pub fn secondary(name: &str, endpoint: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            type_name: type_name.to_string(),
            role: LookupRole::Secondary,
        }
    }
}

/// Worksite attributes read from a looked-up feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SiteInfo {
    pub working_site_name: Option<String>,
    pub working_site_id: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-source lookup outcome. Failures are data here, not errors; only the
/// combination step decides what is fatal.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    FoundWithBox { bbox: BoundingBox, info: SiteInfo },
    FoundWithoutBox { info: SiteInfo },
    NoFeature,
    QueryFailed { error: String },
}

/// Which sources produced the resolved extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtentSource {
    Union,
    PrimaryOnly,
    SecondaryOnly,
    Default,
}

impl ExtentSource {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ExtentSource::Union => "union",
            ExtentSource::PrimaryOnly => "primary_only",
            ExtentSource::SecondaryOnly => "secondary_only",
            ExtentSource::Default => "default",
        }
    }
}

/// The resolved view extent plus the worksite attributes backing it.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedExtent {
    pub extent: Extent,
    pub source: ExtentSource,
    pub site: SiteInfo,
}

// ============================================================================
// Resolver
// ============================================================================

/// Runs the feature lookups for a record and combines their outcomes.
pub struct ExtentResolver {
    client: WfsClient,
    lookups: Vec<FeatureLookup>,
    default_extent: Extent,
}

impl ExtentResolver {
    pub fn new(client: WfsClient, lookups: Vec<FeatureLookup>, default_extent: Extent) -> Self {
        Self {
            client,
            lookups,
            default_extent,
        }
    }

    /// The standard lookup pair: worksite stands decide existence, worksite
    /// points contribute the update timestamp and a second box.
    pub fn standard(client: WfsClient) -> Self {
        Self::new(
            client,
            vec![
                FeatureLookup::primary("stands", HDGIS_OWS, "hdgis:DynamicMapStands"),
                FeatureLookup::secondary("points", HDGIS_OWS, "hdgis:DynamicMapPoints"),
            ],
            DEFAULT_EXTENT,
        )
    }

    /// Replace the fallback extent, e.g. from deployment configuration.
    pub fn with_default_extent(mut self, extent: Extent) -> Self {
        self.default_extent = extent;
        self
    }

    pub fn lookups(&self) -> &[FeatureLookup] {
        &self.lookups
    }

    /// Resolve the view extent for a record. Lookups run concurrently; each
    /// failure is caught independently and folded in as an outcome.
    pub async fn resolve(&self, record: &RecordRef) -> MapResult<ResolvedExtent> {
        let filter = CqlFilter::for_record(record);

        let pending = self.lookups.iter().map(|lookup| {
            let request = GetFeatureRequest::new(&lookup.endpoint, &lookup.type_name)
                .with_filter(filter.clone())
                .with_max_features(1);
            async move {
                let outcome = match self.client.get_features(&request).await {
                    Ok(collection) => outcome_from_collection(&collection),
                    Err(e) => {
                        warn!(lookup = %lookup.name, error = %e, "Feature lookup failed");
                        LookupOutcome::QueryFailed {
                            error: e.to_string(),
                        }
                    }
                };
                debug!(lookup = %lookup.name, outcome = ?outcome_label(&outcome), "Feature lookup finished");
                (lookup.role, outcome)
            }
        });

        let outcomes = join_all(pending).await;
        combine_outcomes(record, outcomes, &self.default_extent)
    }
}

fn outcome_label(outcome: &LookupOutcome) -> &'static str {
    match outcome {
        LookupOutcome::FoundWithBox { .. } => "found_with_box",
        LookupOutcome::FoundWithoutBox { .. } => "found_without_box",
        LookupOutcome::NoFeature => "no_feature",
        LookupOutcome::QueryFailed { .. } => "query_failed",
    }
}

// ============================================================================
// Pure combination logic
// ============================================================================

/// Classify one WFS response.
pub fn outcome_from_collection(collection: &FeatureCollection) -> LookupOutcome {
    let Some(feature) = collection.first() else {
        return LookupOutcome::NoFeature;
    };
    let info = site_info_from(feature);
    match feature_box(feature) {
        Some(bbox) => LookupOutcome::FoundWithBox { bbox, info },
        None => LookupOutcome::FoundWithoutBox { info },
    }
}

/// Combine per-source outcomes into the resolved extent.
///
/// A failed or empty primary lookup is fatal regardless of what the
/// secondaries produced: the record is treated as no longer available.
pub fn combine_outcomes(
    record: &RecordRef,
    outcomes: Vec<(LookupRole, LookupOutcome)>,
    default_extent: &Extent,
) -> MapResult<ResolvedExtent> {
    let mut primary: Option<LookupOutcome> = None;
    let mut secondaries: Vec<LookupOutcome> = Vec::new();
    for (role, outcome) in outcomes {
        match role {
            LookupRole::Primary if primary.is_none() => primary = Some(outcome),
            _ => secondaries.push(outcome),
        }
    }

    let primary = primary.ok_or_else(|| {
        MapError::ConfigError("No primary feature lookup configured".to_string())
    })?;

    let (mut site, primary_box) = match primary {
        LookupOutcome::FoundWithBox { bbox, info } => (info, Some(bbox)),
        LookupOutcome::FoundWithoutBox { info } => (info, None),
        LookupOutcome::NoFeature | LookupOutcome::QueryFailed { .. } => {
            return Err(MapError::SiteUnavailable(record.to_string()));
        }
    };

    let mut secondary_extents: Vec<Extent> = Vec::new();
    for outcome in secondaries {
        let info = match outcome {
            LookupOutcome::FoundWithBox { bbox, info } => {
                if let Some(extent) = project_box(&bbox) {
                    secondary_extents.push(extent);
                }
                info
            }
            LookupOutcome::FoundWithoutBox { info } => info,
            LookupOutcome::NoFeature | LookupOutcome::QueryFailed { .. } => continue,
        };
        if site.updated_at.is_none() {
            site.updated_at = info.updated_at;
        }
        if site.working_site_name.is_none() {
            site.working_site_name = info.working_site_name;
        }
        if site.working_site_id.is_none() {
            site.working_site_id = info.working_site_id;
        }
    }

    let primary_extent = primary_box.as_ref().and_then(project_box);
    let secondary_union = secondary_extents
        .iter()
        .copied()
        .reduce(|a, b| a.union(&b));

    let (extent, source) = match (primary_extent, secondary_union) {
        (Some(p), Some(s)) => (p.union(&s), ExtentSource::Union),
        (Some(p), None) => (p, ExtentSource::PrimaryOnly),
        (None, Some(s)) => (s, ExtentSource::SecondaryOnly),
        (None, None) => (*default_extent, ExtentSource::Default),
    };

    Ok(ResolvedExtent {
        extent,
        source,
        site,
    })
}

/// Read the box attributes (source projected CRS) off a feature.
///
/// Any missing or non-finite coordinate invalidates the whole box.
fn feature_box(feature: &Feature) -> Option<BoundingBox> {
    let bbox = BoundingBox::new(
        feature.property_f64("xmin")?,
        feature.property_f64("ymin")?,
        feature.property_f64("xmax")?,
        feature.property_f64("ymax")?,
    );
    bbox.is_valid().then_some(bbox)
}

/// Reproject a projected box to a geographic extent.
fn project_box(bbox: &BoundingBox) -> Option<Extent> {
    let (west, south) = mercator_to_wgs84(bbox.min_x, bbox.min_y);
    let (east, north) = mercator_to_wgs84(bbox.max_x, bbox.max_y);
    let extent = Extent::from_corners(south, west, north, east);
    extent.is_valid().then_some(extent)
}

fn site_info_from(feature: &Feature) -> SiteInfo {
    SiteInfo {
        working_site_name: text_property(feature, "workingsitename"),
        working_site_id: text_property(feature, "workingsiteid"),
        updated_at: feature
            .property_str("timestamp")
            .and_then(parse_timestamp),
    }
}

/// A property that may arrive as a string or a bare number.
fn text_property(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse the upstream timestamp attribute.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    // Try the formats GeoServer actually emits
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::wfs;

    fn collection(v: serde_json::Value) -> FeatureCollection {
        serde_json::from_value(v).unwrap()
    }

    fn record() -> RecordRef {
        RecordRef::parse("ABC123").unwrap()
    }

    fn found(bbox: (f64, f64, f64, f64)) -> LookupOutcome {
        outcome_from_collection(&collection(wfs::feature_collection(vec![
            wfs::stand_feature("Nordskoven", "WS7", bbox),
        ])))
    }

    #[test]
    fn test_outcome_with_valid_box() {
        let outcome = found((1.0, 1.0, 2.0, 2.0));
        match outcome {
            LookupOutcome::FoundWithBox { bbox, info } => {
                assert_eq!(bbox, BoundingBox::new(1.0, 1.0, 2.0, 2.0));
                assert_eq!(info.working_site_name.as_deref(), Some("Nordskoven"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_coordinate_invalidates_box() {
        let outcome = found((f64::NAN, 1.0, 2.0, 2.0));
        assert!(matches!(outcome, LookupOutcome::FoundWithoutBox { .. }));
    }

    #[test]
    fn test_missing_coordinate_invalidates_box() {
        let outcome = outcome_from_collection(&collection(wfs::feature_collection(vec![
            serde_json::json!({
                "type": "Feature",
                "geometry": null,
                "properties": { "workingsitename": "X", "xmin": 1.0, "ymin": 1.0, "xmax": 2.0 }
            }),
        ])));
        assert!(matches!(outcome, LookupOutcome::FoundWithoutBox { .. }));
    }

    #[test]
    fn test_empty_collection_is_no_feature() {
        let outcome = outcome_from_collection(&collection(wfs::empty_collection()));
        assert!(matches!(outcome, LookupOutcome::NoFeature));
    }

    #[test]
    fn test_primary_no_feature_is_terminal() {
        let secondary = found((1.0, 1.0, 2.0, 2.0));
        let err = combine_outcomes(
            &record(),
            vec![
                (LookupRole::Primary, LookupOutcome::NoFeature),
                (LookupRole::Secondary, secondary),
            ],
            &DEFAULT_EXTENT,
        )
        .unwrap_err();

        assert!(matches!(err, MapError::SiteUnavailable(_)));
        assert_eq!(err.http_status_code(), 410);
    }

    #[test]
    fn test_primary_query_failure_is_terminal() {
        let err = combine_outcomes(
            &record(),
            vec![
                (
                    LookupRole::Primary,
                    LookupOutcome::QueryFailed {
                        error: "connect refused".to_string(),
                    },
                ),
                (LookupRole::Secondary, found((1.0, 1.0, 2.0, 2.0))),
            ],
            &DEFAULT_EXTENT,
        )
        .unwrap_err();

        assert!(matches!(err, MapError::SiteUnavailable(_)));
    }

    #[test]
    fn test_union_of_both_boxes() {
        // Two overlapping boxes around the same worksite, a few hundred
        // meters apart.
        let primary = found((1393891.0, 7496404.0, 1405765.0, 7508620.0));
        let secondary = found((1393000.0, 7497000.0, 1406500.0, 7508000.0));

        let resolved = combine_outcomes(
            &record(),
            vec![
                (LookupRole::Primary, primary),
                (LookupRole::Secondary, secondary),
            ],
            &DEFAULT_EXTENT,
        )
        .unwrap();

        assert_eq!(resolved.source, ExtentSource::Union);

        // The union must reach the outermost corner of each source box.
        let (west, south) = mercator_to_wgs84(1393000.0, 7496404.0);
        let (east, north) = mercator_to_wgs84(1406500.0, 7508620.0);
        assert!((resolved.extent.south_west.lon - west).abs() < 1e-9);
        assert!((resolved.extent.south_west.lat - south).abs() < 1e-9);
        assert!((resolved.extent.north_east.lon - east).abs() < 1e-9);
        assert!((resolved.extent.north_east.lat - north).abs() < 1e-9);
    }

    #[test]
    fn test_secondary_box_used_alone_when_primary_box_invalid() {
        let primary = found((f64::INFINITY, 7496404.0, 1405765.0, 7508620.0));
        let secondary = found((1393891.0, 7496404.0, 1405765.0, 7508620.0));

        let resolved = combine_outcomes(
            &record(),
            vec![
                (LookupRole::Primary, primary),
                (LookupRole::Secondary, secondary),
            ],
            &DEFAULT_EXTENT,
        )
        .unwrap();

        assert_eq!(resolved.source, ExtentSource::SecondaryOnly);
        assert!(resolved.extent.is_valid());
    }

    #[test]
    fn test_default_extent_when_no_box_validates() {
        let primary = found((f64::NAN, 1.0, 2.0, 2.0));

        let resolved = combine_outcomes(
            &record(),
            vec![
                (LookupRole::Primary, primary),
                (LookupRole::Secondary, LookupOutcome::NoFeature),
            ],
            &DEFAULT_EXTENT,
        )
        .unwrap();

        assert_eq!(resolved.source, ExtentSource::Default);
        assert_eq!(resolved.extent, DEFAULT_EXTENT);
        // The site itself still resolved.
        assert_eq!(
            resolved.site.working_site_name.as_deref(),
            Some("Nordskoven")
        );
    }

    #[test]
    fn test_secondary_failure_is_not_fatal() {
        let primary = found((1393891.0, 7496404.0, 1405765.0, 7508620.0));

        let resolved = combine_outcomes(
            &record(),
            vec![
                (LookupRole::Primary, primary),
                (
                    LookupRole::Secondary,
                    LookupOutcome::QueryFailed {
                        error: "timeout".to_string(),
                    },
                ),
            ],
            &DEFAULT_EXTENT,
        )
        .unwrap();

        assert_eq!(resolved.source, ExtentSource::PrimaryOnly);
    }

    #[test]
    fn test_secondary_contributes_timestamp() {
        let primary = found((1393891.0, 7496404.0, 1405765.0, 7508620.0));
        let secondary = outcome_from_collection(&collection(wfs::feature_collection(vec![
            wfs::point_summary_feature(
                "Nordskoven",
                "WS7",
                "2024-03-01T10:30:00Z",
                (1393891.0, 7496404.0, 1405765.0, 7508620.0),
            ),
        ])));

        let resolved = combine_outcomes(
            &record(),
            vec![
                (LookupRole::Primary, primary),
                (LookupRole::Secondary, secondary),
            ],
            &DEFAULT_EXTENT,
        )
        .unwrap();

        let updated = resolved.site.updated_at.unwrap();
        assert_eq!(updated.to_rfc3339(), "2024-03-01T10:30:00+00:00");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        for s in [
            "2024-03-01T10:30:00Z",
            "2024-03-01T10:30:00.000Z",
            "2024-03-01T10:30:00.000",
            "2024-03-01T10:30:00+00:00",
        ] {
            assert!(parse_timestamp(s).is_some(), "{}", s);
        }
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_numeric_site_id_accepted() {
        let outcome = outcome_from_collection(&collection(wfs::feature_collection(vec![
            serde_json::json!({
                "type": "Feature",
                "geometry": null,
                "properties": { "workingsitename": "X", "workingsiteid": 42 }
            }),
        ])));
        match outcome {
            LookupOutcome::FoundWithoutBox { info } => {
                assert_eq!(info.working_site_id.as_deref(), Some("42"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
