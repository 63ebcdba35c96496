//! Point-label overlay.
//!
//! Fetches the labelled point features for a record and reprojects them to
//! geographic coordinates. The overlay is rebuilt from scratch on every
//! controlling toggle, so this module is fetch-and-convert only; it keeps no
//! state.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use map_common::{LatLng, MapResult, RecordRef};
use ogc_client::{CqlFilter, Feature, FeatureCollection, GetFeatureRequest, WfsClient};
use projection::mercator_to_wgs84;

use crate::registry::PointSource;

/// One marker position plus its text label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointLabel {
    pub position: LatLng,
    pub label: String,
}

/// Fetch and reproject the labelled points for a record.
///
/// The caller treats failures as degradation, not errors: the map renders
/// without markers.
pub async fn fetch_labels(
    client: &WfsClient,
    source: &PointSource,
    record: &RecordRef,
) -> MapResult<Vec<PointLabel>> {
    let request = GetFeatureRequest::new(&source.endpoint, &source.type_name)
        .with_filter(CqlFilter::for_record(record));
    let collection = client.get_features(&request).await?;
    Ok(labels_from_collection(&collection, source, record))
}

/// Convert point features into markers, skipping anything unusable.
pub fn labels_from_collection(
    collection: &FeatureCollection,
    source: &PointSource,
    record: &RecordRef,
) -> Vec<PointLabel> {
    let mut labels = Vec::with_capacity(collection.len());
    for feature in &collection.features {
        let Some((x, y)) = feature
            .geometry
            .as_ref()
            .and_then(|g| g.point_coordinates())
        else {
            continue;
        };

        let (lon, lat) = mercator_to_wgs84(x, y);
        let position = LatLng::new(lat, lon);
        if !position.is_valid() {
            warn!(x, y, "Skipping point with non-finite projected position");
            continue;
        }

        let label = label_text(feature, &source.label_property)
            .unwrap_or_else(|| record.as_segment());
        labels.push(PointLabel { position, label });
    }
    labels
}

/// The configured label attribute, as text. Numbers are common here (stack
/// numbers are numeric in some source tables).
fn label_text(feature: &Feature, property: &str) -> Option<String> {
    match feature.property(property)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::{coords, wfs};

    fn source() -> PointSource {
        PointSource {
            endpoint: "https://maps.example.test/ows".to_string(),
            type_name: "hdgis:DynamicMapPoints".to_string(),
            label_property: "stakkenr".to_string(),
        }
    }

    fn record() -> RecordRef {
        RecordRef::parse("ABC123").unwrap()
    }

    fn collection(v: serde_json::Value) -> FeatureCollection {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_labels_are_reprojected() {
        let (x, y) = coords::DK_3857;
        let c = collection(wfs::feature_collection(vec![wfs::point_feature(
            "S1", x, y,
        )]));

        let labels = labels_from_collection(&c, &source(), &record());
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].label, "S1");

        // Reprojection must land in Denmark, in degrees.
        let p = labels[0].position;
        assert!(p.lat > 54.0 && p.lat < 58.0, "lat {}", p.lat);
        assert!(p.lon > 8.0 && p.lon < 16.0, "lon {}", p.lon);
    }

    #[test]
    fn test_label_falls_back_to_record_key() {
        let c = collection(wfs::feature_collection(vec![serde_json::json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [1399000.0, 7496000.0] },
            "properties": {}
        })]));

        let labels = labels_from_collection(&c, &source(), &record());
        assert_eq!(labels[0].label, "ABC123");
    }

    #[test]
    fn test_numeric_label_accepted() {
        let c = collection(wfs::feature_collection(vec![serde_json::json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [1399000.0, 7496000.0] },
            "properties": { "stakkenr": 17 }
        })]));

        let labels = labels_from_collection(&c, &source(), &record());
        assert_eq!(labels[0].label, "17");
    }

    #[test]
    fn test_features_without_point_geometry_are_skipped() {
        let c = collection(wfs::feature_collection(vec![
            serde_json::json!({
                "type": "Feature",
                "geometry": null,
                "properties": { "stakkenr": "S1" }
            }),
            serde_json::json!({
                "type": "Feature",
                "geometry": { "type": "Polygon", "coordinates": [] },
                "properties": { "stakkenr": "S2" }
            }),
            wfs::point_feature("S3", 1399000.0, 7496000.0),
        ]));

        let labels = labels_from_collection(&c, &source(), &record());
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].label, "S3");
    }

    #[test]
    fn test_empty_collection_yields_no_labels() {
        let c = collection(wfs::empty_collection());
        assert!(labels_from_collection(&c, &source(), &record()).is_empty());
    }
}
