//! Common test fixtures for worksite-maps tests.
//!
//! This module provides pre-built WFS GetFeature responses and coordinate
//! constants covering the scenarios the resolver and label code deal with.

/// Sample record identifiers.
pub mod records {
    /// Single-key identifier (`pk` schema)
    pub const SINGLE: &str = "ABC123";

    /// Legacy underscore-joined identifier (`blockid_workingsiteid` schema)
    pub const LEGACY: &str = "B42_WS7";
}

/// Coordinate constants used across tests.
pub mod coords {
    /// A point near central Denmark in Web Mercator meters
    pub const DK_3857: (f64, f64) = (1399000.0, 7496000.0);

    /// A worksite-sized box in Web Mercator meters (xmin, ymin, xmax, ymax)
    pub const DK_BOX_3857: (f64, f64, f64, f64) =
        (1393891.0, 7496404.0, 1405765.0, 7508620.0);
}

/// Builders for WFS GetFeature JSON responses.
///
/// Upstream GeoServer instances reply with GeoJSON feature collections;
/// numeric attributes sometimes arrive as JSON strings, which
/// [`numeric_strings`](wfs::numeric_strings) reproduces.
pub mod wfs {
    use serde_json::{json, Value};

    /// An empty feature collection (site not found).
    pub fn empty_collection() -> Value {
        json!({
            "type": "FeatureCollection",
            "totalFeatures": 0,
            "features": []
        })
    }

    /// Wrap features into a GetFeature response body.
    pub fn feature_collection(features: Vec<Value>) -> Value {
        json!({
            "type": "FeatureCollection",
            "totalFeatures": features.len(),
            "features": features
        })
    }

    /// A stand feature carrying worksite attributes and a projected box.
    pub fn stand_feature(name: &str, site_id: &str, bbox: (f64, f64, f64, f64)) -> Value {
        json!({
            "type": "Feature",
            "id": format!("DynamicMapStands.{}", site_id),
            "geometry": null,
            "properties": {
                "workingsitename": name,
                "workingsiteid": site_id,
                "xmin": bbox.0,
                "ymin": bbox.1,
                "xmax": bbox.2,
                "ymax": bbox.3
            }
        })
    }

    /// A points feature with a timestamp and a projected box.
    pub fn point_summary_feature(
        name: &str,
        site_id: &str,
        timestamp: &str,
        bbox: (f64, f64, f64, f64),
    ) -> Value {
        json!({
            "type": "Feature",
            "id": format!("DynamicMapPoints.{}", site_id),
            "geometry": null,
            "properties": {
                "workingsitename": name,
                "workingsiteid": site_id,
                "timestamp": timestamp,
                "xmin": bbox.0,
                "ymin": bbox.1,
                "xmax": bbox.2,
                "ymax": bbox.3
            }
        })
    }

    /// A point geometry feature (one marker) in Web Mercator.
    pub fn point_feature(label: &str, x: f64, y: f64) -> Value {
        json!({
            "type": "Feature",
            "id": format!("DynamicMapPoints.{}", label),
            "geometry": {
                "type": "Point",
                "coordinates": [x, y]
            },
            "properties": {
                "stakkenr": label
            }
        })
    }

    /// Rewrite every numeric property of every feature into a JSON string.
    pub fn numeric_strings(mut collection: Value) -> Value {
        if let Some(features) = collection
            .get_mut("features")
            .and_then(|f| f.as_array_mut())
        {
            for feature in features {
                if let Some(props) = feature
                    .get_mut("properties")
                    .and_then(|p| p.as_object_mut())
                {
                    for (_, v) in props.iter_mut() {
                        if let Some(n) = v.as_f64() {
                            *v = Value::String(n.to_string());
                        }
                    }
                }
            }
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stand_feature_shape() {
        let f = wfs::stand_feature("Nordskoven", "WS7", coords::DK_BOX_3857);
        assert_eq!(f["properties"]["workingsitename"], "Nordskoven");
        assert_eq!(f["properties"]["xmin"], 1393891.0);
        assert!(f["geometry"].is_null());
    }

    #[test]
    fn test_collection_counts_features() {
        let c = wfs::feature_collection(vec![wfs::point_feature("S1", 0.0, 0.0)]);
        assert_eq!(c["totalFeatures"], 1);
        assert_eq!(c["features"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_numeric_strings_rewrites_numbers() {
        let c = wfs::numeric_strings(wfs::feature_collection(vec![wfs::stand_feature(
            "X",
            "1",
            (1.0, 2.0, 3.0, 4.0),
        )]));
        assert_eq!(c["features"][0]["properties"]["xmin"], "1");
        assert_eq!(c["features"][0]["properties"]["xmax"], "3");
    }
}
