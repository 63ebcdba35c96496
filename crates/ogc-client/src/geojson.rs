//! Minimal GeoJSON types for WFS GetFeature responses.
//!
//! Upstream GeoServer instances are loose with attribute types: numeric
//! fields arrive as JSON numbers or as strings depending on the source
//! table, and `properties` may be null. The accessors here absorb both.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A WFS GetFeature response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub collection_type: String,

    #[serde(default)]
    pub features: Vec<Feature>,

    #[serde(rename = "totalFeatures", default, skip_serializing_if = "Option::is_none")]
    pub total_features: Option<u64>,
}

impl FeatureCollection {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// The first (representative) feature, if any.
    pub fn first(&self) -> Option<&Feature> {
        self.features.first()
    }
}

/// A single GeoJSON feature.
///
/// Feature ids and CRS members are ignored; the viewer only reads
/// geometries and properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,

    #[serde(default)]
    pub properties: Option<serde_json::Map<String, Value>>,
}

impl Feature {
    /// Raw property value by name.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }

    /// String property by name.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(|v| v.as_str())
    }

    /// Numeric property by name, accepting both JSON numbers and numeric
    /// strings. Returns whatever parses, including non-finite values; it is
    /// the caller's job to validate finiteness.
    pub fn property_f64(&self, key: &str) -> Option<f64> {
        match self.property(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Feature geometry; only the parts the viewer reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub geometry_type: String,

    #[serde(default)]
    pub coordinates: Value,
}

impl Geometry {
    /// Extract `(x, y)` from a Point geometry.
    pub fn point_coordinates(&self) -> Option<(f64, f64)> {
        if self.geometry_type != "Point" {
            return None;
        }
        let coords = self.coordinates.as_array()?;
        let x = coords.first()?.as_f64()?;
        let y = coords.get(1)?.as_f64()?;
        Some((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::{coords, wfs};

    fn parse(v: serde_json::Value) -> FeatureCollection {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_parse_stand_response() {
        let c = parse(wfs::feature_collection(vec![wfs::stand_feature(
            "Nordskoven",
            "WS7",
            coords::DK_BOX_3857,
        )]));

        assert_eq!(c.len(), 1);
        let f = c.first().unwrap();
        assert_eq!(f.property_str("workingsitename"), Some("Nordskoven"));
        assert_eq!(f.property_f64("xmin"), Some(1393891.0));
        assert!(f.geometry.is_none());
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let c = parse(wfs::numeric_strings(wfs::feature_collection(vec![
            wfs::stand_feature("X", "1", (1.5, 2.0, 3.0, 4.0)),
        ])));

        let f = c.first().unwrap();
        assert_eq!(f.property_f64("xmin"), Some(1.5));
        assert_eq!(f.property_f64("ymax"), Some(4.0));
    }

    #[test]
    fn test_non_numeric_string_yields_none() {
        let c = parse(wfs::feature_collection(vec![serde_json::json!({
            "type": "Feature",
            "geometry": null,
            "properties": { "xmin": "n/a", "note": true }
        })]));

        let f = c.first().unwrap();
        assert_eq!(f.property_f64("xmin"), None);
        assert_eq!(f.property_f64("note"), None);
        assert_eq!(f.property_f64("missing"), None);
    }

    #[test]
    fn test_null_properties_tolerated() {
        let c = parse(serde_json::json!({
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "geometry": null, "properties": null }]
        }));

        assert_eq!(c.first().unwrap().property_str("anything"), None);
    }

    #[test]
    fn test_point_coordinates() {
        let c = parse(wfs::feature_collection(vec![wfs::point_feature(
            "S1", 1399000.5, 7496000.5,
        )]));

        let g = c.first().unwrap().geometry.as_ref().unwrap();
        assert_eq!(g.point_coordinates(), Some((1399000.5, 7496000.5)));
    }

    #[test]
    fn test_empty_collection() {
        let c = parse(wfs::empty_collection());
        assert!(c.is_empty());
        assert_eq!(c.total_features, Some(0));
    }
}
