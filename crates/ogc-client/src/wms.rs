//! Outbound WMS request construction.
//!
//! The viewer never serves WMS itself; these builders assemble GetMap,
//! GetLegendGraphic and GetFeatureInfo URLs against remote services across
//! the protocol versions those services actually run (1.1.0, 1.1.1, 1.3.0).

use map_common::{AxisOrder, BoundingBox, CrsCode};
use url::Url;

use crate::cql::CqlFilter;
use crate::error::OgcError;

/// WMS protocol versions spoken by the upstream services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WmsVersion {
    V1_1_0,
    V1_1_1,
    V1_3_0,
}

impl WmsVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            WmsVersion::V1_1_0 => "1.1.0",
            WmsVersion::V1_1_1 => "1.1.1",
            WmsVersion::V1_3_0 => "1.3.0",
        }
    }

    /// Parse a version string as found in configuration.
    pub fn parse(s: &str) -> Result<Self, OgcError> {
        match s {
            "1.1.0" => Ok(WmsVersion::V1_1_0),
            "1.1.1" => Ok(WmsVersion::V1_1_1),
            "1.3.0" => Ok(WmsVersion::V1_3_0),
            other => Err(OgcError::Decode(format!("Unknown WMS version: {}", other))),
        }
    }

    /// The CRS parameter keyword changed name in 1.3.0.
    pub fn crs_keyword(&self) -> &'static str {
        match self {
            WmsVersion::V1_3_0 => "CRS",
            _ => "SRS",
        }
    }

    /// BBOX axis order for a CRS under this protocol version.
    pub fn axis_order(&self, crs: CrsCode) -> AxisOrder {
        match self {
            WmsVersion::V1_3_0 => crs.axis_order_wms_1_3(),
            _ => crs.axis_order_wms_1_1(),
        }
    }

    /// GetFeatureInfo pixel-coordinate parameter names (I/J since 1.3.0).
    pub fn pixel_keywords(&self) -> (&'static str, &'static str) {
        match self {
            WmsVersion::V1_3_0 => ("I", "J"),
            _ => ("X", "Y"),
        }
    }
}

/// Serialize a bounding box in the axis order the version/CRS pair demands.
pub fn bbox_kvp(version: WmsVersion, crs: CrsCode, bbox: &BoundingBox) -> String {
    match version.axis_order(crs) {
        AxisOrder::XY => bbox.to_wms_string(),
        AxisOrder::LatLon => format!(
            "{},{},{},{}",
            bbox.min_y, bbox.min_x, bbox.max_y, bbox.max_x
        ),
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, OgcError> {
    Url::parse(endpoint).map_err(|e| OgcError::InvalidEndpoint {
        url: endpoint.to_string(),
        message: e.to_string(),
    })
}

/// A GetMap request template for one overlay layer.
///
/// The fixed parts (layer name, format, version, static extras, filter) are
/// set up once from the layer definition; bbox and pixel size vary per tile.
#[derive(Debug, Clone)]
pub struct GetMapRequest {
    pub endpoint: String,
    pub layers: String,
    pub styles: String,
    pub format: String,
    pub transparent: bool,
    pub version: WmsVersion,
    pub crs: CrsCode,
    /// Static extra parameters: auth tokens, vendor options.
    pub extra: Vec<(String, String)>,
    pub cql_filter: Option<CqlFilter>,
}

impl GetMapRequest {
    /// Ordered KVP pairs for one tile request.
    pub fn query_pairs(&self, bbox: &BoundingBox, width: u32, height: u32) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("SERVICE".to_string(), "WMS".to_string()),
            ("VERSION".to_string(), self.version.as_str().to_string()),
            ("REQUEST".to_string(), "GetMap".to_string()),
            ("LAYERS".to_string(), self.layers.clone()),
            ("STYLES".to_string(), self.styles.clone()),
            ("FORMAT".to_string(), self.format.clone()),
            ("TRANSPARENT".to_string(), self.transparent.to_string()),
            (
                self.version.crs_keyword().to_string(),
                self.crs.to_string(),
            ),
            (
                "BBOX".to_string(),
                bbox_kvp(self.version, self.crs, bbox),
            ),
            ("WIDTH".to_string(), width.to_string()),
            ("HEIGHT".to_string(), height.to_string()),
        ];

        for (k, v) in &self.extra {
            pairs.push((k.clone(), v.clone()));
        }
        if let Some(filter) = &self.cql_filter {
            pairs.push(("CQL_FILTER".to_string(), filter.to_string()));
        }

        pairs
    }

    /// Full GetMap URL for one tile request.
    pub fn to_url(&self, bbox: &BoundingBox, width: u32, height: u32) -> Result<Url, OgcError> {
        let mut url = parse_endpoint(&self.endpoint)?;
        url.query_pairs_mut()
            .extend_pairs(self.query_pairs(bbox, width, height));
        Ok(url)
    }
}

/// A GetLegendGraphic request for one layer.
#[derive(Debug, Clone)]
pub struct GetLegendGraphicRequest {
    pub endpoint: String,
    pub layer: String,
    pub format: String,
    pub version: WmsVersion,
    pub extra: Vec<(String, String)>,
}

impl GetLegendGraphicRequest {
    pub fn to_url(&self) -> Result<Url, OgcError> {
        let mut url = parse_endpoint(&self.endpoint)?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("SERVICE", "WMS");
            q.append_pair("VERSION", self.version.as_str());
            q.append_pair("REQUEST", "GetLegendGraphic");
            q.append_pair("LAYER", &self.layer);
            q.append_pair("FORMAT", &self.format);
            for (k, v) in &self.extra {
                q.append_pair(k, v);
            }
        }
        Ok(url)
    }
}

/// A GetFeatureInfo request probing one click position.
#[derive(Debug, Clone)]
pub struct GetFeatureInfoRequest {
    pub endpoint: String,
    pub layers: String,
    pub query_layers: String,
    pub version: WmsVersion,
    pub crs: CrsCode,
    pub info_format: String,
    pub feature_count: u32,
    pub extra: Vec<(String, String)>,
    pub cql_filter: Option<CqlFilter>,
}

impl GetFeatureInfoRequest {
    /// Full GetFeatureInfo URL for a click at pixel `(i, j)` within a map
    /// rendered at `bbox`/`width`/`height`.
    pub fn to_url(
        &self,
        bbox: &BoundingBox,
        width: u32,
        height: u32,
        i: u32,
        j: u32,
    ) -> Result<Url, OgcError> {
        let (ik, jk) = self.version.pixel_keywords();
        let mut url = parse_endpoint(&self.endpoint)?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("SERVICE", "WMS");
            q.append_pair("VERSION", self.version.as_str());
            q.append_pair("REQUEST", "GetFeatureInfo");
            q.append_pair("LAYERS", &self.layers);
            q.append_pair("QUERY_LAYERS", &self.query_layers);
            q.append_pair("STYLES", "");
            q.append_pair(self.version.crs_keyword(), &self.crs.to_string());
            q.append_pair("BBOX", &bbox_kvp(self.version, self.crs, bbox));
            q.append_pair("WIDTH", &width.to_string());
            q.append_pair("HEIGHT", &height.to_string());
            q.append_pair("INFO_FORMAT", &self.info_format);
            q.append_pair("FEATURE_COUNT", &self.feature_count.to_string());
            q.append_pair(ik, &i.to_string());
            q.append_pair(jk, &j.to_string());
            for (k, v) in &self.extra {
                q.append_pair(k, v);
            }
            if let Some(filter) = &self.cql_filter {
                q.append_pair("CQL_FILTER", filter.as_str());
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_value(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn getmap_fixture(version: WmsVersion, crs: CrsCode) -> GetMapRequest {
        GetMapRequest {
            endpoint: "https://maps.example.test/geoserver/wms".to_string(),
            layers: "hdgis:ao".to_string(),
            styles: String::new(),
            format: "image/png".to_string(),
            transparent: true,
            version,
            crs,
            extra: vec![("token".to_string(), "t0".to_string())],
            cql_filter: Some(CqlFilter::raw("pk='ABC123'")),
        }
    }

    #[test]
    fn test_getmap_1_1_0_uses_srs_and_xy_bbox() {
        let req = getmap_fixture(WmsVersion::V1_1_0, CrsCode::Epsg3857);
        let bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        let url = req.to_url(&bbox, 256, 256).unwrap();

        assert_eq!(query_value(&url, "VERSION").unwrap(), "1.1.0");
        assert_eq!(query_value(&url, "SRS").unwrap(), "EPSG:3857");
        assert!(query_value(&url, "CRS").is_none());
        assert_eq!(query_value(&url, "BBOX").unwrap(), "1,2,3,4");
        assert_eq!(query_value(&url, "TRANSPARENT").unwrap(), "true");
        assert_eq!(query_value(&url, "token").unwrap(), "t0");
        assert_eq!(query_value(&url, "CQL_FILTER").unwrap(), "pk='ABC123'");
    }

    #[test]
    fn test_getmap_1_3_0_geographic_swaps_axes() {
        let req = getmap_fixture(WmsVersion::V1_3_0, CrsCode::Epsg4326);
        // lon 8..13, lat 54..58
        let bbox = BoundingBox::new(8.0, 54.0, 13.0, 58.0);
        let url = req.to_url(&bbox, 256, 256).unwrap();

        assert_eq!(query_value(&url, "CRS").unwrap(), "EPSG:4326");
        assert!(query_value(&url, "SRS").is_none());
        // 1.3.0 + EPSG:4326 is lat-first
        assert_eq!(query_value(&url, "BBOX").unwrap(), "54,8,58,13");
    }

    #[test]
    fn test_getmap_1_3_0_projected_keeps_xy() {
        let req = getmap_fixture(WmsVersion::V1_3_0, CrsCode::Epsg3857);
        let bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        let url = req.to_url(&bbox, 256, 256).unwrap();

        assert_eq!(query_value(&url, "BBOX").unwrap(), "1,2,3,4");
    }

    #[test]
    fn test_getmap_preserves_existing_endpoint_query() {
        let mut req = getmap_fixture(WmsVersion::V1_1_1, CrsCode::Epsg3857);
        req.endpoint = "https://maps.example.test/wms?api_key=k1".to_string();
        let url = req
            .to_url(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), 256, 256)
            .unwrap();

        assert_eq!(query_value(&url, "api_key").unwrap(), "k1");
        assert_eq!(query_value(&url, "REQUEST").unwrap(), "GetMap");
    }

    #[test]
    fn test_invalid_endpoint_is_reported() {
        let mut req = getmap_fixture(WmsVersion::V1_1_1, CrsCode::Epsg3857);
        req.endpoint = "not a url".to_string();
        let err = req
            .to_url(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), 256, 256)
            .unwrap_err();
        assert!(matches!(err, OgcError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_legend_url() {
        let req = GetLegendGraphicRequest {
            endpoint: "https://maps.example.test/geoserver/wms".to_string(),
            layer: "hdgis:skovkort".to_string(),
            format: "image/png".to_string(),
            version: WmsVersion::V1_1_0,
            extra: vec![],
        };
        let url = req.to_url().unwrap();

        assert_eq!(query_value(&url, "REQUEST").unwrap(), "GetLegendGraphic");
        assert_eq!(query_value(&url, "LAYER").unwrap(), "hdgis:skovkort");
    }

    #[test]
    fn test_feature_info_pixel_keywords_by_version() {
        let mut req = GetFeatureInfoRequest {
            endpoint: "https://maps.example.test/geoserver/wms".to_string(),
            layers: "hdgis:ao".to_string(),
            query_layers: "hdgis:ao".to_string(),
            version: WmsVersion::V1_1_1,
            crs: CrsCode::Epsg3857,
            info_format: "application/json".to_string(),
            feature_count: 10,
            extra: vec![],
            cql_filter: None,
        };
        let bbox = BoundingBox::new(0.0, 0.0, 100.0, 100.0);

        let url = req.to_url(&bbox, 256, 256, 10, 20).unwrap();
        assert_eq!(query_value(&url, "X").unwrap(), "10");
        assert_eq!(query_value(&url, "Y").unwrap(), "20");
        assert!(query_value(&url, "I").is_none());

        req.version = WmsVersion::V1_3_0;
        let url = req.to_url(&bbox, 256, 256, 10, 20).unwrap();
        assert_eq!(query_value(&url, "I").unwrap(), "10");
        assert_eq!(query_value(&url, "J").unwrap(), "20");
        assert!(query_value(&url, "X").is_none());
    }
}
