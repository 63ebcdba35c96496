//! Outbound WFS 1.0.0 GetFeature requests.

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::cql::CqlFilter;
use crate::error::OgcError;
use crate::geojson::FeatureCollection;

/// A WFS GetFeature request with GeoJSON output.
#[derive(Debug, Clone)]
pub struct GetFeatureRequest {
    pub endpoint: String,
    /// Qualified feature type, e.g. "hdgis:DynamicMapStands".
    pub type_name: String,
    pub max_features: Option<u32>,
    pub cql_filter: Option<CqlFilter>,
    /// Static extra parameters: auth tokens.
    pub extra: Vec<(String, String)>,
}

impl GetFeatureRequest {
    pub fn new(endpoint: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            type_name: type_name.into(),
            max_features: None,
            cql_filter: None,
            extra: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: CqlFilter) -> Self {
        self.cql_filter = Some(filter);
        self
    }

    pub fn with_max_features(mut self, max: u32) -> Self {
        self.max_features = Some(max);
        self
    }

    /// Full GetFeature URL.
    pub fn to_url(&self) -> Result<Url, OgcError> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| OgcError::InvalidEndpoint {
            url: self.endpoint.clone(),
            message: e.to_string(),
        })?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("SERVICE", "WFS");
            q.append_pair("VERSION", "1.0.0");
            q.append_pair("REQUEST", "GetFeature");
            q.append_pair("typeName", &self.type_name);
            q.append_pair("outputFormat", "application/json");
            if let Some(max) = self.max_features {
                q.append_pair("maxFeatures", &max.to_string());
            }
            if let Some(filter) = &self.cql_filter {
                q.append_pair("CQL_FILTER", filter.as_str());
            }
            for (k, v) in &self.extra {
                q.append_pair(k, v);
            }
        }
        Ok(url)
    }
}

/// HTTP client for WFS feature queries.
#[derive(Debug, Clone)]
pub struct WfsClient {
    client: reqwest::Client,
}

impl WfsClient {
    /// Create a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, OgcError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .tcp_nodelay(true)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client (shared connection pool).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Execute a GetFeature request and decode the GeoJSON body.
    pub async fn get_features(
        &self,
        request: &GetFeatureRequest,
    ) -> Result<FeatureCollection, OgcError> {
        let url = request.to_url()?;
        debug!(type_name = %request.type_name, url = %url, "WFS GetFeature");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OgcError::BadStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // GeoServer reports filter errors as XML with a 200 status; surface
        // those as decode failures rather than panicking on json().
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            OgcError::Decode(format!(
                "GetFeature response for {} was not GeoJSON: {}",
                request.type_name, e
            ))
        })
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

    #[test]
    fn test_get_feature_url() {
        let req = GetFeatureRequest::new(
            "https://maps.example.test/geoserver/hdgis/wms",
            "hdgis:DynamicMapStands",
        )
        .with_max_features(1)
        .with_filter(CqlFilter::raw("pk='ABC123'"));

        let url = req.to_url().unwrap();
        assert_eq!(query_value(&url, "SERVICE").unwrap(), "WFS");
        assert_eq!(query_value(&url, "VERSION").unwrap(), "1.0.0");
        assert_eq!(query_value(&url, "REQUEST").unwrap(), "GetFeature");
        assert_eq!(
            query_value(&url, "typeName").unwrap(),
            "hdgis:DynamicMapStands"
        );
        assert_eq!(
            query_value(&url, "outputFormat").unwrap(),
            "application/json"
        );
        assert_eq!(query_value(&url, "maxFeatures").unwrap(), "1");
        assert_eq!(query_value(&url, "CQL_FILTER").unwrap(), "pk='ABC123'");
    }

    #[test]
    fn test_optional_parameters_omitted() {
        let req = GetFeatureRequest::new(
            "https://maps.example.test/geoserver/hdgis/wms",
            "hdgis:DynamicMapPoints",
        );
        let url = req.to_url().unwrap();

        assert!(query_value(&url, "maxFeatures").is_none());
        assert!(query_value(&url, "CQL_FILTER").is_none());
    }

    #[test]
    fn test_extra_parameters_appended() {
        let mut req = GetFeatureRequest::new(
            "https://maps.example.test/geoserver/hdgis/wms",
            "hdgis:DynamicMapPoints",
        );
        req.extra.push(("token".to_string(), "t0".to_string()));
        let url = req.to_url().unwrap();

        assert_eq!(query_value(&url, "token").unwrap(), "t0");
    }
}
