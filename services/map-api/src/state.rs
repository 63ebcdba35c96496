//! Application state and shared resources.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use ogc_client::WfsClient;
use viewer_core::{
    BaseMapSelector, ExtentResolver, LayerOverride, LayerRegistry, RegistryOverrides,
};

use crate::config::ServiceConfig;
use crate::metrics::MetricsCollector;

/// Layers whose public endpoints require the service token.
const TOKEN_LAYERS: [&str; 2] = ["skaermkort", "ortofoto"];

/// Shared application state.
pub struct AppState {
    pub registry: LayerRegistry,
    pub resolver: ExtentResolver,
    pub basemap: BaseMapSelector,
    pub wfs: WfsClient,
    pub http: reqwest::Client,
    pub contact_email: String,
    pub metrics: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let mut registry = LayerRegistry::builtin();

        // The built-in registry ships without tokens; the configured one is
        // attached here, then per-layer overrides get the last word.
        if let Some(token) = &config.wms_token {
            let token_overrides = RegistryOverrides {
                layers: TOKEN_LAYERS
                    .iter()
                    .map(|id| LayerOverride {
                        id: (*id).to_string(),
                        token: Some(token.clone()),
                        ..Default::default()
                    })
                    .collect(),
            };
            registry.apply_overrides(&token_overrides);
        }
        registry.apply_overrides(&config.registry);

        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout())
            .connect_timeout(Duration::from_secs(10))
            .tcp_nodelay(true)
            .build()?;
        let wfs = WfsClient::with_client(http.clone());

        let resolver =
            ExtentResolver::standard(wfs.clone()).with_default_extent(config.default_extent());

        let mut basemap = BaseMapSelector::standard();
        if let Some(credentials) = &config.datafordeler {
            basemap.set_fallback_credentials(&credentials.username, &credentials.password);
        }

        Ok(Self {
            registry,
            resolver,
            basemap,
            wfs,
            http,
            contact_email: config.contact_email().to_string(),
            metrics: Arc::new(MetricsCollector::new()),
        })
    }
}
