//! Base-map source selection with fallback.
//!
//! The primary tile service is probed with a HEAD request against a known
//! tile before a view is served; on failure the credentialed fallback service
//! takes over. The selection is advisory presentation data, so probing never
//! fails the view.

use serde::Serialize;
use tracing::{debug, warn};

/// Credentials for a credentialed tile service, injected from configuration.
#[derive(Debug, Clone)]
pub struct BaseMapCredentials {
    pub username: String,
    pub password: String,
}

/// One base-map tile source.
#[derive(Debug, Clone)]
pub struct BaseMapSource {
    pub id: String,
    /// Tile URL template with `{z}`/`{x}`/`{y}` placeholders.
    pub url_template: String,
    /// Concrete tile fetched to check availability.
    pub probe_url: Option<String>,
    pub attribution: String,
    pub max_zoom: u8,
    pub credentials: Option<BaseMapCredentials>,
}

impl BaseMapSource {
    /// The tile template the map client uses, credentials appended.
    pub fn tile_url(&self) -> String {
        match &self.credentials {
            Some(c) => {
                let sep = if self.url_template.contains('?') { '&' } else { '?' };
                format!(
                    "{}{}username={}&password={}",
                    self.url_template, sep, c.username, c.password
                )
            }
            None => self.url_template.clone(),
        }
    }
}

/// The selected base map, sent to the embedded viewer as-is.
#[derive(Debug, Clone, Serialize)]
pub struct BaseLayerChoice {
    pub source_id: String,
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
    pub reason: String,
}

fn choice_from(source: &BaseMapSource, reason: String) -> BaseLayerChoice {
    BaseLayerChoice {
        source_id: source.id.clone(),
        url_template: source.tile_url(),
        attribution: source.attribution.clone(),
        max_zoom: source.max_zoom,
        reason,
    }
}

enum ProbeResult {
    Available,
    Unavailable(String),
}

// ============================================================================
// Selector
// ============================================================================

/// Probes the primary source and picks primary or fallback.
#[derive(Debug, Clone)]
pub struct BaseMapSelector {
    primary: BaseMapSource,
    fallback: Option<BaseMapSource>,
}

impl BaseMapSelector {
    pub fn new(primary: BaseMapSource, fallback: Option<BaseMapSource>) -> Self {
        Self { primary, fallback }
    }

    /// The standard pair: the public Dataforsyningen tile service backed by
    /// the credentialed Datafordeler WMTS service.
    pub fn standard() -> Self {
        let primary = BaseMapSource {
            id: "dataforsyningen".to_string(),
            url_template: "https://api.dataforsyningen.dk/topo_skaermkort_DAF/{z}/{x}/{y}.png"
                .to_string(),
            probe_url: Some(
                "https://api.dataforsyningen.dk/topo_skaermkort_DAF/1/1/1.png".to_string(),
            ),
            attribution: "Dataforsyningen".to_string(),
            max_zoom: 19,
            credentials: None,
        };
        let fallback = BaseMapSource {
            id: "datafordeler".to_string(),
            url_template: "https://services.datafordeler.dk/Dkskaermkort/topo_skaermkort_wmts/1.0.0/wmts?SERVICE=WMTS&REQUEST=GetTile&VERSION=1.0.0&LAYER=topo_skaermkort&STYLE=default&FORMAT=image/png&TILEMATRIXSET=View1&TILEMATRIX={z}&TILEROW={y}&TILECOL={x}"
                .to_string(),
            probe_url: None,
            attribution: "Datafordeler".to_string(),
            max_zoom: 19,
            credentials: None,
        };
        Self::new(primary, Some(fallback))
    }

    /// Inject fallback-service credentials from configuration.
    pub fn set_fallback_credentials(&mut self, username: &str, password: &str) {
        if let Some(fallback) = self.fallback.as_mut() {
            fallback.credentials = Some(BaseMapCredentials {
                username: username.to_string(),
                password: password.to_string(),
            });
        }
    }

    pub fn primary(&self) -> &BaseMapSource {
        &self.primary
    }

    /// Probe the primary source and pick the base map for a view.
    pub async fn select(&self, client: &reqwest::Client) -> BaseLayerChoice {
        match self.probe_primary(client).await {
            ProbeResult::Available => {
                debug!(source = %self.primary.id, "Base map probe succeeded");
                choice_from(&self.primary, format!("Using {} tiles", self.primary.id))
            }
            ProbeResult::Unavailable(detail) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        primary = %self.primary.id,
                        fallback = %fallback.id,
                        detail = %detail,
                        "Primary base map unavailable, using fallback"
                    );
                    choice_from(
                        fallback,
                        format!("Falling back to {} ({})", fallback.id, detail),
                    )
                }
                None => {
                    warn!(
                        primary = %self.primary.id,
                        detail = %detail,
                        "Primary base map unavailable and no fallback configured"
                    );
                    choice_from(
                        &self.primary,
                        format!("Using {} tiles ({})", self.primary.id, detail),
                    )
                }
            },
        }
    }

    async fn probe_primary(&self, client: &reqwest::Client) -> ProbeResult {
        let Some(probe_url) = &self.primary.probe_url else {
            return ProbeResult::Available;
        };
        match client.head(probe_url).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => ProbeResult::Available,
            Ok(response) => ProbeResult::Unavailable(format!(
                "probe returned status {}",
                response.status().as_u16()
            )),
            Err(e) => ProbeResult::Unavailable(format!("probe failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_sources() {
        let selector = BaseMapSelector::standard();
        assert_eq!(selector.primary().id, "dataforsyningen");
        assert!(selector.primary().probe_url.is_some());

        let fallback = selector.fallback.as_ref().unwrap();
        assert_eq!(fallback.id, "datafordeler");
        assert!(fallback.url_template.contains("TILEMATRIX={z}"));
        // No credentials until configuration injects them.
        assert!(fallback.credentials.is_none());
    }

    #[test]
    fn test_tile_url_appends_credentials() {
        let mut selector = BaseMapSelector::standard();
        selector.set_fallback_credentials("user1", "pass1");

        let fallback = selector.fallback.as_ref().unwrap();
        let url = fallback.tile_url();
        assert!(url.ends_with("&username=user1&password=pass1"), "{}", url);

        // A template without a query starts one.
        let plain = BaseMapSource {
            id: "x".to_string(),
            url_template: "https://tiles.example.test/{z}/{x}/{y}.png".to_string(),
            probe_url: None,
            attribution: String::new(),
            max_zoom: 19,
            credentials: Some(BaseMapCredentials {
                username: "u".to_string(),
                password: "p".to_string(),
            }),
        };
        assert!(plain.tile_url().contains("?username=u&password=p"));
    }

    #[tokio::test]
    async fn test_probe_failure_selects_fallback() {
        let mut selector = BaseMapSelector::standard();
        // Point the probe at a closed local port so it fails fast.
        selector.primary.probe_url = Some("http://127.0.0.1:9/1/1/1.png".to_string());

        let client = reqwest::Client::new();
        let choice = selector.select(&client).await;
        assert_eq!(choice.source_id, "datafordeler");
        assert!(choice.reason.starts_with("Falling back"));
    }

    #[tokio::test]
    async fn test_probe_failure_without_fallback_keeps_primary() {
        let mut selector = BaseMapSelector::standard();
        selector.primary.probe_url = Some("http://127.0.0.1:9/1/1/1.png".to_string());
        selector.fallback = None;

        let client = reqwest::Client::new();
        let choice = selector.select(&client).await;
        assert_eq!(choice.source_id, "dataforsyningen");
    }

    #[tokio::test]
    async fn test_no_probe_url_selects_primary_without_probing() {
        let mut selector = BaseMapSelector::standard();
        selector.primary.probe_url = None;

        let client = reqwest::Client::new();
        let choice = selector.select(&client).await;
        assert_eq!(choice.source_id, "dataforsyningen");
        assert_eq!(choice.reason, "Using dataforsyningen tiles");
    }
}
