//! Service configuration.
//!
//! Merged from an optional YAML file plus environment variables. Secrets
//! (service tokens, fallback credentials) are never baked into the binary;
//! they only ever arrive through these two channels.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use map_common::{Extent, MapError, MapResult};
use viewer_core::{RegistryOverrides, DEFAULT_EXTENT};

const DEFAULT_CONTACT_EMAIL: &str = "skov@dalgas.com";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 15;

/// Deployment configuration for the viewer service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    /// Contact address shown with the terminal "no longer available" notice.
    #[serde(default)]
    pub contact_email: Option<String>,

    /// Token appended to the public map services that require one.
    #[serde(default)]
    pub wms_token: Option<String>,

    /// Credentials for the fallback base-map service.
    #[serde(default)]
    pub datafordeler: Option<CredentialsConfig>,

    /// Fallback view extent when a worksite carries no usable box.
    #[serde(default)]
    pub default_extent: Option<ExtentConfig>,

    /// Upstream request timeout in seconds.
    #[serde(default)]
    pub upstream_timeout_secs: Option<u64>,

    /// Per-layer registry overrides.
    #[serde(default)]
    pub registry: RegistryOverrides,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ExtentConfig {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl ExtentConfig {
    pub fn to_extent(self) -> Extent {
        Extent::from_corners(self.south, self.west, self.north, self.east)
    }
}

impl ServiceConfig {
    /// Load the configuration: YAML file when given, then environment
    /// variables for anything still unset.
    pub fn load(path: Option<&Path>) -> MapResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        info!(
            config_file = path.map(|p| p.display().to_string()).unwrap_or_default(),
            has_wms_token = config.wms_token.is_some(),
            has_fallback_credentials = config.datafordeler.is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> MapResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            MapError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&contents).map_err(|e| {
            MapError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Fill unset fields from an environment-like lookup.
    pub fn apply_env_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if self.contact_email.is_none() {
            self.contact_email = get("CONTACT_EMAIL");
        }
        if self.wms_token.is_none() {
            self.wms_token = get("WMS_TOKEN");
        }
        if self.datafordeler.is_none() {
            if let (Some(username), Some(password)) = (
                get("DATAFORDELER_USERNAME"),
                get("DATAFORDELER_PASSWORD"),
            ) {
                self.datafordeler = Some(CredentialsConfig { username, password });
            }
        }
    }

    pub fn contact_email(&self) -> &str {
        self.contact_email.as_deref().unwrap_or(DEFAULT_CONTACT_EMAIL)
    }

    pub fn default_extent(&self) -> Extent {
        self.default_extent
            .map(ExtentConfig::to_extent)
            .unwrap_or(DEFAULT_EXTENT)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(
            self.upstream_timeout_secs
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        )
    }
}
