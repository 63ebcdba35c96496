//! Error types for outbound OGC requests.

use map_common::MapError;
use thiserror::Error;

/// Errors raised while building or executing upstream OGC requests.
#[derive(Debug, Error)]
pub enum OgcError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status} for {url}")]
    BadStatus { status: u16, url: String },

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    #[error("Invalid endpoint URL '{url}': {message}")]
    InvalidEndpoint { url: String, message: String },
}

impl From<OgcError> for MapError {
    fn from(err: OgcError) -> Self {
        match err {
            OgcError::Request(e) if e.is_timeout() => MapError::Timeout,
            OgcError::Decode(message) => MapError::UpstreamFormat(message),
            other => MapError::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_maps_to_upstream_format() {
        let err: MapError = OgcError::Decode("not json".to_string()).into();
        assert!(matches!(err, MapError::UpstreamFormat(_)));
        assert_eq!(err.http_status_code(), 502);
    }

    #[test]
    fn test_bad_status_maps_to_upstream() {
        let err: MapError = OgcError::BadStatus {
            status: 500,
            url: "http://example.test/wfs".to_string(),
        }
        .into();
        assert!(matches!(err, MapError::Upstream(_)));
    }
}
