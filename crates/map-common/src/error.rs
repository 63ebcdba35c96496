//! Error types for worksite-maps crates.

use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Primary error type for viewer operations.
#[derive(Debug, Error)]
pub enum MapError {
    // === Request Errors ===
    #[error("Missing record identifier")]
    MissingRecordId,

    #[error("Invalid record identifier: {0}")]
    InvalidRecordId(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    // === Resolution Errors ===
    /// The worksite's primary feature lookup produced nothing: the record is
    /// no longer published upstream. This outcome is terminal for the viewer.
    #[error("Worksite {0} is no longer available")]
    SiteUnavailable(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Upstream response could not be parsed: {0}")]
    UpstreamFormat(String),

    // === Infrastructure Errors ===
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Request timeout")]
    Timeout,
}

impl MapError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            MapError::MissingRecordId
            | MapError::InvalidRecordId(_)
            | MapError::MissingParameter(_)
            | MapError::InvalidParameter { .. } => 400,

            MapError::LayerNotFound(_) => 404,

            // Terminal: the assigned link points at a retired worksite.
            MapError::SiteUnavailable(_) => 410,

            MapError::Upstream(_) | MapError::UpstreamFormat(_) => 502,
            MapError::Timeout => 504,

            _ => 500,
        }
    }

    /// Machine-readable status label carried in JSON error bodies.
    ///
    /// `"unavailable"` marks the terminal no-longer-available outcome so the
    /// viewer can distinguish it from a transient upstream failure.
    pub fn status_label(&self) -> &'static str {
        match self {
            MapError::SiteUnavailable(_) => "unavailable",
            _ => "error",
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::InternalError(format!("JSON error: {}", err))
    }
}

impl From<crate::bbox::BboxParseError> for MapError {
    fn from(err: crate::bbox::BboxParseError) -> Self {
        MapError::InvalidParameter {
            param: "BBOX".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<crate::record::RecordParseError> for MapError {
    fn from(_: crate::record::RecordParseError) -> Self {
        MapError::MissingRecordId
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(MapError::MissingRecordId.http_status_code(), 400);
        assert_eq!(
            MapError::LayerNotFound("veje".to_string()).http_status_code(),
            404
        );
        assert_eq!(
            MapError::SiteUnavailable("ABC123".to_string()).http_status_code(),
            410
        );
        assert_eq!(
            MapError::Upstream("connect refused".to_string()).http_status_code(),
            502
        );
        assert_eq!(MapError::Timeout.http_status_code(), 504);
    }

    #[test]
    fn test_unavailable_is_distinguished_from_error() {
        assert_eq!(
            MapError::SiteUnavailable("ABC123".to_string()).status_label(),
            "unavailable"
        );
        assert_eq!(
            MapError::Upstream("boom".to_string()).status_label(),
            "error"
        );
    }
}
