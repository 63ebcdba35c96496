//! Common utilities shared across viewer API handlers.

use axum::{
    http::{header, StatusCode},
    response::Response,
};
use serde::Serialize;

use map_common::{MapError, RecordRef};

// ============================================================================
// Error Bodies
// ============================================================================

/// JSON body carried by every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

/// Render a MapError as a JSON error response.
///
/// The terminal no-longer-available outcome carries the contact address so
/// the viewer can tell the user who can issue a fresh link.
pub fn error_response(err: &MapError, contact_email: &str) -> Response {
    let contact = if matches!(err, MapError::SiteUnavailable(_)) {
        Some(contact_email.to_string())
    } else {
        None
    };
    let body = ErrorBody {
        status: err.status_label(),
        message: err.to_string(),
        contact_email: contact,
    };
    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(serde_json::to_string(&body).unwrap_or_default().into())
        .unwrap()
}

// ============================================================================
// Parameter Parsing
// ============================================================================

/// Parse the record path segment, mapping failure to the 400 error body.
pub fn parse_record(segment: &str, contact_email: &str) -> Result<RecordRef, Response> {
    RecordRef::parse(segment).map_err(|e| error_response(&MapError::from(e), contact_email))
}

/// Require a finite numeric query parameter.
pub fn require_finite(param: &str, value: Option<f64>) -> Result<f64, MapError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(MapError::InvalidParameter {
            param: param.to_string(),
            message: "must be a finite number".to_string(),
        }),
        None => Err(MapError::MissingParameter(param.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_body_carries_contact_email() {
        let err = MapError::SiteUnavailable("ABC123".to_string());
        let response = error_response(&err, "skov@example.test");
        assert_eq!(response.status(), StatusCode::GONE);

        let body = ErrorBody {
            status: err.status_label(),
            message: err.to_string(),
            contact_email: Some("skov@example.test".to_string()),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"status\":\"unavailable\""));
        assert!(json.contains("skov@example.test"));
    }

    #[test]
    fn test_other_errors_omit_contact_email() {
        let err = MapError::Upstream("connect refused".to_string());
        let response = error_response(&err, "skov@example.test");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = ErrorBody {
            status: err.status_label(),
            message: err.to_string(),
            contact_email: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("contact_email"));
    }

    #[test]
    fn test_parse_record_rejects_blank_segment() {
        let response = parse_record("   ", "x@example.test").unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(parse_record("ABC123", "x@example.test").is_ok());
    }

    #[test]
    fn test_require_finite() {
        assert_eq!(require_finite("lat", Some(55.5)).unwrap(), 55.5);
        assert!(matches!(
            require_finite("lat", None).unwrap_err(),
            MapError::MissingParameter(_)
        ));
        assert!(matches!(
            require_finite("lat", Some(f64::NAN)).unwrap_err(),
            MapError::InvalidParameter { .. }
        ));
    }
}
