use serde::Serialize;
use thiserror::Error;

/// Status reported when no HTTP error status is available.
pub const DEFAULT_ERROR_STATUS: u16 = 500;

/// Message reported when a failure carries no description at all.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown API error";

/// The single failure shape returned by every request operation.
///
/// Transport failures, HTTP error statuses and undecodable responses are all
/// collapsed into this type at the gateway boundary, so callers can render
/// them uniformly.
///
/// # Example
///
/// ```ignore
/// match client.ask_text("How do I treat leaf rust?").await {
///     Ok(reply) => println!("{}", reply.analysis),
///     Err(ApiError { status: 413, message }) => eprintln!("image too large: {message}"),
///     Err(err) => eprintln!("{err}"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("API error (HTTP {status}): {message}")]
pub struct ApiError {
    /// HTTP status code, or 500 when the server never answered with one
    pub status: u16,
    /// Server-supplied `detail`, or a description of the underlying failure
    pub message: String,
}

impl ApiError {
    /// Creates an error, substituting the fallback message for an empty one.
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        };
        Self { status, message }
    }

    /// Returns `true` for 4xx statuses.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Returns `true` for 5xx statuses, including normalized transport failures.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

/// Errors raised while constructing a client.
///
/// These never come out of a request operation; they only surface from
/// [`ClientBuilder::build`](crate::ClientBuilder::build).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
    /// The TLS backend or connection pool could not be initialized.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// Native failures of the transport, before normalization.
///
/// Crate-private: every variant is turned into an [`ApiError`] by
/// [`TransportError::normalize`] before leaving the gateway.
#[derive(Debug, Error)]
pub(crate) enum TransportError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: String },
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Io(String),
}

impl TransportError {
    /// Collapses this failure into the normalized `{status, message}` shape.
    ///
    /// Only an error status answered by the server keeps its code; every
    /// other failure reports 500. The message prefers a `detail` field from
    /// the error body and otherwise falls back to this error's description.
    pub(crate) fn normalize(self) -> ApiError {
        match self {
            Self::Status { status, ref body } => match extract_detail(body) {
                Some(detail) => ApiError::new(status, detail),
                None => ApiError::new(status, self.to_string()),
            },
            other => ApiError::new(DEFAULT_ERROR_STATUS, other.to_string()),
        }
    }
}

/// Pulls the `detail` field out of an error body, if the body is a JSON
/// object carrying one.
///
/// String details are returned verbatim; structured details (such as a list
/// of validation failures) are rendered as compact JSON. A `null` or empty
/// detail counts as absent.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let error = ApiError::new(422, "bad image");
        assert_eq!(error.to_string(), "API error (HTTP 422): bad image");
    }

    #[test]
    fn test_api_error_empty_message_falls_back() {
        let error = ApiError::new(502, "   ");
        assert_eq!(error.message, UNKNOWN_ERROR_MESSAGE);
        assert_eq!(error.status, 502);
    }

    #[test]
    fn test_api_error_status_classes() {
        assert!(ApiError::new(404, "missing").is_client_error());
        assert!(!ApiError::new(404, "missing").is_server_error());
        assert!(ApiError::new(503, "down").is_server_error());
        assert!(!ApiError::new(200, "odd").is_client_error());
    }

    #[test]
    fn test_api_error_serializes_as_status_and_message() {
        let json = serde_json::to_value(ApiError::new(413, "File too large")).unwrap();
        assert_eq!(json, serde_json::json!({"status": 413, "message": "File too large"}));
    }

    #[test]
    fn test_extract_detail_string() {
        assert_eq!(
            extract_detail(r#"{"detail": "bad image"}"#).as_deref(),
            Some("bad image")
        );
    }

    #[test]
    fn test_extract_detail_structured() {
        let body = r#"{"detail": [{"loc": ["body", "query"], "msg": "field required"}]}"#;
        let detail = extract_detail(body).unwrap();
        assert!(detail.starts_with('['));
        assert!(detail.contains("field required"));
    }

    #[test]
    fn test_extract_detail_absent() {
        assert_eq!(extract_detail(""), None);
        assert_eq!(extract_detail("Internal Server Error"), None);
        assert_eq!(extract_detail(r#"{"error": "nope"}"#), None);
        assert_eq!(extract_detail(r#"{"detail": null}"#), None);
        assert_eq!(extract_detail(r#"{"detail": ""}"#), None);
        assert_eq!(extract_detail(r#"["detail"]"#), None);
    }

    #[test]
    fn test_normalize_status_with_detail() {
        let error = TransportError::Status {
            status: 422,
            body: r#"{"detail": "bad image"}"#.to_string(),
        }
        .normalize();
        assert_eq!(error, ApiError::new(422, "bad image"));
    }

    #[test]
    fn test_normalize_status_without_detail() {
        let error = TransportError::Status {
            status: 503,
            body: String::new(),
        }
        .normalize();
        assert_eq!(error.status, 503);
        assert_eq!(error.message, "Request failed with status code 503");
    }

    #[test]
    fn test_normalize_decode_failure_reports_500() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let error = TransportError::Decode(json_err).normalize();
        assert_eq!(error.status, DEFAULT_ERROR_STATUS);
        assert!(error.message.starts_with("Invalid response body"));
    }

    #[test]
    fn test_normalize_io_failure() {
        let error = TransportError::Io("Failed to read file 'leaf.png'".to_string()).normalize();
        assert_eq!(error.status, 500);
        assert!(error.message.contains("leaf.png"));
    }

    #[test]
    fn test_normalize_empty_io_message_uses_fallback() {
        let error = TransportError::Io(String::new()).normalize();
        assert_eq!(error.message, UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::InvalidBaseUrl {
            url: "not a url".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("not a url"));
        assert!(display.contains("relative URL"));
    }
}
