use reqwest::Method;

/// Name of the form field carrying the session identifier.
pub const SESSION_FIELD: &str = "session_id";
/// Name of the form field carrying the trimmed question text.
pub const QUERY_FIELD: &str = "query";
/// Name of the form field carrying the attached image.
pub const FILE_FIELD: &str = "file";

/// Backend routes reachable through the gateway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endpoint {
    /// Text-only question
    AskText,
    /// Image-only diagnosis
    AskImage,
    /// Question with an optional image
    AskChat,
    /// Current conditions at a coordinate
    CurrentWeather { lat: f64, lon: f64 },
    /// Service liveness and model info
    Health,
}

impl Endpoint {
    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Self::AskText | Self::AskImage | Self::AskChat => Method::POST,
            Self::CurrentWeather { .. } | Self::Health => Method::GET,
        }
    }

    /// URL path for this endpoint, relative to the base URL.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::AskText => "/ask/text",
            Self::AskImage => "/ask/image",
            Self::AskChat => "/ask/chat",
            Self::CurrentWeather { .. } => "/weather/current",
            Self::Health => "/health/",
        }
    }

    /// Query parameters for this endpoint, unencoded.
    #[must_use]
    pub fn query_params(&self) -> Vec<(String, String)> {
        match self {
            Self::CurrentWeather { lat, lon } => vec![
                ("lat".to_string(), lat.to_string()),
                ("lon".to_string(), lon.to_string()),
            ],
            _ => Vec::new(),
        }
    }

    /// Whether requests to this endpoint carry a multipart form.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::AskText | Self::AskImage | Self::AskChat)
    }
}

/// Joins a base URL, a path and query parameters into a full URL.
///
/// `base_url` is expected without a trailing slash. Query keys and values
/// are percent-encoded.
#[must_use]
pub fn construct_url(base_url: &str, path: &str, query: &[(String, String)]) -> String {
    let query_string = if query.is_empty() {
        String::new()
    } else {
        let parts: Vec<String> = query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("?{}", parts.join("&"))
    };

    format!("{base_url}{path}{query_string}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8000";

    #[test]
    fn test_ask_endpoints_are_multipart_posts() {
        for endpoint in [Endpoint::AskText, Endpoint::AskImage, Endpoint::AskChat] {
            assert_eq!(endpoint.method(), Method::POST);
            assert!(endpoint.is_multipart());
            assert!(endpoint.query_params().is_empty());
        }
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::AskText.path(), "/ask/text");
        assert_eq!(Endpoint::AskImage.path(), "/ask/image");
        assert_eq!(Endpoint::AskChat.path(), "/ask/chat");
        assert_eq!(Endpoint::Health.path(), "/health/");
    }

    #[test]
    fn test_weather_endpoint_query() {
        let endpoint = Endpoint::CurrentWeather {
            lat: 12.97,
            lon: -77.5,
        };
        assert_eq!(endpoint.method(), Method::GET);
        assert!(!endpoint.is_multipart());

        let url = construct_url(BASE, endpoint.path(), &endpoint.query_params());
        assert_eq!(
            url,
            "http://localhost:8000/weather/current?lat=12.97&lon=-77.5"
        );
    }

    #[test]
    fn test_construct_url_without_query() {
        assert_eq!(
            construct_url(BASE, Endpoint::AskChat.path(), &[]),
            "http://localhost:8000/ask/chat"
        );
    }

    #[test]
    fn test_construct_url_encodes_query() {
        let query = vec![("q".to_string(), "a b&c=d".to_string())];
        let url = construct_url(BASE, "/search", &query);
        assert_eq!(url, "http://localhost:8000/search?q=a%20b%26c%3Dd");
    }

    #[test]
    fn test_construct_url_keeps_base_path_prefix() {
        let url = construct_url("https://example.com/api", Endpoint::Health.path(), &[]);
        assert_eq!(url, "https://example.com/api/health/");
    }
}
