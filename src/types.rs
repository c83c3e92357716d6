//! Response bodies returned by the backend.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The successful reply of every ask endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    /// The formatted answer
    pub analysis: String,
    /// Server-assigned identifier for this request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Outcome label, `"success"` in practice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Echo of what the server received; shape is not fixed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
    /// Server-side processing time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl AskResponse {
    /// Whether the server reports that an image was received, if it says.
    #[must_use]
    pub fn image_uploaded(&self) -> Option<bool> {
        self.input.as_ref()?.get("image_uploaded")?.as_bool()
    }
}

/// Coarse sky condition reported by the weather endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    /// Any condition label this client does not know
    #[serde(other)]
    Other,
}

/// Current conditions at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Temperature in °C
    pub temp: f64,
    pub condition: WeatherCondition,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Wind speed in km/h
    pub wind: f64,
    pub location: String,
}

/// Body of the weather endpoint.
///
/// The backend answers 200 in both cases: an unconfigured or unreachable
/// upstream weather service produces `{"error": "..."}` rather than an HTTP
/// error, so it is a value here, not an [`ApiError`](crate::ApiError).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeatherResponse {
    Report(WeatherReport),
    Unavailable { error: String },
}

impl WeatherResponse {
    #[must_use]
    pub fn report(&self) -> Option<&WeatherReport> {
        match self {
            Self::Report(report) => Some(report),
            Self::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Unavailable { error } => Some(error),
            Self::Report(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthModels {
    #[serde(default)]
    pub text_model: Option<String>,
    #[serde(default)]
    pub vision_model: Option<String>,
}

/// Body of the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    /// Server time as an ISO 8601 string without offset (UTC)
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub uptime_seconds: Option<u64>,
    #[serde(default)]
    pub models: Option<HealthModels>,
    /// Reachability of upstream services, e.g. `{"groq_api": "reachable"}`
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl HealthStatus {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }

    /// Parses [`HealthStatus::timestamp`], if present and well-formed.
    #[must_use]
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        let raw = self.timestamp.as_deref()?;
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }

    /// Dependencies not reported as reachable.
    #[must_use]
    pub fn unreachable_dependencies(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .dependencies
            .iter()
            .filter(|(_, state)| state.as_str() != "reachable")
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}
