// Tests for the weather and health lookups
mod common;

use agrigpt_client::{
    AgriClient, BuildMode, MemoryStore, SESSION_KEY, SessionStore, WeatherCondition,
    WeatherResponse,
};
use common::*;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_current_weather_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather/current"))
        .and(query_param("lat", "18.52"))
        .and(query_param("lon", "73.85"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "location": "Pune",
            "temp": 31,
            "humidity": 48,
            "wind": 11,
            "condition": "sunny"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let weather = client_for(&server)
        .current_weather(18.52, 73.85)
        .await
        .unwrap();

    let report = weather.report().expect("should be a report");
    assert_eq!(report.location, "Pune");
    assert_eq!(report.condition, WeatherCondition::Sunny);
    assert_eq!(report.humidity, 48.0);
}

#[tokio::test]
async fn test_current_weather_unavailable_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather/current"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "Weather API unavailable"})),
        )
        .mount(&server)
        .await;

    let weather = client_for(&server).current_weather(0.0, 0.0).await.unwrap();
    assert_eq!(
        weather,
        WeatherResponse::Unavailable {
            error: "Weather API unavailable".to_string()
        }
    );
}

#[tokio::test]
async fn test_current_weather_http_error_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather/current"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["query", "lat"], "msg": "value is not a valid float"}]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .current_weather(f64::NAN, 1.0)
        .await
        .unwrap_err();
    assert_eq!(err.status, 422);
    assert!(err.message.contains("not a valid float"));
}

#[tokio::test]
async fn test_weather_sends_no_session_and_no_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "off"})))
        .mount(&server)
        .await;

    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    let client = AgriClient::builder()
        .base_url(server.uri())
        .shared_session_store(Arc::clone(&store))
        .build()
        .unwrap();

    client.current_weather(10.0, 20.0).await.unwrap();

    assert_eq!(store.get(SESSION_KEY), None, "weather must not create a session");
    let requests = received(&server).await;
    assert!(requests[0].body.is_empty());
    assert!(requests[0].headers.get("content-type").is_none());
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "service": "AgriGPT Backend",
            "timestamp": "2025-06-01T12:00:00.000001",
            "uptime_seconds": 3600,
            "models": {"text_model": "text-m", "vision_model": "vision-m"},
            "dependencies": {"groq_api": "reachable"},
            "message": "alive"
        })))
        .mount(&server)
        .await;

    let health = client_for(&server).health().await.unwrap();
    assert!(health.is_ok());
    assert_eq!(health.uptime_seconds, Some(3600));
    assert!(health.unreachable_dependencies().is_empty());
    assert!(health.parsed_timestamp().is_some());
}

#[tokio::test]
async fn test_health_logged_in_development_and_production() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})))
        .expect(2)
        .mount(&server)
        .await;

    for mode in [BuildMode::Development, BuildMode::Production] {
        let recorder = Recorder::default();
        let client = AgriClient::builder()
            .base_url(server.uri())
            .mode(mode)
            .interceptor(recorder.clone())
            .build()
            .unwrap();

        client.health().await.unwrap();
        assert_eq!(
            recorder.events(),
            vec![
                "request GET /health/ content-type=false".to_string(),
                "response /health/ 200".to_string()
            ]
        );
    }
}
