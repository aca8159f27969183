//! The agent driving the real provider against a mocked Open-Meteo.

use buddy_agent::{AgentSettings, ResponseKind, WeatherAgent};
use buddy_core::{TemperatureUnit, WeatherConfig};
use buddy_nlu::IntentParser;
use buddy_weather::{RetryPolicy, WeatherProvider};
use chrono::{TimeZone, Utc};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_cape_town(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "Cape Town"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{
                "name": "Cape Town",
                "latitude": -33.92584,
                "longitude": 18.42322,
                "country": "South Africa",
                "country_code": "ZA",
                "admin1": "Western Cape",
                "timezone": "Africa/Johannesburg"
            }]
        })))
        .mount(server)
        .await;

    // Tonight is 21:00 SAST, 19:00 UTC
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("start_hour", "2026-10-14T19:00"))
        .and(query_param("end_hour", "2026-10-14T21:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hourly": {
                "time": ["2026-10-14T19:00", "2026-10-14T20:00", "2026-10-14T21:00"],
                "temperature_2m": [11.0, 10.0, 9.0],
                "precipitation": [0.0, 0.1, 0.0],
                "weathercode": [3, 51, 3]
            }
        })))
        .mount(server)
        .await;
}

fn agent(server: &MockServer, unit: TemperatureUnit) -> WeatherAgent<WeatherProvider> {
    let provider = WeatherProvider::new(&WeatherConfig::default())
        .unwrap()
        .with_base_urls(&server.uri(), &server.uri())
        .with_retry(RetryPolicy::none());
    let settings = AgentSettings {
        temperature_unit: unit,
        ..AgentSettings::default()
    };
    WeatherAgent::new(provider, IntentParser::new(Some("Newark, CA")), settings)
}

#[tokio::test]
async fn jacket_or_sweater_tonight() {
    let server = MockServer::start().await;
    mock_cape_town(&server).await;

    let now = Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap();
    let mut agent = agent(&server, TemperatureUnit::Celsius);
    let response = agent
        .handle_at("Jacket or sweater for Cape Town tonight?", now)
        .await;

    assert_eq!(response.kind, ResponseKind::Forecast);
    assert_eq!(
        response.reply,
        "In Cape Town during the night, it\u{2019}ll be around 10°C with some rain.\n\
         Wear something warm, like a sweater or coat. \
         There might be a light drizzle, so keep an umbrella handy."
    );
    assert_eq!(
        response.summary.as_deref(),
        Some("Cape Town, night: about 10°C, light rain/drizzle likely. bundle up, it's chilly.")
    );
    assert_eq!(agent.conversation().last_location(), Some("Cape Town"));
}

#[tokio::test]
async fn fahrenheit_display() {
    let server = MockServer::start().await;
    mock_cape_town(&server).await;

    let now = Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap();
    let mut agent = agent(&server, TemperatureUnit::Fahrenheit);
    let response = agent.handle_at("Is it cold in Cape Town tonight?", now).await;
    assert!(response.reply.contains("around 50°F"), "{}", response.reply);
}

#[tokio::test]
async fn server_error_becomes_gentle_reply() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let now = Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap();
    let mut agent = agent(&server, TemperatureUnit::Celsius);
    let response = agent.handle_at("Will it rain in Toronto?", now).await;

    assert_eq!(response.kind, ResponseKind::Failed);
    assert!(!response.reply.is_empty());
    assert_eq!(
        response.summary.as_deref(),
        Some("Weather unknown for Toronto right now.")
    );
}
