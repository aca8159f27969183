//! Forward geocoding: turn a place name into coordinates.
//! Uses the Open-Meteo geocoding API - free, no API key required.

use reqwest::Client;
use serde::Deserialize;

use crate::retry::{send_with_retry, RetryPolicy};
use crate::types::{Place, WeatherError};

/// Candidates requested so a qualifier like "CA" can pick among them.
const CANDIDATES: u32 = 10;

const US_STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    country_code: Option<String>,
    admin1: Option<String>,
    timezone: Option<String>,
}

impl From<GeocodingResult> for Place {
    fn from(r: GeocodingResult) -> Self {
        Place {
            name: r.name,
            latitude: r.latitude,
            longitude: r.longitude,
            country: r.country,
            country_code: r.country_code,
            admin1: r.admin1,
            timezone: r.timezone,
        }
    }
}

/// Split "Newark, CA" into ("Newark", Some("CA")).
pub fn split_query(query: &str) -> (&str, Option<&str>) {
    match query.split_once(',') {
        Some((name, qualifier)) => {
            let qualifier = qualifier.trim();
            (name.trim(), (!qualifier.is_empty()).then_some(qualifier))
        }
        None => (query.trim(), None),
    }
}

fn state_name(abbreviation: &str) -> Option<&'static str> {
    US_STATES
        .iter()
        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(abbreviation))
        .map(|(_, name)| *name)
}

fn matches_region(result: &GeocodingResult, qualifier: &str) -> bool {
    let Some(admin1) = result.admin1.as_deref() else {
        return false;
    };
    if admin1.eq_ignore_ascii_case(qualifier) {
        return true;
    }
    result.country_code.as_deref() == Some("US")
        && state_name(qualifier).is_some_and(|state| state.eq_ignore_ascii_case(admin1))
}

fn matches_country(result: &GeocodingResult, qualifier: &str) -> bool {
    result
        .country
        .as_deref()
        .is_some_and(|c| c.eq_ignore_ascii_case(qualifier))
        || result
            .country_code
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(qualifier))
}

/// Pick the best candidate: region match, then country match, then the
/// first (most populous) result.
fn choose(results: Vec<GeocodingResult>, qualifier: Option<&str>) -> Option<GeocodingResult> {
    if let Some(q) = qualifier {
        if let Some(hit) = results.iter().find(|r| matches_region(r, q)) {
            return Some(hit.clone());
        }
        if let Some(hit) = results.iter().find(|r| matches_country(r, q)) {
            return Some(hit.clone());
        }
        tracing::debug!("No geocoding candidate matched qualifier {:?}", q);
    }
    results.into_iter().next()
}

/// Geocode a place name such as "Fremont" or "Newark, CA".
pub async fn forward_geocode(
    client: &Client,
    base_url: &str,
    query: &str,
    retry: &RetryPolicy,
) -> Result<Place, WeatherError> {
    let (name, qualifier) = split_query(query);
    if name.is_empty() {
        return Err(WeatherError::LocationNotFound(query.to_string()));
    }

    let url = format!(
        "{}/v1/search?name={}&count={}&language=en&format=json",
        base_url.trim_end_matches('/'),
        urlencoding::encode(name),
        CANDIDATES
    );

    let response = send_with_retry(retry, || client.get(&url).send()).await?;
    let body: GeocodingResponse = response
        .json()
        .await
        .map_err(|e| WeatherError::Parse(format!("geocoding response: {}", e)))?;

    let place: Place = choose(body.results, qualifier)
        .ok_or_else(|| WeatherError::LocationNotFound(query.to_string()))?
        .into();

    tracing::info!(
        "Geocoded {:?} to {} ({:.3}, {:.3})",
        query,
        place.full_name(),
        place.latitude,
        place.longitude
    );
    Ok(place)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate(name: &str, admin1: &str, country: &str, code: &str) -> serde_json::Value {
        serde_json::json!({
            "id": 1,
            "name": name,
            "latitude": 37.5,
            "longitude": -122.0,
            "country": country,
            "country_code": code,
            "admin1": admin1,
            "timezone": "America/Los_Angeles"
        })
    }

    fn result(admin1: &str, country: &str, code: &str) -> GeocodingResult {
        GeocodingResult {
            name: "Newark".into(),
            latitude: 0.0,
            longitude: 0.0,
            country: Some(country.into()),
            country_code: Some(code.into()),
            admin1: Some(admin1.into()),
            timezone: None,
        }
    }

    #[test]
    fn test_split_query() {
        assert_eq!(split_query("Newark, CA"), ("Newark", Some("CA")));
        assert_eq!(split_query("Mount Rainier,WA"), ("Mount Rainier", Some("WA")));
        assert_eq!(split_query(" Paris "), ("Paris", None));
        assert_eq!(split_query("Paris,"), ("Paris", None));
    }

    #[test]
    fn test_state_abbreviation_beats_country_code() {
        // "CA" is also Canada's country code
        let results = vec![
            result("New Jersey", "United States", "US"),
            result("Ontario", "Canada", "CA"),
            result("California", "United States", "US"),
        ];
        let chosen = choose(results, Some("CA")).unwrap();
        assert_eq!(chosen.admin1.as_deref(), Some("California"));
    }

    #[test]
    fn test_country_qualifier() {
        let results = vec![
            result("Texas", "United States", "US"),
            result("Ile-de-France", "France", "FR"),
        ];
        let chosen = choose(results, Some("France")).unwrap();
        assert_eq!(chosen.country_code.as_deref(), Some("FR"));
    }

    #[test]
    fn test_unmatched_qualifier_falls_back_to_first() {
        let results = vec![result("New Jersey", "United States", "US")];
        let chosen = choose(results, Some("Narnia")).unwrap();
        assert_eq!(chosen.admin1.as_deref(), Some("New Jersey"));
        assert!(choose(Vec::new(), None).is_none());
    }

    #[tokio::test]
    async fn test_forward_geocode_with_qualifier() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Newark"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    candidate("Newark", "New Jersey", "United States", "US"),
                    candidate("Newark", "California", "United States", "US"),
                ]
            })))
            .mount(&server)
            .await;

        let client = Client::new();
        let place = forward_geocode(&client, &server.uri(), "Newark, CA", &RetryPolicy::none())
            .await
            .unwrap();
        assert_eq!(place.name, "Newark");
        assert_eq!(place.admin1.as_deref(), Some("California"));
        assert_eq!(place.timezone.as_deref(), Some("America/Los_Angeles"));
    }

    #[tokio::test]
    async fn test_forward_geocode_not_found() {
        let server = MockServer::start().await;
        // Open-Meteo omits "results" entirely when nothing matches
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "generationtime_ms": 0.5 })),
            )
            .mount(&server)
            .await;

        let client = Client::new();
        let err = forward_geocode(&client, &server.uri(), "Atlantis", &RetryPolicy::none())
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::LocationNotFound(ref q) if q == "Atlantis"));
    }
}
