use buddy_core::NetworkError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    MostlyClear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
    #[default]
    Unknown,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1 => Self::MostlyClear,
            2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::Sleet, // Freezing drizzle
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            66 | 67 => Self::Sleet, // Freezing rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    /// Short label
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::MostlyClear => "Mostly Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Overcast",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }

    /// Phrase that reads naturally inside a sentence ("expect foggy ...").
    pub fn plain_description(&self) -> &'static str {
        match self {
            Self::Clear => "clear skies",
            Self::MostlyClear => "mostly clear skies",
            Self::PartlyCloudy => "some clouds",
            Self::Cloudy => "overcast skies",
            Self::Fog => "fog",
            Self::Drizzle => "light drizzle",
            Self::Rain => "rain",
            Self::HeavyRain => "heavy rain",
            Self::Snow => "snow",
            Self::Sleet => "icy rain",
            Self::Thunderstorm => "thunderstorms",
            Self::Unknown => "uncertain conditions",
        }
    }

    /// How much the condition matters to someone going out. Higher is worse.
    pub fn severity(&self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Clear => 1,
            Self::MostlyClear => 2,
            Self::PartlyCloudy => 3,
            Self::Cloudy => 4,
            Self::Fog => 5,
            Self::Drizzle => 6,
            Self::Rain => 7,
            Self::Sleet => 8,
            Self::Snow => 9,
            Self::HeavyRain => 10,
            Self::Thunderstorm => 11,
        }
    }
}

/// A geocoded place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub country_code: Option<String>,
    /// First-level region, e.g. a US state
    pub admin1: Option<String>,
    /// IANA time zone name, e.g. "America/Los_Angeles"
    pub timezone: Option<String>,
}

impl Place {
    /// The place's time zone, if known and recognized.
    pub fn time_zone(&self) -> Option<chrono_tz::Tz> {
        self.timezone.as_deref().and_then(|tz| tz.parse().ok())
    }

    /// Name with region for disambiguation, e.g. "Newark, California".
    pub fn full_name(&self) -> String {
        match self.admin1.as_deref().or(self.country.as_deref()) {
            Some(region) if !region.is_empty() && region != self.name => {
                format!("{}, {}", self.name, region)
            }
            _ => self.name.clone(),
        }
    }
}

/// One hour of forecast data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub time: DateTime<Utc>,
    pub temperature_c: f64,
    pub precipitation_mm: f64,
    pub condition: WeatherCondition,
}

/// Hourly forecast for a place over a window. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastWindow {
    pub place: Place,
    points: Vec<HourlyPoint>,
    pub fetched_at: DateTime<Utc>,
}

impl ForecastWindow {
    pub fn new(
        place: Place,
        points: Vec<HourlyPoint>,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, WeatherError> {
        if points.is_empty() {
            return Err(WeatherError::IncompleteData(format!(
                "no hourly data for {}",
                place.name
            )));
        }
        Ok(Self {
            place,
            points,
            fetched_at,
        })
    }

    pub fn points(&self) -> &[HourlyPoint] {
        &self.points
    }

    pub fn average_temperature(&self) -> f64 {
        self.points.iter().map(|p| p.temperature_c).sum::<f64>() / self.points.len() as f64
    }

    pub fn average_precipitation(&self) -> f64 {
        self.total_precipitation() / self.points.len() as f64
    }

    pub fn total_precipitation(&self) -> f64 {
        self.points.iter().map(|p| p.precipitation_mm).sum()
    }

    pub fn high(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.temperature_c)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn low(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.temperature_c)
            .fold(f64::INFINITY, f64::min)
    }

    /// The most frequent condition; ties go to the more severe one.
    pub fn dominant_condition(&self) -> WeatherCondition {
        let mut counts: Vec<(WeatherCondition, usize)> = Vec::new();
        for point in &self.points {
            match counts.iter_mut().find(|(c, _)| *c == point.condition) {
                Some((_, n)) => *n += 1,
                None => counts.push((point.condition, 1)),
            }
        }
        counts
            .into_iter()
            .max_by_key(|(c, n)| (*n, c.severity()))
            .map(|(c, _)| c)
            .unwrap_or_default()
    }

    /// The most severe condition seen in the window.
    pub fn worst_condition(&self) -> WeatherCondition {
        self.points
            .iter()
            .map(|p| p.condition)
            .max_by_key(WeatherCondition::severity)
            .unwrap_or_default()
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("Location not found: {0}")]
    LocationNotFound(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Incomplete forecast data: {0}")]
    IncompleteData(String),
    #[error("Requested time is {hours_ahead} hours ahead, beyond the forecast horizon")]
    OutOfRange { hours_ahead: i64 },
    #[error("Cache error: {0}")]
    Cache(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        use buddy_core::ReqwestErrorExt;
        Self::Network(err.into_network_error())
    }
}

impl WeatherError {
    /// Gentle message for the person asking.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(e) => e.user_message().to_string(),
            Self::LocationNotFound(place) => {
                format!("Sorry, I couldn\u{2019}t find any weather information for {}.", place)
            }
            Self::Parse(_) | Self::IncompleteData(_) => {
                "I couldn\u{2019}t get the forecast details right now. Please try again in a little while."
                    .to_string()
            }
            Self::OutOfRange { .. } => {
                "I can only see about two weeks ahead. Could you ask about a closer day?".to_string()
            }
            Self::Cache(_) => "I had trouble with my notes, but you can ask again.".to_string(),
        }
    }

    /// Whether repeating the request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(hour: u32, temp: f64, precip: f64, code: i32) -> HourlyPoint {
        HourlyPoint {
            time: Utc.with_ymd_and_hms(2026, 10, 14, hour, 0, 0).unwrap(),
            temperature_c: temp,
            precipitation_mm: precip,
            condition: WeatherCondition::from_wmo_code(code),
        }
    }

    fn place() -> Place {
        Place {
            name: "Fremont".into(),
            latitude: 37.548,
            longitude: -121.988,
            country: Some("United States".into()),
            country_code: Some("US".into()),
            admin1: Some("California".into()),
            timezone: Some("America/Los_Angeles".into()),
        }
    }

    #[test]
    fn test_wmo_code_clear_and_clouds() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(1), WeatherCondition::MostlyClear);
        assert_eq!(WeatherCondition::from_wmo_code(2), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_wmo_code(3), WeatherCondition::Cloudy);
    }

    #[test]
    fn test_wmo_code_fog() {
        assert_eq!(WeatherCondition::from_wmo_code(45), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::from_wmo_code(48), WeatherCondition::Fog);
    }

    #[test]
    fn test_wmo_code_rain() {
        assert_eq!(WeatherCondition::from_wmo_code(51), WeatherCondition::Drizzle);
        assert_eq!(WeatherCondition::from_wmo_code(61), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo_code(65), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_wmo_code(66), WeatherCondition::Sleet);
    }

    #[test]
    fn test_wmo_code_snow_and_storms() {
        assert_eq!(WeatherCondition::from_wmo_code(71), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_wmo_code(86), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_wmo_code(95), WeatherCondition::Thunderstorm);
        assert_eq!(WeatherCondition::from_wmo_code(99), WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_wmo_code_unknown() {
        assert_eq!(WeatherCondition::from_wmo_code(999), WeatherCondition::Unknown);
        assert_eq!(
            WeatherCondition::Unknown.plain_description(),
            "uncertain conditions"
        );
    }

    #[test]
    fn test_window_statistics() {
        let window = ForecastWindow::new(
            place(),
            vec![point(8, 10.0, 0.0, 1), point(9, 12.0, 0.3, 61), point(10, 14.0, 0.3, 3)],
            Utc::now(),
        )
        .unwrap();

        assert!((window.average_temperature() - 12.0).abs() < 1e-9);
        assert!((window.total_precipitation() - 0.6).abs() < 1e-9);
        assert!((window.average_precipitation() - 0.2).abs() < 1e-9);
        assert_eq!(window.high(), 14.0);
        assert_eq!(window.low(), 10.0);
        assert_eq!(window.worst_condition(), WeatherCondition::Rain);
        // One hour each: the rain hour wins on severity
        assert_eq!(window.dominant_condition(), WeatherCondition::Rain);
    }

    #[test]
    fn test_dominant_condition_prefers_frequency() {
        let window = ForecastWindow::new(
            place(),
            vec![point(8, 10.0, 0.0, 3), point(9, 11.0, 0.0, 3), point(10, 11.0, 0.1, 61)],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(window.dominant_condition(), WeatherCondition::Cloudy);
        assert_eq!(window.worst_condition(), WeatherCondition::Rain);
    }

    #[test]
    fn test_empty_window_is_rejected() {
        let result = ForecastWindow::new(place(), Vec::new(), Utc::now());
        assert!(matches!(result, Err(WeatherError::IncompleteData(_))));
    }

    #[test]
    fn test_place_time_zone_and_name() {
        let p = place();
        assert_eq!(p.time_zone(), Some(chrono_tz::America::Los_Angeles));
        assert_eq!(p.full_name(), "Fremont, California");

        let unknown = Place {
            timezone: Some("Mars/Olympus".into()),
            admin1: None,
            country: None,
            ..place()
        };
        assert_eq!(unknown.time_zone(), None);
        assert_eq!(unknown.full_name(), "Fremont");
    }

    #[test]
    fn test_error_user_messages() {
        let err = WeatherError::LocationNotFound("Atlantis".into());
        assert!(err.user_message().contains("Atlantis"));
        assert!(!err.is_retryable());

        let err = WeatherError::Network(NetworkError::Timeout);
        assert!(err.is_retryable());
        assert!(WeatherError::OutOfRange { hours_ahead: 500 }
            .user_message()
            .contains("two weeks"));
    }
}
