//! Plain-language advice from a forecast window.

use buddy_weather::{ForecastWindow, WeatherCondition};
use serde::{Deserialize, Serialize};

/// Below this average the advice is to bundle up.
pub const CHILLY_BELOW_C: f64 = 12.0;
/// Below this (and not chilly) a light jacket is enough.
pub const COOL_BELOW_C: f64 = 18.0;
/// Average precipitation per hour above which rain is likely.
pub const RAIN_LIKELY_MM: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Label for a local clock hour (0-23).
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=10 => Self::Morning,
            11..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warmth {
    Chilly,
    Cool,
    Comfortable,
}

impl Warmth {
    pub fn from_celsius(avg_temp_c: f64) -> Self {
        if avg_temp_c < CHILLY_BELOW_C {
            Self::Chilly
        } else if avg_temp_c < COOL_BELOW_C {
            Self::Cool
        } else {
            Self::Comfortable
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Self::Chilly => "Wear something warm, like a sweater or coat.",
            Self::Cool => "A light jacket should be fine.",
            Self::Comfortable => "You\u{2019}ll be comfortable in regular clothes.",
        }
    }

    /// Terse hint for the cached summary.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Chilly => "bundle up, it's chilly",
            Self::Cool => "light jacket ok",
            Self::Comfortable => "regular clothes fine",
        }
    }
}

pub fn rain_advice(avg_precipitation_mm: f64) -> Option<&'static str> {
    if avg_precipitation_mm > RAIN_LIKELY_MM {
        Some("Don\u{2019}t forget an umbrella, there\u{2019}s a good chance of rain.")
    } else if avg_precipitation_mm > 0.0 {
        Some("There might be a light drizzle, so keep an umbrella handy.")
    } else {
        None
    }
}

pub fn condition_caution(condition: WeatherCondition) -> Option<&'static str> {
    match condition {
        WeatherCondition::Thunderstorm => {
            Some("There may be thunderstorms, so it\u{2019}s best to stay indoors if you can.")
        }
        WeatherCondition::Snow | WeatherCondition::Sleet => {
            Some("Paths could be slippery, so take it slow and wear good shoes.")
        }
        WeatherCondition::Fog => Some("It may be foggy, so take extra care if you\u{2019}re driving."),
        _ => None,
    }
}

/// Advice sentences for a window. Never empty: the clothing line is always
/// first.
pub fn advice_for(window: &ForecastWindow) -> Vec<&'static str> {
    let mut advice = vec![Warmth::from_celsius(window.average_temperature()).advice()];
    advice.extend(rain_advice(window.average_precipitation()));
    advice.extend(condition_caution(window.worst_condition()));
    advice
}
