//! Weather intent: is this a weather question, where, and when.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lexicon::TRIGGER_WORDS;
use crate::location::{extract_location, LocationMatch, LocationSource};
use crate::normalize::normalize_text;
use crate::time::{extract_time, TimeReference};

#[allow(clippy::expect_used)]
static TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = TRIGGER_WORDS
        .iter()
        .map(|w| regex::escape(w).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("trigger words are literals")
});

/// Whether a message is asking about the weather.
pub fn is_weather_query(text: &str) -> bool {
    TRIGGER.is_match(text)
}

/// Everything understood from one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherIntent {
    /// The normalized message text
    pub text: String,
    pub triggered: bool,
    pub location: Option<LocationMatch>,
    pub time: Option<TimeReference>,
}

impl WeatherIntent {
    pub fn not_weather(text: String) -> Self {
        Self {
            text,
            triggered: false,
            location: None,
            time: None,
        }
    }

    pub fn location_name(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.name.as_str())
    }

    pub fn time_phrase(&self) -> Option<&str> {
        self.time.as_ref().map(|t| t.phrase.as_str())
    }
}

/// Turns free text into a [`WeatherIntent`].
pub trait IntentExtractor {
    fn extract(&self, text: &str) -> WeatherIntent;
}

/// Rule-based extractor with a configurable default location.
#[derive(Debug, Clone, Default)]
pub struct IntentParser {
    default_location: Option<String>,
}

impl IntentParser {
    pub fn new(default_location: Option<&str>) -> Self {
        Self {
            default_location: default_location
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        }
    }

    pub fn default_location(&self) -> Option<&str> {
        self.default_location.as_deref()
    }
}

impl IntentExtractor for IntentParser {
    fn extract(&self, text: &str) -> WeatherIntent {
        let normalized = normalize_text(text);

        if !is_weather_query(&normalized) {
            tracing::debug!("No weather trigger in {:?}", normalized);
            return WeatherIntent::not_weather(normalized);
        }

        let location = extract_location(&normalized).or_else(|| {
            self.default_location
                .as_ref()
                .map(|name| LocationMatch::new(name.clone(), LocationSource::Default))
        });
        let time = extract_time(&normalized);

        tracing::debug!(
            location = ?location.as_ref().map(|l| &l.name),
            time = ?time.as_ref().map(|t| &t.phrase),
            "Extracted weather intent"
        );

        WeatherIntent {
            text: normalized,
            triggered: true,
            location,
            time,
        }
    }
}
