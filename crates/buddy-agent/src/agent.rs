//! The weather agent: one user message in, one reply out.

use std::future::Future;

use buddy_core::{Config, TemperatureUnit};
use buddy_nlu::{
    HourWindow, IntentExtractor, IntentParser, LocationMatch, LocationSource, ResolvedWindow,
    WeatherIntent,
};
use buddy_weather::{ForecastWindow, Place, WeatherError, WeatherProvider};
use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

use crate::advice::TimeOfDay;
use crate::conversation::{Conversation, Speaker};
use crate::render::{failure_summary, render_reply, render_summary};

pub const NOT_WEATHER_REPLY: &str =
    "I didn\u{2019}t catch a weather question, dear. Would you like me to check the weather somewhere?";
pub const NEED_LOCATION_REPLY: &str = "Could you please tell me which city, sweetheart?";

/// Where forecasts come from. Implemented by [`WeatherProvider`]; tests use
/// a canned source.
pub trait ForecastSource: Send + Sync {
    fn find_place(&self, query: &str) -> impl Future<Output = Result<Place, WeatherError>> + Send;

    fn forecast(
        &self,
        place: &Place,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<ForecastWindow, WeatherError>> + Send;
}

impl ForecastSource for WeatherProvider {
    fn find_place(&self, query: &str) -> impl Future<Output = Result<Place, WeatherError>> + Send {
        self.geocode(query)
    }

    fn forecast(
        &self,
        place: &Place,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<ForecastWindow, WeatherError>> + Send {
        self.hourly_window_at(place, start, end, now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Forecast,
    NotWeather,
    NeedLocation,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    pub kind: ResponseKind,
    pub reply: String,
    pub summary: Option<String>,
    pub intent: WeatherIntent,
    /// The location actually used, which may be remembered from earlier
    pub location: Option<LocationMatch>,
    pub window: Option<HourWindow>,
}

impl AgentResponse {
    fn without_forecast(kind: ResponseKind, reply: &str, intent: WeatherIntent) -> Self {
        Self {
            kind,
            reply: reply.to_string(),
            summary: None,
            intent,
            location: None,
            window: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub window_hours: u32,
    pub temperature_unit: TemperatureUnit,
    pub history_turns: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            window_hours: 2,
            temperature_unit: TemperatureUnit::Auto,
            history_turns: 20,
        }
    }
}

impl From<&Config> for AgentSettings {
    fn from(config: &Config) -> Self {
        Self {
            window_hours: config.assistant.window_hours,
            temperature_unit: config.weather.temperature_unit,
            history_turns: config.assistant.history_turns,
        }
    }
}

pub struct WeatherAgent<S, E = IntentParser> {
    source: S,
    extractor: E,
    settings: AgentSettings,
    conversation: Conversation,
}

impl<S: ForecastSource> WeatherAgent<S> {
    /// Agent with the rule-based extractor and the configured defaults.
    pub fn from_config(source: S, config: &Config) -> Self {
        let extractor = IntentParser::new(config.assistant.default_location());
        Self::new(source, extractor, AgentSettings::from(config))
    }
}

impl<S: ForecastSource, E: IntentExtractor> WeatherAgent<S, E> {
    pub fn new(source: S, extractor: E, settings: AgentSettings) -> Self {
        let conversation = Conversation::new(settings.history_turns);
        Self {
            source,
            extractor,
            settings,
            conversation,
        }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Forget the conversation so far.
    pub fn reset(&mut self) {
        self.conversation.clear();
    }

    pub async fn handle(&mut self, input: &str) -> AgentResponse {
        self.handle_at(input, Utc::now()).await
    }

    /// Answer `input` as if the current time were `now`.
    pub async fn handle_at(&mut self, input: &str, now: DateTime<Utc>) -> AgentResponse {
        self.conversation.push(Speaker::User, input);
        let response = self.respond(input, now).await;
        self.conversation.push(Speaker::Buddy, response.reply.as_str());
        response
    }

    /// A named place wins; otherwise the place from the last forecast, then
    /// the configured default.
    fn choose_location(&self, intent: &WeatherIntent) -> Option<LocationMatch> {
        match &intent.location {
            Some(found) if found.source != LocationSource::Default => Some(found.clone()),
            default => self
                .conversation
                .last_location()
                .map(|name| LocationMatch::new(name, LocationSource::Remembered))
                .or_else(|| default.clone()),
        }
    }

    async fn respond(&mut self, input: &str, now: DateTime<Utc>) -> AgentResponse {
        let intent = self.extractor.extract(input);
        if !intent.triggered {
            return AgentResponse::without_forecast(
                ResponseKind::NotWeather,
                NOT_WEATHER_REPLY,
                intent,
            );
        }

        let Some(location) = self.choose_location(&intent) else {
            return AgentResponse::without_forecast(
                ResponseKind::NeedLocation,
                NEED_LOCATION_REPLY,
                intent,
            );
        };

        let place = match self.source.find_place(&location.name).await {
            Ok(place) => place,
            Err(e) => return self.failed(intent, location, None, &e),
        };

        let tz = place.time_zone().unwrap_or_else(|| {
            tracing::debug!("No usable time zone for {}, using UTC", place.name);
            chrono_tz::UTC
        });
        let local_now = now.with_timezone(&tz);
        let window = match &intent.time {
            Some(reference) => reference.resolve(&local_now, self.settings.window_hours),
            None => ResolvedWindow::starting_now(&local_now, self.settings.window_hours),
        };
        let hours = window.hour_window(&local_now);

        tracing::info!(
            location = %location.name,
            source = ?location.source,
            start = %window.start,
            end = %window.end,
            "Fetching forecast"
        );

        let forecast = self
            .source
            .forecast(
                &place,
                window.start.with_timezone(&Utc),
                window.end.with_timezone(&Utc),
                now,
            )
            .await;
        let forecast = match forecast {
            Ok(forecast) => forecast,
            Err(e) => return self.failed(intent, location, Some(hours), &e),
        };

        let time_of_day = TimeOfDay::from_hour(window.midpoint().hour());
        let unit = self.settings.temperature_unit;
        let reply = render_reply(&place.name, time_of_day, &forecast, unit);
        let summary = render_summary(&place.name, time_of_day, &forecast, unit);
        self.conversation.remember(location.name.as_str(), summary.as_str());

        AgentResponse {
            kind: ResponseKind::Forecast,
            reply,
            summary: Some(summary),
            intent,
            location: Some(location),
            window: Some(hours),
        }
    }

    fn failed(
        &self,
        intent: WeatherIntent,
        location: LocationMatch,
        window: Option<HourWindow>,
        error: &WeatherError,
    ) -> AgentResponse {
        tracing::warn!("Weather lookup for {:?} failed: {}", location.name, error);
        AgentResponse {
            kind: ResponseKind::Failed,
            reply: error.user_message(),
            summary: Some(failure_summary(&location.name)),
            intent,
            location: Some(location),
            window,
        }
    }
}
