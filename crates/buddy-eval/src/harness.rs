//! Batch runner over evaluation prompts.

use buddy_agent::{ForecastSource, ResponseKind, WeatherAgent};
use buddy_nlu::{IntentExtractor, IntentParser, ResolvedWindow};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::prompts::EvalCase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    /// Intent extraction only, no network
    Offline,
    /// The full agent, a fresh conversation per prompt
    Live,
}

/// One evaluated prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalRecord {
    pub prompt: String,
    pub expected_location: Option<String>,
    pub triggered: bool,
    pub location: Option<String>,
    pub time_phrase: Option<String>,
    pub start_hour: Option<u32>,
    pub end_hour: Option<u32>,
    pub response: Option<String>,
    pub summary: Option<String>,
    pub forecast_ok: bool,
}

impl EvalRecord {
    /// `None` when the case has no expected location.
    pub fn location_matches(&self) -> Option<bool> {
        let expected = self.expected_location.as_deref()?;
        Some(
            self.location
                .as_deref()
                .is_some_and(|found| same_place(found, expected)),
        )
    }
}

/// Case, spacing and comma-spacing insensitive comparison.
fn same_place(a: &str, b: &str) -> bool {
    fn canonical(s: &str) -> String {
        s.split(',')
            .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join(",")
            .to_lowercase()
    }
    canonical(a) == canonical(b)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EvalReport {
    pub records: Vec<EvalRecord>,
}

impl EvalReport {
    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn triggered(&self) -> usize {
        self.records.iter().filter(|r| r.triggered).count()
    }

    pub fn with_location(&self) -> usize {
        self.records.iter().filter(|r| r.location.is_some()).count()
    }

    pub fn forecasts(&self) -> usize {
        self.records.iter().filter(|r| r.forecast_ok).count()
    }

    /// Share of cases with an expected location that were matched, or
    /// `None` if no case names one.
    pub fn location_accuracy(&self) -> Option<f64> {
        let checked: Vec<bool> = self
            .records
            .iter()
            .filter_map(EvalRecord::location_matches)
            .collect();
        if checked.is_empty() {
            return None;
        }
        let hits = checked.iter().filter(|hit| **hit).count();
        Some(hits as f64 / checked.len() as f64)
    }

    /// One-paragraph summary for the terminal.
    pub fn describe(&self) -> String {
        let mut text = format!(
            "{} prompts: {} weather questions, {} with a location, {} forecasts",
            self.total(),
            self.triggered(),
            self.with_location(),
            self.forecasts()
        );
        if let Some(accuracy) = self.location_accuracy() {
            text.push_str(&format!(", location accuracy {:.0}%", accuracy * 100.0));
        }
        text
    }
}

pub struct Evaluator<S, E = IntentParser> {
    agent: WeatherAgent<S, E>,
}

impl<S: ForecastSource, E: IntentExtractor> Evaluator<S, E> {
    pub fn new(agent: WeatherAgent<S, E>) -> Self {
        Self { agent }
    }

    pub async fn run(&mut self, cases: &[EvalCase], mode: EvalMode) -> EvalReport {
        self.run_at(cases, mode, Utc::now()).await
    }

    pub async fn run_at(
        &mut self,
        cases: &[EvalCase],
        mode: EvalMode,
        now: DateTime<Utc>,
    ) -> EvalReport {
        let mut records = Vec::with_capacity(cases.len());
        for case in cases {
            let record = match mode {
                EvalMode::Offline => self.offline(case, now),
                EvalMode::Live => self.live(case, now).await,
            };
            tracing::debug!(
                prompt = %record.prompt,
                location = ?record.location,
                triggered = record.triggered,
                "Evaluated prompt"
            );
            records.push(record);
        }
        EvalReport { records }
    }

    /// Window hours are relative to `now` in UTC; the place's time zone is
    /// only known after geocoding.
    fn offline(&self, case: &EvalCase, now: DateTime<Utc>) -> EvalRecord {
        let intent = self.agent.extractor().extract(&case.prompt);
        let width = self.agent.settings().window_hours;
        let hours = intent.triggered.then(|| {
            let window = match &intent.time {
                Some(reference) => reference.resolve(&now, width),
                None => ResolvedWindow::starting_now(&now, width),
            };
            window.hour_window(&now)
        });

        EvalRecord {
            prompt: case.prompt.clone(),
            expected_location: case.expected_location.clone(),
            triggered: intent.triggered,
            location: intent.location_name().map(String::from),
            time_phrase: intent.time_phrase().map(String::from),
            start_hour: hours.map(|h| h.start_hour),
            end_hour: hours.map(|h| h.end_hour),
            response: None,
            summary: None,
            forecast_ok: false,
        }
    }

    async fn live(&mut self, case: &EvalCase, now: DateTime<Utc>) -> EvalRecord {
        self.agent.reset();
        let response = self.agent.handle_at(&case.prompt, now).await;

        EvalRecord {
            prompt: case.prompt.clone(),
            expected_location: case.expected_location.clone(),
            triggered: response.intent.triggered,
            location: response.location.as_ref().map(|l| l.name.clone()),
            time_phrase: response.intent.time_phrase().map(String::from),
            start_hour: response.window.map(|h| h.start_hour),
            end_hour: response.window.map(|h| h.end_hour),
            forecast_ok: response.kind == ResponseKind::Forecast,
            response: Some(response.reply),
            summary: response.summary,
        }
    }
}
