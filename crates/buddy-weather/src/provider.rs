//! Open-Meteo weather provider.

use std::sync::Arc;
use std::time::Duration;

use buddy_core::WeatherConfig;
use chrono::{DateTime, DurationRound, NaiveDateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::cache::{forecast_key, CacheSnapshot, WeatherCache};
use crate::geocode::forward_geocode;
use crate::retry::{send_with_retry, RetryPolicy};
use crate::types::{ForecastWindow, HourlyPoint, Place, WeatherCondition, WeatherError};

/// How far ahead Open-Meteo forecasts reach.
pub const FORECAST_HORIZON_HOURS: i64 = 16 * 24;

const HOUR_FORMAT: &str = "%Y-%m-%dT%H:00";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<HourlyData>,
}

#[derive(Debug, Deserialize)]
struct HourlyData {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
    #[serde(default)]
    weathercode: Vec<Option<i32>>,
}

impl HourlyData {
    /// Zip the parallel arrays into points within `[start, end]`.
    /// Hours without a temperature are skipped.
    fn into_points(
        self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HourlyPoint>, WeatherError> {
        let n = self.time.len();
        if self.temperature_2m.len() != n || self.precipitation.len() != n || self.weathercode.len() != n
        {
            return Err(WeatherError::IncompleteData(format!(
                "hourly arrays differ in length: time={}, temperature={}, precipitation={}, weathercode={}",
                n,
                self.temperature_2m.len(),
                self.precipitation.len(),
                self.weathercode.len()
            )));
        }

        let mut points = Vec::with_capacity(n);
        for (((time, temperature), precipitation), code) in self
            .time
            .iter()
            .zip(self.temperature_2m)
            .zip(self.precipitation)
            .zip(self.weathercode)
        {
            let time = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
                .map_err(|e| WeatherError::Parse(format!("hourly time {:?}: {}", time, e)))?
                .and_utc();
            if time < start || time > end {
                continue;
            }
            let Some(temperature_c) = temperature else {
                tracing::debug!("No temperature for {}, skipping hour", time);
                continue;
            };
            points.push(HourlyPoint {
                time,
                temperature_c,
                precipitation_mm: precipitation.unwrap_or(0.0),
                condition: code.map(WeatherCondition::from_wmo_code).unwrap_or_default(),
            });
        }
        Ok(points)
    }
}

fn floor_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(TimeDelta::hours(1)).unwrap_or(t)
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    geocoding_url: String,
    forecast_url: String,
    retry: RetryPolicy,
    cache: Option<Arc<Mutex<WeatherCache>>>,
    /// Serializes cache file writes; they share one temporary file.
    cache_writer: Arc<tokio::sync::Mutex<()>>,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("weather-buddy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            geocoding_url: config.geocoding_url.clone(),
            forecast_url: config.forecast_url.clone(),
            retry: RetryPolicy::with_retries(config.max_retries),
            cache: None,
            cache_writer: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    pub fn with_base_urls(mut self, geocoding_url: &str, forecast_url: &str) -> Self {
        self.geocoding_url = geocoding_url.to_string();
        self.forecast_url = forecast_url.to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache(mut self, cache: WeatherCache) -> Self {
        self.cache = Some(Arc::new(Mutex::new(cache)));
        self
    }

    /// Run `f` against the cache, if there is one.
    fn with_cache_mut<T>(&self, f: impl FnOnce(&mut WeatherCache) -> T) -> Option<T> {
        self.cache.as_ref().map(|cache| f(&mut *cache.lock()))
    }

    /// Write a snapshot taken under the cache lock on the blocking pool.
    async fn persist(&self, snapshot: Option<Result<Option<CacheSnapshot>, WeatherError>>) {
        let result = match snapshot {
            Some(Ok(Some(snapshot))) => {
                let _writing = self.cache_writer.lock().await;
                tokio::task::spawn_blocking(move || snapshot.write())
                    .await
                    .unwrap_or_else(|e| Err(WeatherError::Cache(format!("cache writer: {}", e))))
            }
            Some(Err(e)) => Err(e),
            Some(Ok(None)) | None => Ok(()),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to save weather cache: {}", e);
        }
    }

    /// Geocode a place name, using the cache when possible.
    #[instrument(skip(self), level = "info")]
    pub async fn geocode(&self, query: &str) -> Result<Place, WeatherError> {
        if let Some(place) = self.with_cache_mut(|c| c.place(query)).flatten() {
            tracing::debug!("Geocode cache hit for {:?}", query);
            return Ok(place);
        }

        let place = forward_geocode(&self.client, &self.geocoding_url, query, &self.retry).await?;

        let snapshot = self.with_cache_mut(|c| {
            c.store_place(query, &place);
            c.snapshot()
        });
        self.persist(snapshot).await;
        Ok(place)
    }

    /// Hourly forecast for `place` between `start` and `end` (UTC).
    pub async fn hourly_window(
        &self,
        place: &Place,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ForecastWindow, WeatherError> {
        self.hourly_window_at(place, start, end, Utc::now()).await
    }

    /// [`hourly_window`](Self::hourly_window) with an explicit current time.
    #[instrument(skip(self, place), fields(place = %place.name), level = "info")]
    pub async fn hourly_window_at(
        &self,
        place: &Place,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<ForecastWindow, WeatherError> {
        let start = floor_hour(start);
        let end = floor_hour(end).max(start);

        let hours_ahead = (end - now).num_hours();
        if hours_ahead > FORECAST_HORIZON_HOURS {
            return Err(WeatherError::OutOfRange { hours_ahead });
        }

        let key = forecast_key(place, start, end);
        if let Some(window) = self.with_cache_mut(|c| c.forecast(&key, now)).flatten() {
            tracing::debug!("Forecast cache hit for {}", key);
            return Ok(window);
        }

        let url = format!(
            "{}/v1/forecast?latitude={:.4}&longitude={:.4}&hourly=temperature_2m,precipitation,weathercode&timezone=GMT&start_hour={}&end_hour={}",
            self.forecast_url.trim_end_matches('/'),
            place.latitude,
            place.longitude,
            start.format(HOUR_FORMAT),
            end.format(HOUR_FORMAT)
        );

        let response = send_with_retry(&self.retry, || self.client.get(&url).send()).await?;
        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(format!("forecast response: {}", e)))?;
        let hourly = body
            .hourly
            .ok_or_else(|| WeatherError::Parse("forecast response has no hourly data".into()))?;

        let points = hourly.into_points(start, end)?;
        tracing::info!("Fetched {} hourly points for {}", points.len(), place.name);
        let window = ForecastWindow::new(place.clone(), points, now)?;

        let snapshot = self.with_cache_mut(|c| {
            c.prune(now);
            c.store_forecast(key, &window, now);
            c.snapshot()
        });
        self.persist(snapshot).await;
        Ok(window)
    }
}
