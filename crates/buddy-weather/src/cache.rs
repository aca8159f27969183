//! File-backed cache for geocoding results and forecast windows.
//!
//! Places never expire. Forecasts are kept for a configurable TTL so repeat
//! questions in a chat session do not hit the network again.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ForecastWindow, Place, WeatherError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedForecast {
    stored_at: DateTime<Utc>,
    window: ForecastWindow,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    places: HashMap<String, Place>,
    #[serde(default)]
    forecasts: HashMap<String, CachedForecast>,
}

/// Serialized cache contents, written without holding the cache.
#[derive(Debug)]
pub struct CacheSnapshot {
    path: PathBuf,
    json: String,
}

impl CacheSnapshot {
    pub fn write(&self) -> Result<(), WeatherError> {
        let path = &self.path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| WeatherError::Cache(format!("create {:?}: {}", parent, e)))?;
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &self.json)
            .map_err(|e| WeatherError::Cache(format!("write {:?}: {}", tmp, e)))?;
        fs::rename(&tmp, path)
            .map_err(|e| WeatherError::Cache(format!("rename to {:?}: {}", path, e)))?;

        tracing::debug!("Saved weather cache to {:?}", path);
        Ok(())
    }
}

#[derive(Debug)]
pub struct WeatherCache {
    /// `None` for an in-memory cache
    cache_path: Option<PathBuf>,
    ttl: Duration,
    data: CacheFile,
}

fn place_key(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Key for a forecast request: rounded coordinates plus the UTC hour range.
pub fn forecast_key(place: &Place, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "{:.3},{:.3}@{}/{}",
        place.latitude,
        place.longitude,
        start.format("%Y-%m-%dT%H"),
        end.format("%Y-%m-%dT%H")
    )
}

impl WeatherCache {
    /// Open the cache at `config_dir/weather_cache.json`. A missing or
    /// unreadable file starts an empty cache.
    pub fn open(cache_path: &Path, ttl_minutes: u64) -> Self {
        let data = match fs::read_to_string(cache_path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("Ignoring corrupt weather cache {:?}: {}", cache_path, e);
                CacheFile::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CacheFile::default(),
            Err(e) => {
                tracing::warn!("Failed to read weather cache {:?}: {}", cache_path, e);
                CacheFile::default()
            }
        };
        tracing::debug!(
            "Loaded weather cache with {} places and {} forecasts",
            data.places.len(),
            data.forecasts.len()
        );

        Self {
            cache_path: Some(cache_path.to_path_buf()),
            ttl: ttl_duration(ttl_minutes),
            data,
        }
    }

    pub fn in_memory(ttl_minutes: u64) -> Self {
        Self {
            cache_path: None,
            ttl: ttl_duration(ttl_minutes),
            data: CacheFile::default(),
        }
    }

    pub fn place(&self, query: &str) -> Option<Place> {
        self.data.places.get(&place_key(query)).cloned()
    }

    pub fn store_place(&mut self, query: &str, place: &Place) {
        self.data.places.insert(place_key(query), place.clone());
    }

    /// A cached forecast that is still fresh at `now`.
    pub fn forecast(&self, key: &str, now: DateTime<Utc>) -> Option<ForecastWindow> {
        self.data
            .forecasts
            .get(key)
            .filter(|entry| now - entry.stored_at < self.ttl)
            .map(|entry| entry.window.clone())
    }

    pub fn store_forecast(&mut self, key: String, window: &ForecastWindow, now: DateTime<Utc>) {
        if self.ttl <= Duration::zero() {
            return;
        }
        self.data.forecasts.insert(
            key,
            CachedForecast {
                stored_at: now,
                window: window.clone(),
            },
        );
    }

    /// Drop expired forecasts. Returns how many were removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.data.forecasts.len();
        let ttl = self.ttl;
        self.data
            .forecasts
            .retain(|_, entry| now - entry.stored_at < ttl);
        before - self.data.forecasts.len()
    }

    /// Serialize the cache for writing. `None` for an in-memory cache.
    pub fn snapshot(&self) -> Result<Option<CacheSnapshot>, WeatherError> {
        let Some(path) = &self.cache_path else {
            return Ok(None);
        };
        let json = serde_json::to_string(&self.data)
            .map_err(|e| WeatherError::Cache(format!("serialize: {}", e)))?;
        Ok(Some(CacheSnapshot {
            path: path.clone(),
            json,
        }))
    }

    /// Write the cache to disk via a temporary file and rename.
    pub fn save(&self) -> Result<(), WeatherError> {
        match self.snapshot()? {
            Some(snapshot) => snapshot.write(),
            None => Ok(()),
        }
    }
}

fn ttl_duration(minutes: u64) -> Duration {
    Duration::minutes(i64::try_from(minutes).unwrap_or(i64::MAX / 60_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HourlyPoint, WeatherCondition};
    use chrono::TimeZone;

    fn place() -> Place {
        Place {
            name: "Toronto".into(),
            latitude: 43.70011,
            longitude: -79.4163,
            country: Some("Canada".into()),
            country_code: Some("CA".into()),
            admin1: Some("Ontario".into()),
            timezone: Some("America/Toronto".into()),
        }
    }

    fn window(at: DateTime<Utc>) -> ForecastWindow {
        let points = vec![HourlyPoint {
            time: at,
            temperature_c: 7.5,
            precipitation_mm: 0.4,
            condition: WeatherCondition::Rain,
        }];
        ForecastWindow::new(place(), points, at).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_forecast_key_format() {
        let key = forecast_key(&place(), now(), now() + Duration::hours(2));
        assert_eq!(key, "43.700,-79.416@2026-10-14T10/2026-10-14T12");
    }

    #[test]
    fn test_place_lookup_ignores_case_and_spacing() {
        let mut cache = WeatherCache::in_memory(15);
        cache.store_place("Toronto", &place());
        assert_eq!(cache.place("  toronto "), Some(place()));
        assert_eq!(cache.place("Paris"), None);
    }

    #[test]
    fn test_forecast_expires_after_ttl() {
        let mut cache = WeatherCache::in_memory(15);
        cache.store_forecast("k".into(), &window(now()), now());

        assert!(cache.forecast("k", now() + Duration::minutes(14)).is_some());
        assert!(cache.forecast("k", now() + Duration::minutes(15)).is_none());

        assert_eq!(cache.prune(now() + Duration::minutes(20)), 1);
        assert!(cache.forecast("k", now()).is_none());
    }

    #[test]
    fn test_zero_ttl_disables_forecast_cache() {
        let mut cache = WeatherCache::in_memory(0);
        cache.store_forecast("k".into(), &window(now()), now());
        assert!(cache.forecast("k", now()).is_none());
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_cache.json");

        let mut cache = WeatherCache::open(&path, 15);
        cache.store_place("Toronto", &place());
        cache.store_forecast("k".into(), &window(now()), now());
        cache.save().unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = WeatherCache::open(&path, 15);
        assert_eq!(reopened.place("toronto"), Some(place()));
        assert_eq!(reopened.forecast("k", now()), Some(window(now())));
    }

    #[test]
    fn test_snapshot_is_independent_of_later_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("weather_cache.json");

        let mut cache = WeatherCache::open(&path, 15);
        cache.store_place("Toronto", &place());
        let snapshot = cache.snapshot().unwrap().unwrap();
        cache.store_place("Elsewhere", &place());
        snapshot.write().unwrap();

        let reopened = WeatherCache::open(&path, 15);
        assert_eq!(reopened.place("Toronto"), Some(place()));
        assert_eq!(reopened.place("Elsewhere"), None);
    }

    #[test]
    fn test_in_memory_has_no_snapshot() {
        let cache = WeatherCache::in_memory(15);
        assert!(cache.snapshot().unwrap().is_none());
        assert!(cache.save().is_ok());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_cache.json");
        fs::write(&path, "{ not json").unwrap();

        let cache = WeatherCache::open(&path, 15);
        assert_eq!(cache.place("Toronto"), None);
    }
}
