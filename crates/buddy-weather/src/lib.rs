//! Weather data for Weather Buddy
//!
//! Geocoding and hourly forecasts from the Open-Meteo APIs, with retry and a
//! small persistent cache.

pub mod cache;
pub mod geocode;
pub mod provider;
pub mod retry;
pub mod types;

pub use cache::{CacheSnapshot, WeatherCache};
pub use geocode::forward_geocode;
pub use provider::{WeatherProvider, FORECAST_HORIZON_HOURS};
pub use retry::RetryPolicy;
pub use types::*;
