//! Query understanding for Weather Buddy.
//!
//! Short, fragmentary questions ("Weather Fremont tomorrow?") are turned
//! into a [`WeatherIntent`]: whether the message is about the weather, which
//! place it names and what time it refers to.

pub mod intent;
pub mod lexicon;
pub mod location;
pub mod normalize;
pub mod time;

pub use intent::{is_weather_query, IntentExtractor, IntentParser, WeatherIntent};
pub use location::{extract_location, LocationMatch, LocationSource};
pub use normalize::normalize_text;
pub use time::{
    extract_time, ClockTime, DayAnchor, HourWindow, ResolvedWindow, TimeKind, TimeReference,
};
