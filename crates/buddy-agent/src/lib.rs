//! Conversation layer of Weather Buddy.
//!
//! [`WeatherAgent`] ties intent extraction, forecasting and advice together
//! and remembers enough of the chat to answer follow-ups.

pub mod advice;
pub mod agent;
pub mod conversation;
pub mod render;

pub use advice::{TimeOfDay, Warmth};
pub use agent::{
    AgentResponse, AgentSettings, ForecastSource, ResponseKind, WeatherAgent, NEED_LOCATION_REPLY,
    NOT_WEATHER_REPLY,
};
pub use conversation::{Conversation, Speaker, Turn};
