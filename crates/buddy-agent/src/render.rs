//! Reply and summary text.

use buddy_core::TemperatureUnit;
use buddy_weather::{ForecastWindow, Place};

use crate::advice::{advice_for, TimeOfDay, Warmth};

/// The unit replies about `place` use. `Auto` means Fahrenheit in the
/// United States and Celsius everywhere else.
pub fn unit_for(unit: TemperatureUnit, place: &Place) -> TemperatureUnit {
    match unit {
        TemperatureUnit::Auto if place.country_code.as_deref() == Some("US") => {
            TemperatureUnit::Fahrenheit
        }
        TemperatureUnit::Auto => TemperatureUnit::Celsius,
        other => other,
    }
}

/// Rounded temperature with its unit. An unresolved `Auto` shows Celsius.
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Fahrenheit => format!("{}°F", (celsius * 9.0 / 5.0 + 32.0).round() as i64),
        TemperatureUnit::Celsius | TemperatureUnit::Auto => format!("{}°C", celsius.round() as i64),
    }
}

/// The full answer: one sentence about the weather, then the advice.
pub fn render_reply(
    place: &str,
    time_of_day: TimeOfDay,
    window: &ForecastWindow,
    unit: TemperatureUnit,
) -> String {
    let rain = if window.average_precipitation() > 0.0 {
        "some rain"
    } else {
        "dry skies"
    };
    format!(
        "In {} during the {}, it\u{2019}ll be around {} with {}.\n{}",
        place,
        time_of_day,
        format_temperature(window.average_temperature(), unit_for(unit, &window.place)),
        rain,
        advice_for(window).join(" ")
    )
}

/// Short self-contained summary kept for follow-up questions.
pub fn render_summary(
    place: &str,
    time_of_day: TimeOfDay,
    window: &ForecastWindow,
    unit: TemperatureUnit,
) -> String {
    let rain = if window.average_precipitation() > 0.0 {
        "light rain/drizzle likely"
    } else {
        "no rain expected"
    };
    format!(
        "{}, {}: about {}, {}. {}.",
        place,
        time_of_day,
        format_temperature(window.average_temperature(), unit_for(unit, &window.place)),
        rain,
        Warmth::from_celsius(window.average_temperature()).hint()
    )
}

pub fn failure_summary(location: &str) -> String {
    format!("Weather unknown for {} right now.", location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use buddy_weather::{HourlyPoint, Place, WeatherCondition};
    use chrono::{TimeZone, Utc};

    fn place_in(country_code: Option<&str>) -> Place {
        Place {
            name: "Toronto".into(),
            latitude: 43.7,
            longitude: -79.4,
            country: None,
            country_code: country_code.map(String::from),
            admin1: None,
            timezone: None,
        }
    }

    fn window(temps: &[f64], precip: f64, code: i32) -> ForecastWindow {
        window_in(None, temps, precip, code)
    }

    fn window_in(country_code: Option<&str>, temps: &[f64], precip: f64, code: i32) -> ForecastWindow {
        let place = place_in(country_code);
        let points = temps
            .iter()
            .enumerate()
            .map(|(i, &t)| HourlyPoint {
                time: Utc.with_ymd_and_hms(2026, 10, 14, 12 + i as u32, 0, 0).unwrap(),
                temperature_c: t,
                precipitation_mm: precip,
                condition: WeatherCondition::from_wmo_code(code),
            })
            .collect();
        ForecastWindow::new(place, points, Utc::now()).unwrap()
    }

    #[test]
    fn temperature_units() {
        assert_eq!(format_temperature(15.4, TemperatureUnit::Celsius), "15°C");
        assert_eq!(format_temperature(15.6, TemperatureUnit::Auto), "16°C");
        assert_eq!(format_temperature(-0.3, TemperatureUnit::Celsius), "0°C");
        assert_eq!(format_temperature(20.0, TemperatureUnit::Fahrenheit), "68°F");
    }

    #[test]
    fn auto_unit_follows_the_country() {
        let us = place_in(Some("US"));
        let canada = place_in(Some("CA"));
        assert_eq!(unit_for(TemperatureUnit::Auto, &us), TemperatureUnit::Fahrenheit);
        assert_eq!(unit_for(TemperatureUnit::Auto, &canada), TemperatureUnit::Celsius);
        assert_eq!(unit_for(TemperatureUnit::Auto, &place_in(None)), TemperatureUnit::Celsius);
        assert_eq!(unit_for(TemperatureUnit::Celsius, &us), TemperatureUnit::Celsius);
        assert_eq!(unit_for(TemperatureUnit::Fahrenheit, &canada), TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn auto_unit_in_reply_and_summary() {
        let us = window_in(Some("US"), &[14.0, 16.0], 0.0, 1);
        assert!(render_reply("Fremont", TimeOfDay::Evening, &us, TemperatureUnit::Auto)
            .contains("around 59°F"));
        assert!(render_summary("Fremont", TimeOfDay::Evening, &us, TemperatureUnit::Auto)
            .contains("about 59°F"));

        let france = window_in(Some("FR"), &[14.0, 16.0], 0.0, 1);
        assert!(render_reply("Paris", TimeOfDay::Evening, &france, TemperatureUnit::Auto)
            .contains("around 15°C"));
        assert!(render_summary("Paris", TimeOfDay::Evening, &france, TemperatureUnit::Auto)
            .contains("about 15°C"));
    }

    #[test]
    fn rainy_chilly_reply() {
        let reply = render_reply(
            "Toronto",
            TimeOfDay::Afternoon,
            &window(&[9.0, 10.0], 0.5, 61),
            TemperatureUnit::Celsius,
        );
        assert_eq!(
            reply,
            "In Toronto during the afternoon, it\u{2019}ll be around 10°C with some rain.\n\
             Wear something warm, like a sweater or coat. \
             Don\u{2019}t forget an umbrella, there\u{2019}s a good chance of rain."
        );
    }

    #[test]
    fn dry_mild_reply_and_summary() {
        let w = window(&[14.0, 16.0], 0.0, 1);
        let reply = render_reply("Fremont", TimeOfDay::Evening, &w, TemperatureUnit::Celsius);
        assert_eq!(
            reply,
            "In Fremont during the evening, it\u{2019}ll be around 15°C with dry skies.\n\
             A light jacket should be fine."
        );

        let summary = render_summary("Fremont", TimeOfDay::Evening, &w, TemperatureUnit::Celsius);
        assert_eq!(
            summary,
            "Fremont, evening: about 15°C, no rain expected. light jacket ok."
        );
    }

    #[test]
    fn thunderstorm_adds_caution() {
        let reply = render_reply(
            "Miami",
            TimeOfDay::Afternoon,
            &window(&[29.0], 3.0, 95),
            TemperatureUnit::Fahrenheit,
        );
        assert!(reply.contains("around 84°F"));
        assert!(reply.ends_with("stay indoors if you can."));
    }

    #[test]
    fn failure_summary_names_location() {
        assert_eq!(
            failure_summary("Atlantis"),
            "Weather unknown for Atlantis right now."
        );
    }
}
