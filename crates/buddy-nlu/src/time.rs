//! Time-reference extraction and resolution.
//!
//! Extraction turns a phrase such as "next Friday at 6 pm" into a
//! [`TimeReference`] without looking at the clock. Resolution then anchors
//! the reference to "now" in whatever time zone the place lives in, which
//! lets "tomorrow morning in Tokyo" mean Tokyo's morning.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lexicon::parse_weekday;

/// Hours ahead assumed for "later".
pub const LATER_OFFSET_HOURS: u32 = 3;

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("time pattern literals are valid")
}

static OFFSET_HOURS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(?:in\s+)?(\d{1,3})\s*(?:hours?|hrs?|h)\b"));
static OFFSET_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\bin\s+(an|a|one|two|three|four|five|six|a couple of|a few)\s+hours?\b")
});
static OFFSET_MINUTES: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\bin\s+(\d{1,3})\s*(?:minutes?|mins?)\b"));
static NOW: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(?:right now|now|currently|at the moment)\b"));
static LATER: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(?:later today|later)\b"));
static WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"\b(?:(next|this|coming|on)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
});
static WEEKEND: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(?:(?:this|the|next|coming)\s+)?weekend\b"));
static TOMORROW: LazyLock<Regex> = LazyLock::new(|| compile(r"\btomorrow\b"));
static TONIGHT: LazyLock<Regex> = LazyLock::new(|| compile(r"\btonight\b"));
static TODAY: LazyLock<Regex> = LazyLock::new(|| compile(r"\btoday\b"));
static PART_OF_DAY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(this\s+)?(morning|afternoon|evening|night)\b"));
static CLOCK_MERIDIEM: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(?:at\s+|around\s+)?(\d{1,2})(?::(\d{2}))?\s*(a\.?m\.?|p\.?m\.?)(?:\s|$|[^a-z])")
});
static CLOCK_24H: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(?:at|around)\s+(\d{1,2}):(\d{2})\b"));
static NOON: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(?:at\s+)?(noon|midday|midnight)\b"));

/// Which day a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DayAnchor {
    Today,
    Tomorrow,
    /// `next` is true for "next Friday", which never means today.
    Weekday { day: Weekday, next: bool },
    Weekend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
}

impl ClockTime {
    pub const fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    fn to_naive(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour % 24, self.minute % 60, 0).unwrap_or_default()
    }
}

/// Clock hours used for parts of the day.
pub const MORNING: ClockTime = ClockTime::new(8, 0);
pub const AFTERNOON: ClockTime = ClockTime::new(14, 0);
pub const EVENING: ClockTime = ClockTime::new(18, 0);
pub const NIGHT: ClockTime = ClockTime::new(21, 0);
pub const NOON_TIME: ClockTime = ClockTime::new(12, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum TimeKind {
    /// A fixed number of hours from now ("in 6 hours", "now", "later")
    Offset { hours: u32 },
    /// A day and optional clock time. `anchor: None` means the day was not
    /// named, so a time already past rolls over to tomorrow.
    Calendar {
        anchor: Option<DayAnchor>,
        clock: Option<ClockTime>,
    },
}

/// A time expression found in a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeReference {
    /// The words that were recognized, in message order
    pub phrase: String,
    pub kind: TimeKind,
}

/// A concrete forecast window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWindow<Tz: TimeZone> {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> ResolvedWindow<Tz> {
    /// The default window: starting now.
    pub fn starting_now(now: &DateTime<Tz>, width_hours: u32) -> Self {
        Self {
            start: now.clone(),
            end: now.clone() + Duration::hours(i64::from(width_hours)),
        }
    }

    pub fn midpoint(&self) -> DateTime<Tz> {
        let half = (self.end.clone() - self.start.clone()) / 2;
        self.start.clone() + half
    }

    /// Hour offsets of this window relative to `now`.
    pub fn hour_window(&self, now: &DateTime<Tz>) -> HourWindow {
        let start = (self.start.clone() - now.clone()).num_hours().max(0);
        let width = (self.end.clone() - self.start.clone()).num_hours().max(0);
        HourWindow {
            start_hour: u32::try_from(start).unwrap_or(u32::MAX),
            end_hour: u32::try_from(start + width).unwrap_or(u32::MAX),
        }
    }
}

/// Window expressed as whole hours from now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

fn span_text(text: &str, m: &regex::Match<'_>) -> (usize, String) {
    (m.start(), text[m.start()..m.end()].trim().to_string())
}

fn word_number(word: &str) -> u32 {
    match word {
        "an" | "a" | "one" => 1,
        "two" | "a couple of" => 2,
        "three" | "a few" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        _ => 1,
    }
}

fn parse_clock(lower: &str, pieces: &mut Vec<(usize, String)>) -> Option<ClockTime> {
    if let Some(caps) = CLOCK_MERIDIEM.captures(lower) {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        let pm = caps.get(3)?.as_str().starts_with('p');
        if (1..=12).contains(&hour) && minute < 60 {
            let hour = match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            };
            let whole = caps.get(0)?;
            let (start, text) = span_text(lower, &whole);
            let text = text.trim_end_matches(|c: char| !c.is_ascii_alphanumeric() && c != '.');
            pieces.push((start, text.trim_end_matches('.').to_string()));
            return Some(ClockTime::new(hour, minute));
        }
    }

    if let Some(caps) = CLOCK_24H.captures(lower) {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
        if hour < 24 && minute < 60 {
            pieces.push(span_text(lower, &caps.get(0)?));
            return Some(ClockTime::new(hour, minute));
        }
    }

    if let Some(caps) = NOON.captures(lower) {
        pieces.push(span_text(lower, &caps.get(0)?));
        return Some(match caps.get(1)?.as_str() {
            "midnight" => ClockTime::new(0, 0),
            _ => NOON_TIME,
        });
    }

    None
}

/// Find a time expression in a normalized message.
pub fn extract_time(text: &str) -> Option<TimeReference> {
    let lower = text.to_ascii_lowercase();

    // Relative offsets win outright.
    if let Some(caps) = OFFSET_WORDS.captures(&lower) {
        let hours = caps.get(1).map_or(1, |m| word_number(m.as_str()));
        let phrase = caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default();
        return Some(TimeReference {
            phrase,
            kind: TimeKind::Offset { hours },
        });
    }
    if let Some(caps) = OFFSET_HOURS.captures(&lower) {
        if let Some(hours) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
            let phrase = caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default();
            return Some(TimeReference {
                phrase,
                kind: TimeKind::Offset { hours },
            });
        }
    }
    if let Some(caps) = OFFSET_MINUTES.captures(&lower) {
        if let Some(minutes) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
            let phrase = caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default();
            return Some(TimeReference {
                phrase,
                kind: TimeKind::Offset {
                    hours: minutes / 60,
                },
            });
        }
    }

    let mut pieces: Vec<(usize, String)> = Vec::new();
    let mut anchor = None;
    let mut clock = None;
    let mut tonight = false;

    if let Some(m) = TOMORROW.find(&lower) {
        pieces.push(span_text(&lower, &m));
        anchor = Some(DayAnchor::Tomorrow);
    } else if let Some(m) = TONIGHT.find(&lower) {
        pieces.push(span_text(&lower, &m));
        anchor = Some(DayAnchor::Today);
        tonight = true;
    } else if let Some(caps) = WEEKDAY.captures(&lower) {
        let day = caps.get(2).and_then(|m| parse_weekday(m.as_str()));
        if let (Some(day), Some(whole)) = (day, caps.get(0)) {
            let next = caps.get(1).is_some_and(|m| m.as_str() == "next");
            pieces.push(span_text(&lower, &whole));
            anchor = Some(DayAnchor::Weekday { day, next });
        }
    } else if let Some(m) = WEEKEND.find(&lower) {
        pieces.push(span_text(&lower, &m));
        anchor = Some(DayAnchor::Weekend);
    } else if let Some(m) = TODAY.find(&lower) {
        pieces.push(span_text(&lower, &m));
        anchor = Some(DayAnchor::Today);
    }

    clock = parse_clock(&lower, &mut pieces);
    if clock.is_none() && tonight {
        clock = Some(NIGHT);
    }

    if clock.is_none() {
        if let Some(caps) = PART_OF_DAY.captures(&lower) {
            if let (Some(whole), Some(part)) = (caps.get(0), caps.get(2)) {
                pieces.push(span_text(&lower, &whole));
                clock = Some(match part.as_str() {
                    "morning" => MORNING,
                    "afternoon" => AFTERNOON,
                    "evening" => EVENING,
                    _ => NIGHT,
                });
                if caps.get(1).is_some() && anchor.is_none() {
                    anchor = Some(DayAnchor::Today);
                }
            }
        }
    }

    if anchor.is_none() && clock.is_none() {
        // "now" and "later" only count when nothing more specific was said.
        if let Some(m) = NOW.find(&lower) {
            return Some(TimeReference {
                phrase: m.as_str().to_string(),
                kind: TimeKind::Offset { hours: 0 },
            });
        }
        if let Some(m) = LATER.find(&lower) {
            return Some(TimeReference {
                phrase: m.as_str().to_string(),
                kind: TimeKind::Offset {
                    hours: LATER_OFFSET_HOURS,
                },
            });
        }
        return None;
    }

    pieces.sort_by_key(|(start, _)| *start);
    pieces.dedup_by(|a, b| a.1 == b.1);
    let phrase = pieces
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join(" ");

    Some(TimeReference {
        phrase,
        kind: TimeKind::Calendar { anchor, clock },
    })
}

/// Days from `today` until `target`, 0..=6.
fn days_until(today: Weekday, target: Weekday) -> i64 {
    let diff = i64::from(target.num_days_from_monday()) - i64::from(today.num_days_from_monday());
    (diff + 7) % 7
}

fn localize<Tz: TimeZone>(now: &DateTime<Tz>, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let naive = date.and_time(time);
    tz.from_local_datetime(&naive)
        .earliest()
        // Falls in a DST gap: the hour after exists.
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .unwrap_or_else(|| now.clone())
}

impl TimeReference {
    /// Anchor the reference to `now`, producing a window `width_hours` wide.
    /// Targets in the past are clamped to `now`.
    pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>, width_hours: u32) -> ResolvedWindow<Tz> {
        let start = match self.kind {
            TimeKind::Offset { hours } => now.clone() + Duration::hours(i64::from(hours)),
            TimeKind::Calendar { anchor, clock } => resolve_calendar(now, anchor, clock),
        };

        let start = if start < *now { now.clone() } else { start };
        let end = start.clone() + Duration::hours(i64::from(width_hours));
        ResolvedWindow { start, end }
    }
}

fn resolve_calendar<Tz: TimeZone>(
    now: &DateTime<Tz>,
    anchor: Option<DayAnchor>,
    clock: Option<ClockTime>,
) -> DateTime<Tz> {
    let today = now.date_naive();
    let current_time = now.time();

    let (days_ahead, default_time) = match anchor {
        None | Some(DayAnchor::Today) => (0, current_time),
        Some(DayAnchor::Tomorrow) => (1, current_time),
        Some(DayAnchor::Weekday { day, next }) => {
            let mut days = days_until(today.weekday(), day);
            if next && days == 0 {
                days = 7;
            }
            (days, NOON_TIME.to_naive())
        }
        Some(DayAnchor::Weekend) => {
            let days = match today.weekday() {
                Weekday::Sat | Weekday::Sun => 0,
                wd => days_until(wd, Weekday::Sat),
            };
            (days, NOON_TIME.to_naive())
        }
    };

    let time = clock.map_or(default_time, ClockTime::to_naive);
    let date = today + Duration::days(days_ahead);
    let target = localize(now, date, time);

    // An unnamed day means the next occurrence of that clock time.
    if anchor.is_none() && target < *now {
        return localize(now, date + Duration::days(1), time);
    }
    target
}
