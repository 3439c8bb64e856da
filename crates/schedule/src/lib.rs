//! Daily schedule: wake/sleep window and timed events.
//!
//! The schedule document is JSON with `"HH:MM"` times. Parsing is
//! deliberately forgiving: an unparsable document yields an empty schedule,
//! an unparsable time or unknown event type drops that event with a warning.
//! A broken schedule degrades the simulation; it never aborts it.

pub mod circadian;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const MINUTES_PER_DAY: u32 = 1440;

/// Macronutrient load of one meal (grams).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPayload {
    #[serde(alias = "glucose_load", default)]
    pub glucose_load: f64,
    #[serde(alias = "protein_load", default)]
    pub protein_load: f64,
    #[serde(alias = "fat_load", default)]
    pub fat_load: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExerciseIntensity {
    #[serde(alias = "low")]
    Low,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExercisePayload {
    pub intensity: ExerciseIntensity,
    #[serde(alias = "duration_minutes")]
    pub duration_minutes: f64,
}

/// Transient stressor raising the cortisol baseline during its window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressorPayload {
    /// Fractional cortisol-baseline increase, e.g. 0.3 for +30%.
    #[serde(default = "default_stress_intensity")]
    pub intensity: f64,
    #[serde(alias = "duration_minutes", default = "default_stress_duration")]
    pub duration_minutes: f64,
}

fn default_stress_intensity() -> f64 {
    0.3
}

fn default_stress_duration() -> f64 {
    30.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    Meal(MealPayload),
    Exercise(ExercisePayload),
    /// Recognized for schedule completeness; supplements act at
    /// initialization through the simulation config, not mid-run.
    Supplement,
    Stressor(StressorPayload),
}

/// One timed event, `minute` in 0..1440.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub minute: u32,
    pub kind: EventKind,
    pub description: String,
}

/// Wake/sleep window plus the day's events, ordered by minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub wake_minute: u32,
    pub sleep_minute: u32,
    pub events: Vec<ScheduleEvent>,
}

impl Default for Schedule {
    /// Wake 07:00, sleep 23:00, no events.
    fn default() -> Self {
        Self {
            wake_minute: 7 * 60,
            sleep_minute: 23 * 60,
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchedule {
    #[serde(alias = "wake_time")]
    wake_time: String,
    #[serde(alias = "sleep_time")]
    sleep_time: String,
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    time: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Parse `"HH:MM"` into minutes-of-day.
pub fn parse_time(text: &str) -> Option<u32> {
    let (hours, minutes) = text.split_once(':')?;
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

impl Schedule {
    /// Parse the schedule document; on any document-level failure return an
    /// empty default schedule.
    pub fn parse(text: &str) -> Self {
        let raw: RawSchedule = match serde_json::from_str(text) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%err, "unparsable schedule document, using empty schedule");
                return Self::default();
            }
        };

        let wake_minute = match parse_time(&raw.wake_time) {
            Some(m) => m,
            None => {
                warn!(time = %raw.wake_time, "bad wake time, defaulting to 07:00");
                7 * 60
            }
        };
        let sleep_minute = match parse_time(&raw.sleep_time) {
            Some(m) => m,
            None => {
                warn!(time = %raw.sleep_time, "bad sleep time, defaulting to 23:00");
                23 * 60
            }
        };

        let mut events: Vec<ScheduleEvent> = raw
            .events
            .into_iter()
            .filter_map(convert_event)
            .collect();
        events.sort_by_key(|e| e.minute);

        Self {
            wake_minute,
            sleep_minute,
            events,
        }
    }

    pub fn from_file(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(err) => {
                warn!(path = %path.display(), %err, "unreadable schedule, using empty schedule");
                Self::default()
            }
        }
    }

    /// Whether `minute` falls inside the sleep window, handling windows that
    /// span midnight.
    pub fn is_asleep(&self, minute: u32) -> bool {
        let minute = minute % MINUTES_PER_DAY;
        if self.sleep_minute > self.wake_minute {
            minute >= self.sleep_minute || minute < self.wake_minute
        } else {
            minute >= self.sleep_minute && minute < self.wake_minute
        }
    }

    /// Hours awake at `minute`, zero while asleep.
    pub fn hours_since_wake(&self, minute: u32) -> f64 {
        let minute = minute % MINUTES_PER_DAY;
        if self.is_asleep(minute) {
            return 0.0;
        }
        let elapsed = if minute >= self.wake_minute {
            minute - self.wake_minute
        } else {
            minute + MINUTES_PER_DAY - self.wake_minute
        };
        f64::from(elapsed) / 60.0
    }
}

fn convert_event(raw: RawEvent) -> Option<ScheduleEvent> {
    let minute = match parse_time(&raw.time) {
        Some(m) => m,
        None => {
            warn!(time = %raw.time, kind = %raw.kind, "dropping event with unparsable time");
            return None;
        }
    };

    let kind = match raw.kind.as_str() {
        "Meal" | "meal" => EventKind::Meal(parse_payload(&raw.payload, &raw.kind)?),
        "Exercise" | "exercise" => EventKind::Exercise(parse_payload(&raw.payload, &raw.kind)?),
        "Supplement" | "supplement" => EventKind::Supplement,
        "Stressor" | "stressor" => EventKind::Stressor(parse_payload(&raw.payload, &raw.kind)?),
        other => {
            warn!(kind = other, "dropping event with unknown type");
            return None;
        }
    };

    Some(ScheduleEvent {
        minute,
        kind,
        description: raw.description,
    })
}

fn parse_payload<T: for<'de> Deserialize<'de>>(value: &serde_json::Value, kind: &str) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!(kind, %err, "dropping event with malformed payload");
            None
        }
    }
}
