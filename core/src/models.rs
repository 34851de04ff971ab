use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    /// One free-text instruction per entry, in order.
    pub plan: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Most recent completion, kept on the row for older clients.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewWorkout {
    pub name: String,
    #[serde(default)]
    pub plan: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default)]
#[allow(clippy::option_option)]
pub struct UpdateWorkout {
    pub name: Option<String>,
    pub plan: Option<Vec<String>>,
    /// `Some(None)` clears the category.
    pub category: Option<Option<String>>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

impl UpdateWorkout {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.plan.is_none()
            && self.category.is_none()
            && self.image_url.is_none()
            && self.video_url.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Completion {
    pub id: i64,
    pub user_id: String,
    /// `None` once the referenced workout has been deleted.
    pub workout_id: Option<i64>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCompletion {
    pub workout_id: Option<i64>,
    pub completed_at: DateTime<Utc>,
}

/// A completion joined with its workout's display fields, for day drill-down.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionDetail {
    pub completion_id: i64,
    pub workout_id: Option<i64>,
    pub workout_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSettings {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub level: Option<String>,
    pub weekly_target: u32,
    pub reminders_enabled: bool,
    /// Always a valid `HH:MM` once stored.
    pub reminder_time: String,
    pub points: i64,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    #[must_use]
    pub fn with_defaults(user_id: &str, defaults: &SettingsDefaults, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            goal: None,
            level: None,
            weekly_target: defaults.weekly_target,
            reminders_enabled: false,
            reminder_time: defaults.reminder_time.to_string(),
            points: 0,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn points_u64(&self) -> u64 {
        u64::try_from(self.points).unwrap_or(0)
    }
}

/// Settings as submitted by a user, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsInput {
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub weekly_target: Option<i64>,
    #[serde(default)]
    pub reminders_enabled: bool,
    #[serde(default)]
    pub reminder_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsDefaults {
    pub weekly_target: u32,
    pub reminder_time: ReminderTime,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            weekly_target: 3,
            reminder_time: ReminderTime { hour: 19, minute: 0 },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Time of day for the daily reminder, 24-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderTime {
    pub hour: u32,
    pub minute: u32,
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Parse a strict `HH:MM` 24-hour time.
pub fn parse_reminder_time(s: &str) -> CoreResult<ReminderTime> {
    let invalid = || CoreError::InvalidConfiguration(format!("reminder time '{s}' is not HH:MM"));
    let (h, m) = s.split_once(':').ok_or_else(invalid)?;
    if h.len() != 2 || m.len() != 2 || !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok(ReminderTime { hour, minute })
}

/// Invalid or missing input falls back to the default reminder time.
pub fn normalize_reminder_time(input: Option<&str>, defaults: &SettingsDefaults) -> ReminderTime {
    match input.map(str::trim) {
        None | Some("") => defaults.reminder_time,
        Some(s) => parse_reminder_time(s).unwrap_or_else(|e| {
            tracing::warn!("{e}; using {}", defaults.reminder_time);
            defaults.reminder_time
        }),
    }
}

/// Non-positive or missing targets fall back to the default.
pub fn normalize_weekly_target(input: Option<i64>, defaults: &SettingsDefaults) -> u32 {
    match input {
        Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
        Some(n) => {
            tracing::warn!(
                "weekly target {n} must be positive; using {}",
                defaults.weekly_target
            );
            defaults.weekly_target
        }
        None => defaults.weekly_target,
    }
}

/// Split free text into plan steps: one per non-blank line, trimmed.
#[must_use]
pub fn parse_plan(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub fn validate_workout_name(name: &str) -> CoreResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid_input("Workout name must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Trim optional free-text labels (goal, level, category), dropping blanks.
#[must_use]
pub fn normalize_label(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
