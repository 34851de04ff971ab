use serde::Serialize;

use crate::error::CoreResult;
use crate::models::{ReminderTime, SettingsDefaults, UserSettings, normalize_reminder_time};
use crate::store::NotificationScheduler;

pub const REMINDER_TITLE: &str = "Time to train";
pub const REMINDER_BODY: &str = "Log a workout today to keep your streak going.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReminderAction {
    Scheduled {
        #[serde(serialize_with = "serialize_time")]
        at: ReminderTime,
    },
    Cancelled,
}

fn serialize_time<S: serde::Serializer>(time: &ReminderTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(time)
}

/// One repeating reminder at the configured time when enabled, none otherwise.
pub fn apply_reminder_policy<N: NotificationScheduler + ?Sized>(
    scheduler: &N,
    settings: &UserSettings,
    defaults: &SettingsDefaults,
) -> CoreResult<ReminderAction> {
    if !settings.reminders_enabled {
        scheduler.cancel_daily()?;
        tracing::info!(user_id = %settings.user_id, "daily reminder cancelled");
        return Ok(ReminderAction::Cancelled);
    }

    let at = normalize_reminder_time(Some(&settings.reminder_time), defaults);
    scheduler.schedule_daily(at.hour, at.minute, REMINDER_TITLE, REMINDER_BODY)?;
    tracing::info!(user_id = %settings.user_id, %at, "daily reminder scheduled");
    Ok(ReminderAction::Scheduled { at })
}
