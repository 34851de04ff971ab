use anyhow::{Result, bail};
use std::path::Path;

use reps_core::models::{ProfileInput, SettingsInput, UserSettings};
use reps_core::reminders::ReminderAction;

use super::helpers::read_media;
use crate::Service;

/// Flags passed to `reps settings set`; unset flags keep the stored value.
#[derive(Debug, Default)]
pub(crate) struct SettingsArgs {
    pub goal: Option<String>,
    pub level: Option<String>,
    pub weekly_target: Option<i64>,
    pub reminders: Option<bool>,
    pub reminder_time: Option<String>,
}

impl SettingsArgs {
    fn is_empty(&self) -> bool {
        self.goal.is_none()
            && self.level.is_none()
            && self.weekly_target.is_none()
            && self.reminders.is_none()
            && self.reminder_time.is_none()
    }

    fn merge(self, current: &UserSettings) -> SettingsInput {
        SettingsInput {
            goal: self.goal.or_else(|| current.goal.clone()),
            level: self.level.or_else(|| current.level.clone()),
            weekly_target: self
                .weekly_target
                .or(Some(i64::from(current.weekly_target))),
            reminders_enabled: self.reminders.unwrap_or(current.reminders_enabled),
            reminder_time: self
                .reminder_time
                .or_else(|| Some(current.reminder_time.clone())),
        }
    }
}

fn print_settings(settings: &UserSettings) {
    println!("  Goal:          {}", settings.goal.as_deref().unwrap_or("-"));
    println!("  Level:         {}", settings.level.as_deref().unwrap_or("-"));
    println!("  Weekly target: {} workout(s)", settings.weekly_target);
    if settings.reminders_enabled {
        println!("  Reminder:      daily at {}", settings.reminder_time);
    } else {
        println!("  Reminder:      off");
    }
}

pub(crate) fn cmd_settings_show(service: &Service, json: bool) -> Result<()> {
    let settings = service.settings()?;

    if json {
        let reminder = service.reminder()?;
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "settings": settings,
                "scheduled_reminder": reminder,
            }))?
        );
    } else {
        println!("Settings for {}", settings.user_id);
        print_settings(&settings);
    }

    Ok(())
}

pub(crate) fn cmd_settings_set(service: &Service, args: SettingsArgs, json: bool) -> Result<()> {
    if args.is_empty() {
        bail!(
            "Nothing to update. Provide at least one of --goal, --level, --weekly-target, --reminders, or --reminder-time"
        );
    }

    let current = service.settings()?;
    let saved = service.save_settings(args.merge(&current))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        println!("Saved settings");
        print_settings(&saved.settings);
        match saved.reminder {
            ReminderAction::Scheduled { at } => println!("Daily reminder scheduled for {at}"),
            ReminderAction::Cancelled => println!("Daily reminder cancelled"),
        }
    }

    Ok(())
}

pub(crate) fn cmd_profile_show(service: &Service, json: bool) -> Result<()> {
    let profile = service.profile()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("User:   {}", profile.user_id);
        println!("Name:   {}", profile.full_name.as_deref().unwrap_or("-"));
        println!("Avatar: {}", profile.avatar_url.as_deref().unwrap_or("-"));
    }

    Ok(())
}

pub(crate) fn cmd_profile_set(service: &Service, full_name: Option<String>, json: bool) -> Result<()> {
    let profile = service.save_profile(ProfileInput { full_name })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        match profile.full_name {
            Some(ref name) => println!("Profile name set to {name}"),
            None => println!("Profile name cleared"),
        }
    }

    Ok(())
}

pub(crate) fn cmd_profile_avatar(service: &Service, file: &Path, json: bool) -> Result<()> {
    let (bytes, content_type) = read_media(file)?;
    let profile = service.set_avatar(&bytes, content_type)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("Avatar updated: {}", profile.avatar_url.as_deref().unwrap_or("-"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reps_core::models::SettingsDefaults;

    fn stored() -> UserSettings {
        let mut s = UserSettings::with_defaults("u1", &SettingsDefaults::default(), Utc::now());
        s.goal = Some("strength".to_string());
        s.weekly_target = 4;
        s.reminders_enabled = true;
        s.reminder_time = "07:30".to_string();
        s
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let input = SettingsArgs {
            weekly_target: Some(5),
            ..SettingsArgs::default()
        }
        .merge(&stored());
        assert_eq!(input.goal.as_deref(), Some("strength"));
        assert_eq!(input.weekly_target, Some(5));
        assert!(input.reminders_enabled);
        assert_eq!(input.reminder_time.as_deref(), Some("07:30"));
    }

    #[test]
    fn test_merge_overrides() {
        let input = SettingsArgs {
            goal: Some("endurance".to_string()),
            reminders: Some(false),
            ..SettingsArgs::default()
        }
        .merge(&stored());
        assert_eq!(input.goal.as_deref(), Some("endurance"));
        assert!(!input.reminders_enabled);
        assert_eq!(input.weekly_target, Some(4));
    }

    #[test]
    fn test_empty_args() {
        assert!(SettingsArgs::default().is_empty());
        assert!(
            !SettingsArgs {
                level: Some("beginner".to_string()),
                ..SettingsArgs::default()
            }
            .is_empty()
        );
    }
}
