use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use crate::achievements::{ACHIEVEMENTS, AchievementCounters, AchievementState, evaluate};
use crate::blob::{
    AVATARS_BUCKET, WORKOUT_PHOTOS_BUCKET, WORKOUT_VIDEOS_BUCKET, accepts_content_type,
    object_path,
};
use crate::calendar::ymd_to_bounds;
use crate::error::{CoreError, CoreResult};
use crate::ledger::PointsLedger;
use crate::models::{
    Completion, CompletionDetail, NewCompletion, NewWorkout, Profile, ProfileInput,
    SettingsDefaults, SettingsInput, UpdateWorkout, UserSettings, Workout, normalize_label,
    normalize_reminder_time, normalize_weekly_target, parse_plan, validate_workout_name,
};
use crate::reminders::{ReminderAction, apply_reminder_policy};
use crate::store::{BlobStore, Clock, DailyReminder, FitnessStore, NotificationScheduler};
use crate::streak::streak_days;
use crate::timeline::{self, DEFAULT_TIMELINE_DAYS, Timeline, build_timeline};
use crate::weekly::{WeeklyProgress, weekly_progress};
use crate::xp::{POINTS_PER_COMPLETION, XpState, xp_from_points};

/// Everything the home screen shows, computed from one read of the user's rows.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub user_id: String,
    pub streak_days: u32,
    pub weekly: WeeklyProgress,
    pub points: u64,
    pub xp: XpState,
    pub achievements: Vec<AchievementState>,
    pub timeline: Timeline,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionReceipt {
    pub completion: Completion,
    pub points: i64,
    pub xp: XpState,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedSettings {
    pub settings: UserSettings,
    pub reminder: ReminderAction,
}

struct Snapshot {
    workouts: Vec<Workout>,
    completions: Vec<Completion>,
    settings: UserSettings,
}

pub struct FitnessService<S, C> {
    store: S,
    clock: C,
    defaults: SettingsDefaults,
    ledger: PointsLedger,
    blobs: Option<Box<dyn BlobStore>>,
}

impl<S: FitnessStore, C: Clock> FitnessService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            defaults: SettingsDefaults::default(),
            ledger: PointsLedger::new(),
            blobs: None,
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: SettingsDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn with_blob_store(mut self, blobs: impl BlobStore + 'static) -> Self {
        self.blobs = Some(Box::new(blobs));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn defaults(&self) -> &SettingsDefaults {
        &self.defaults
    }

    // --- Session ---

    pub fn sign_in(&self, user_id: &str) -> CoreResult<()> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(CoreError::invalid_input("User id must not be empty"));
        }
        self.store.set_session_user(Some(user_id))?;
        tracing::info!(user_id, "signed in");
        Ok(())
    }

    pub fn sign_out(&self) -> CoreResult<()> {
        self.store.set_session_user(None)?;
        Ok(())
    }

    pub fn current_user(&self) -> CoreResult<Option<String>> {
        Ok(self.store.session_user()?)
    }

    fn require_user(&self) -> CoreResult<String> {
        self.current_user()?.ok_or(CoreError::NotAuthenticated)
    }

    // --- Workouts ---

    pub fn create_workout(&self, input: NewWorkout) -> CoreResult<Workout> {
        let user_id = self.require_user()?;
        let workout = NewWorkout {
            name: validate_workout_name(&input.name)?,
            plan: clean_plan(&input.plan),
            category: normalize_label(input.category),
        };
        Ok(self
            .store
            .insert_workout(&user_id, &workout, self.clock.now_utc())?)
    }

    pub fn list_workouts(&self) -> CoreResult<Vec<Workout>> {
        let user_id = self.require_user()?;
        Ok(self.store.list_workouts(&user_id)?)
    }

    pub fn get_workout(&self, id: i64) -> CoreResult<Workout> {
        let user_id = self.require_user()?;
        self.store
            .get_workout(&user_id, id)?
            .ok_or(CoreError::WorkoutNotFound(id))
    }

    pub fn update_workout(&self, id: i64, update: UpdateWorkout) -> CoreResult<Workout> {
        let user_id = self.require_user()?;
        let update = UpdateWorkout {
            name: update.name.as_deref().map(validate_workout_name).transpose()?,
            plan: update.plan.as_deref().map(clean_plan),
            category: update.category.map(normalize_label),
            image_url: update.image_url,
            video_url: update.video_url,
        };
        self.store
            .update_workout(&user_id, id, &update)?
            .ok_or(CoreError::WorkoutNotFound(id))
    }

    pub fn delete_workout(&self, id: i64) -> CoreResult<()> {
        let user_id = self.require_user()?;
        if !self.store.delete_workout(&user_id, id)? {
            return Err(CoreError::WorkoutNotFound(id));
        }
        tracing::info!(user_id = %user_id, workout_id = id, "workout deleted");
        Ok(())
    }

    /// Record a completion now, stamp the workout and award points.
    ///
    /// The three writes land together or not at all: they run in one store
    /// transaction, and on failure the completion row and the previous
    /// stamp are also restored by hand for stores without transactions.
    pub fn mark_complete(&self, workout_id: i64) -> CoreResult<CompletionReceipt> {
        let user_id = self.require_user()?;
        let workout = self
            .store
            .get_workout(&user_id, workout_id)?
            .ok_or(CoreError::WorkoutNotFound(workout_id))?;

        let now = self.clock.now_utc();
        let seed = UserSettings::with_defaults(&user_id, &self.defaults, now);
        let (completion, points) = self.store.with_transaction(|| -> CoreResult<(Completion, i64)> {
            let completion = self.store.insert_completion(
                &user_id,
                &NewCompletion {
                    workout_id: Some(workout_id),
                    completed_at: now,
                },
            )?;
            let applied = self
                .store
                .stamp_workout_completed(&user_id, workout_id, Some(now))
                .map_err(CoreError::from)
                .and_then(|()| self.ledger.award(&self.store, &seed, POINTS_PER_COMPLETION));
            match applied {
                Ok(points) => Ok((completion, points)),
                Err(err) => {
                    self.undo_completion(&user_id, &completion, workout.completed_at);
                    tracing::warn!(user_id = %user_id, workout_id, error = %err, "completion rolled back");
                    Err(err)
                }
            }
        })?;
        tracing::info!(user_id = %user_id, workout_id, points, "workout completed");

        Ok(CompletionReceipt {
            completion,
            points,
            xp: xp_from_points(u64::try_from(points).unwrap_or(0)),
        })
    }

    fn undo_completion(
        &self,
        user_id: &str,
        completion: &Completion,
        previous: Option<chrono::DateTime<Utc>>,
    ) {
        if let Err(err) = self.store.delete_completion(user_id, completion.id) {
            tracing::warn!(user_id, completion_id = completion.id, error = %err, "failed to remove completion");
        }
        let Some(workout_id) = completion.workout_id else {
            return;
        };
        if let Err(err) = self
            .store
            .stamp_workout_completed(user_id, workout_id, previous)
        {
            tracing::warn!(user_id, workout_id, error = %err, "failed to restore completion stamp");
        }
    }

    pub fn completions(&self) -> CoreResult<Vec<Completion>> {
        let user_id = self.require_user()?;
        Ok(self.store.list_completions(&user_id)?)
    }

    // --- Settings & profile ---

    /// Stored settings, or the defaults if the user never saved any.
    pub fn settings(&self) -> CoreResult<UserSettings> {
        let user_id = self.require_user()?;
        self.settings_for(&user_id)
    }

    fn settings_for(&self, user_id: &str) -> CoreResult<UserSettings> {
        Ok(self.store.get_settings(user_id)?.unwrap_or_else(|| {
            UserSettings::with_defaults(user_id, &self.defaults, self.clock.now_utc())
        }))
    }

    pub fn profile(&self) -> CoreResult<Profile> {
        let user_id = self.require_user()?;
        Ok(self.store.get_profile(&user_id)?.unwrap_or_else(|| Profile {
            user_id: user_id.clone(),
            full_name: None,
            avatar_url: None,
            updated_at: self.clock.now_utc(),
        }))
    }

    pub fn save_profile(&self, input: ProfileInput) -> CoreResult<Profile> {
        let mut profile = self.profile()?;
        profile.full_name = normalize_label(input.full_name);
        profile.updated_at = self.clock.now_utc();
        Ok(self.store.upsert_profile(&profile)?)
    }

    // --- Media ---

    fn upload(&self, bucket: &str, user_id: &str, bytes: &[u8], content_type: &str) -> CoreResult<String> {
        let blobs = self
            .blobs
            .as_ref()
            .ok_or_else(|| CoreError::invalid_input("Media storage is not configured"))?;
        if !accepts_content_type(bucket, content_type) {
            return Err(CoreError::invalid_input(format!(
                "'{content_type}' is not accepted for {bucket}"
            )));
        }
        if bytes.is_empty() {
            return Err(CoreError::invalid_input("Refusing to upload an empty file"));
        }
        let path = object_path(user_id, content_type);
        Ok(blobs.upload(bucket, &path, bytes, content_type)?)
    }

    pub fn set_avatar(&self, bytes: &[u8], content_type: &str) -> CoreResult<Profile> {
        let mut profile = self.profile()?;
        profile.avatar_url = Some(self.upload(AVATARS_BUCKET, &profile.user_id, bytes, content_type)?);
        profile.updated_at = self.clock.now_utc();
        Ok(self.store.upsert_profile(&profile)?)
    }

    pub fn attach_workout_photo(&self, workout_id: i64, bytes: &[u8], content_type: &str) -> CoreResult<Workout> {
        let workout = self.get_workout(workout_id)?;
        let url = self.upload(WORKOUT_PHOTOS_BUCKET, &workout.user_id, bytes, content_type)?;
        self.update_workout(
            workout_id,
            UpdateWorkout {
                image_url: Some(url),
                ..UpdateWorkout::default()
            },
        )
    }

    pub fn attach_workout_video(&self, workout_id: i64, bytes: &[u8], content_type: &str) -> CoreResult<Workout> {
        let workout = self.get_workout(workout_id)?;
        let url = self.upload(WORKOUT_VIDEOS_BUCKET, &workout.user_id, bytes, content_type)?;
        self.update_workout(
            workout_id,
            UpdateWorkout {
                video_url: Some(url),
                ..UpdateWorkout::default()
            },
        )
    }

    // --- Derived metrics ---

    fn snapshot(&self, user_id: &str) -> CoreResult<Snapshot> {
        Ok(Snapshot {
            workouts: self.store.list_workouts(user_id)?,
            completions: self.store.list_completions(user_id)?,
            settings: self.settings_for(user_id)?,
        })
    }

    pub fn dashboard(&self) -> CoreResult<Dashboard> {
        let user_id = self.require_user()?;
        let snapshot = self.snapshot(&user_id)?;
        let now = self.clock.now();
        let instants = || snapshot.completions.iter().map(|c| &c.completed_at);

        let streak = streak_days(instants(), &now);
        let weekly = weekly_progress(instants(), snapshot.settings.weekly_target, &now);
        let points = snapshot.settings.points_u64();
        let counters = AchievementCounters {
            total_workouts: snapshot.workouts.len() as u64,
            total_completions: snapshot.completions.len() as u64,
            streak_days: u64::from(streak),
            points,
            completed_this_week: u64::from(weekly.done),
        };

        Ok(Dashboard {
            user_id,
            streak_days: streak,
            weekly,
            points,
            xp: xp_from_points(points),
            achievements: evaluate(ACHIEVEMENTS, &counters),
            timeline: build_timeline(instants(), DEFAULT_TIMELINE_DAYS, &now),
        })
    }

    pub fn achievements(&self) -> CoreResult<Vec<AchievementState>> {
        Ok(self.dashboard()?.achievements)
    }

    pub fn timeline(&self, days: u32) -> CoreResult<Timeline> {
        let user_id = self.require_user()?;
        let completions = self.store.list_completions(&user_id)?;
        Ok(build_timeline(
            completions.iter().map(|c| &c.completed_at),
            days,
            &self.clock.now(),
        ))
    }

    /// All completions on local day `ymd`, newest first.
    pub fn day_details(&self, ymd: &str) -> CoreResult<Vec<CompletionDetail>> {
        let user_id = self.require_user()?;
        let tz = self.clock.timezone();
        let bounds = ymd_to_bounds(ymd, &tz)?;
        let completions = self.store.completions_between(
            &user_id,
            bounds.start.with_timezone(&Utc),
            bounds.end.with_timezone(&Utc),
        )?;
        let workouts: HashMap<i64, Workout> = self
            .store
            .list_workouts(&user_id)?
            .into_iter()
            .map(|w| (w.id, w))
            .collect();
        timeline::day_details(ymd, &completions, &workouts, &tz)
    }
}

impl<S: FitnessStore + NotificationScheduler, C: Clock> FitnessService<S, C> {
    /// Normalize and upsert the user's settings, then schedule or cancel the
    /// daily reminder. Accumulated points are carried over untouched.
    pub fn save_settings(&self, input: SettingsInput) -> CoreResult<SavedSettings> {
        let user_id = self.require_user()?;
        let current = self.settings_for(&user_id)?;
        let settings = UserSettings {
            user_id,
            goal: normalize_label(input.goal),
            level: normalize_label(input.level),
            weekly_target: normalize_weekly_target(input.weekly_target, &self.defaults),
            reminders_enabled: input.reminders_enabled,
            reminder_time: normalize_reminder_time(input.reminder_time.as_deref(), &self.defaults)
                .to_string(),
            points: current.points,
            updated_at: self.clock.now_utc(),
        };
        let settings = self.store.upsert_settings(&settings)?;
        let reminder = apply_reminder_policy(&self.store, &settings, &self.defaults)?;
        Ok(SavedSettings { settings, reminder })
    }

    pub fn reminder(&self) -> CoreResult<Option<DailyReminder>> {
        Ok(self.store.scheduled_daily()?)
    }
}

fn clean_plan(steps: &[String]) -> Vec<String> {
    steps.iter().flat_map(|step| parse_plan(step)).collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, FixedOffset, TimeZone};

    use std::sync::atomic::Ordering;

    use super::*;
    use crate::blob::FsBlobStore;
    use crate::db::Database;
    use crate::store::FixedClock;
    use crate::store::fakes::NoAtomic;

    fn tz() -> FixedOffset {
        FixedOffset::west_opt(4 * 3600).unwrap()
    }

    // Saturday 2024-06-15 18:00 local
    fn now() -> DateTime<FixedOffset> {
        tz().with_ymd_and_hms(2024, 6, 15, 18, 0, 0).unwrap()
    }

    fn service() -> FitnessService<Database, FixedClock> {
        let service = FitnessService::new(Database::open_in_memory().unwrap(), FixedClock::new(now()));
        service.sign_in("u1").unwrap();
        service
    }

    fn leg_day() -> NewWorkout {
        NewWorkout {
            name: " Leg Day ".to_string(),
            plan: vec!["Squats 5x5\n\nLunges 3x12".to_string(), "  ".to_string()],
            category: Some("strength".to_string()),
        }
    }

    fn backdate_completion(service: &FitnessService<Database, FixedClock>, workout_id: Option<i64>, days_ago: i64) {
        service
            .store()
            .insert_completion(
                "u1",
                &NewCompletion {
                    workout_id,
                    completed_at: (now() - Duration::days(days_ago)).with_timezone(&Utc),
                },
            )
            .unwrap();
    }

    #[test]
    fn test_requires_sign_in() {
        let service = FitnessService::new(Database::open_in_memory().unwrap(), FixedClock::new(now()));
        assert!(service.current_user().unwrap().is_none());
        assert!(matches!(service.dashboard(), Err(CoreError::NotAuthenticated)));
        assert!(matches!(service.mark_complete(1), Err(CoreError::NotAuthenticated)));
        assert!(matches!(service.list_workouts(), Err(CoreError::NotAuthenticated)));
    }

    #[test]
    fn test_sign_in_out() {
        let service = service();
        assert_eq!(service.current_user().unwrap().as_deref(), Some("u1"));
        service.sign_out().unwrap();
        assert!(service.current_user().unwrap().is_none());
        assert!(service.sign_in("   ").is_err());
    }

    #[test]
    fn test_create_workout_normalizes() {
        let service = service();
        let workout = service.create_workout(leg_day()).unwrap();
        assert_eq!(workout.name, "Leg Day");
        assert_eq!(workout.plan, vec!["Squats 5x5", "Lunges 3x12"]);
        assert_eq!(workout.user_id, "u1");
        assert_eq!(workout.created_at, now().with_timezone(&Utc));

        let blank = NewWorkout {
            name: "  ".to_string(),
            ..NewWorkout::default()
        };
        assert!(matches!(service.create_workout(blank), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_update_and_delete_workout() {
        let service = service();
        let workout = service.create_workout(leg_day()).unwrap();

        let updated = service
            .update_workout(
                workout.id,
                UpdateWorkout {
                    plan: Some(vec!["Deadlifts 3x5".to_string()]),
                    category: Some(Some("  ".to_string())),
                    ..UpdateWorkout::default()
                },
            )
            .unwrap();
        assert_eq!(updated.plan, vec!["Deadlifts 3x5"]);
        assert!(updated.category.is_none());
        assert_eq!(updated.name, "Leg Day");

        service.delete_workout(workout.id).unwrap();
        assert!(matches!(
            service.get_workout(workout.id),
            Err(CoreError::WorkoutNotFound(_))
        ));
        assert!(matches!(
            service.delete_workout(workout.id),
            Err(CoreError::WorkoutNotFound(_))
        ));
    }

    #[test]
    fn test_other_users_workouts_are_invisible() {
        let service = service();
        let workout = service.create_workout(leg_day()).unwrap();
        service.sign_in("u2").unwrap();
        assert!(service.list_workouts().unwrap().is_empty());
        assert!(matches!(
            service.mark_complete(workout.id),
            Err(CoreError::WorkoutNotFound(_))
        ));
    }

    #[test]
    fn test_mark_complete_awards_points() {
        let service = service();
        let workout = service.create_workout(leg_day()).unwrap();

        let receipt = service.mark_complete(workout.id).unwrap();
        assert_eq!(receipt.points, POINTS_PER_COMPLETION);
        assert_eq!(receipt.completion.workout_id, Some(workout.id));
        assert_eq!(receipt.xp.level, 1);

        let stamped = service.get_workout(workout.id).unwrap();
        assert_eq!(stamped.completed_at, Some(now().with_timezone(&Utc)));

        let receipt = service.mark_complete(workout.id).unwrap();
        assert_eq!(receipt.points, 2 * POINTS_PER_COMPLETION);
        assert_eq!(service.completions().unwrap().len(), 2);
    }

    #[test]
    fn test_mark_complete_failed_award_leaves_no_trace() {
        let service = FitnessService::new(NoAtomic::failing(), FixedClock::new(now()));
        service.sign_in("u1").unwrap();
        let workout = service.create_workout(leg_day()).unwrap();
        let earlier = (now() - Duration::days(3)).with_timezone(&Utc);
        service
            .store()
            .stamp_workout_completed("u1", workout.id, Some(earlier))
            .unwrap();

        assert!(matches!(
            service.mark_complete(workout.id),
            Err(CoreError::Upstream(_))
        ));
        assert!(service.completions().unwrap().is_empty());
        assert_eq!(
            service.get_workout(workout.id).unwrap().completed_at,
            Some(earlier)
        );
        let dashboard = service.dashboard().unwrap();
        assert_eq!(dashboard.streak_days, 0);
        assert_eq!(dashboard.weekly.done, 0);
        assert_eq!(dashboard.points, 0);

        service.store().fail_upserts.store(false, Ordering::SeqCst);
        let receipt = service.mark_complete(workout.id).unwrap();
        assert_eq!(receipt.points, POINTS_PER_COMPLETION);
        assert_eq!(service.completions().unwrap().len(), 1);
    }

    #[test]
    fn test_mark_complete_unknown_workout() {
        let service = service();
        assert!(matches!(
            service.mark_complete(42),
            Err(CoreError::WorkoutNotFound(42))
        ));
        assert!(service.completions().unwrap().is_empty());
        assert!(service.store().get_settings("u1").unwrap().is_none());
    }

    #[test]
    fn test_dashboard_empty() {
        let service = service();
        let dashboard = service.dashboard().unwrap();
        assert_eq!(dashboard.streak_days, 0);
        assert_eq!(dashboard.weekly, WeeklyProgress { done: 0, target: 3 });
        assert_eq!(dashboard.xp.level, 1);
        assert!(dashboard.achievements.iter().all(|a| !a.unlocked));
        assert_eq!(dashboard.timeline.len(), DEFAULT_TIMELINE_DAYS as usize);
    }

    #[test]
    fn test_dashboard_after_activity() {
        let service = service();
        let workout = service.create_workout(leg_day()).unwrap();
        backdate_completion(&service, Some(workout.id), 1);
        backdate_completion(&service, Some(workout.id), 2);
        service.mark_complete(workout.id).unwrap();

        let dashboard = service.dashboard().unwrap();
        assert_eq!(dashboard.streak_days, 3);
        // Saturday: Thursday, Friday and today are all in the current week
        assert_eq!(dashboard.weekly.done, 3);
        assert_eq!(dashboard.points, 10);

        let unlocked: Vec<&str> = dashboard
            .achievements
            .iter()
            .filter(|a| a.unlocked)
            .map(|a| a.key)
            .collect();
        assert_eq!(
            unlocked,
            vec!["first_workout", "first_completion", "week_2", "streak_3"]
        );

        let last = dashboard.timeline.iter().last().unwrap();
        assert!(last.is_today);
        assert_eq!(last.completion_count, 1);
    }

    #[test]
    fn test_streak_zero_without_today() {
        let service = service();
        backdate_completion(&service, None, 1);
        backdate_completion(&service, None, 2);
        assert_eq!(service.dashboard().unwrap().streak_days, 0);
    }

    #[test]
    fn test_timeline_window() {
        let service = service();
        backdate_completion(&service, None, 20);
        let timeline = service.timeline(14).unwrap();
        assert_eq!(timeline.iter().len(), 14);
        assert!(timeline.iter().all(|b| b.completion_count == 0));
        assert_eq!(service.timeline(30).unwrap().total(), 1);
    }

    #[test]
    fn test_day_details_with_deleted_workout() {
        let service = service();
        let kept = service.create_workout(leg_day()).unwrap();
        let gone = service
            .create_workout(NewWorkout {
                name: "Cardio".to_string(),
                ..NewWorkout::default()
            })
            .unwrap();
        service.mark_complete(kept.id).unwrap();
        service.mark_complete(gone.id).unwrap();
        service.delete_workout(gone.id).unwrap();

        let details = service.day_details("2024-06-15").unwrap();
        assert_eq!(details.len(), 2);
        let names: Vec<&str> = details.iter().map(|d| d.workout_name.as_str()).collect();
        assert!(names.contains(&"Leg Day"));
        assert!(names.contains(&timeline::DELETED_WORKOUT_LABEL));

        assert!(service.day_details("2024-06-14").unwrap().is_empty());
        assert!(matches!(
            service.day_details("2024-6-14"),
            Err(CoreError::InvalidDateKey(_))
        ));
    }

    #[test]
    fn test_day_details_uses_local_day() {
        let service = service();
        // 23:30 local on the 14th is already the 15th in UTC
        let late = tz().with_ymd_and_hms(2024, 6, 14, 23, 30, 0).unwrap();
        service
            .store()
            .insert_completion(
                "u1",
                &NewCompletion {
                    workout_id: None,
                    completed_at: late.with_timezone(&Utc),
                },
            )
            .unwrap();
        assert_eq!(service.day_details("2024-06-14").unwrap().len(), 1);
        assert!(service.day_details("2024-06-15").unwrap().is_empty());
    }

    #[test]
    fn test_save_settings_normalizes_and_schedules() {
        let service = service();
        let saved = service
            .save_settings(SettingsInput {
                goal: Some(" build strength ".to_string()),
                weekly_target: Some(0),
                reminders_enabled: true,
                reminder_time: Some("7:30pm".to_string()),
                ..SettingsInput::default()
            })
            .unwrap();
        assert_eq!(saved.settings.goal.as_deref(), Some("build strength"));
        assert_eq!(saved.settings.weekly_target, 3);
        assert_eq!(saved.settings.reminder_time, "19:00");
        assert!(matches!(saved.reminder, ReminderAction::Scheduled { .. }));

        let reminder = service.reminder().unwrap().unwrap();
        assert_eq!((reminder.hour, reminder.minute), (19, 0));

        service
            .save_settings(SettingsInput {
                weekly_target: Some(5),
                reminders_enabled: false,
                ..SettingsInput::default()
            })
            .unwrap();
        assert!(service.reminder().unwrap().is_none());
        assert_eq!(service.settings().unwrap().weekly_target, 5);
    }

    #[test]
    fn test_save_settings_keeps_points() {
        let service = service();
        let workout = service.create_workout(leg_day()).unwrap();
        service.mark_complete(workout.id).unwrap();
        service
            .save_settings(SettingsInput {
                weekly_target: Some(4),
                ..SettingsInput::default()
            })
            .unwrap();
        assert_eq!(service.settings().unwrap().points, 10);
    }

    #[test]
    fn test_custom_defaults() {
        let service = service().with_defaults(SettingsDefaults {
            weekly_target: 4,
            ..SettingsDefaults::default()
        });
        assert_eq!(service.settings().unwrap().weekly_target, 4);
        assert_eq!(service.dashboard().unwrap().weekly.target, 4);
    }

    #[test]
    fn test_profile() {
        let service = service();
        let profile = service.profile().unwrap();
        assert!(profile.full_name.is_none());

        let saved = service
            .save_profile(ProfileInput {
                full_name: Some(" Sam Lee ".to_string()),
            })
            .unwrap();
        assert_eq!(saved.full_name.as_deref(), Some("Sam Lee"));
    }

    #[test]
    fn test_media_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let service = service().with_blob_store(FsBlobStore::new(dir.path(), "http://media.test"));
        let workout = service.create_workout(leg_day()).unwrap();

        let profile = service.set_avatar(b"png", "image/png").unwrap();
        let avatar = profile.avatar_url.unwrap();
        assert!(avatar.starts_with("http://media.test/avatars/u1/"));
        assert!(avatar.ends_with(".png"));

        let with_photo = service
            .attach_workout_photo(workout.id, b"jpg", "image/jpeg")
            .unwrap();
        assert!(with_photo.image_url.unwrap().contains("/workout-photos/u1/"));

        let with_video = service
            .attach_workout_video(workout.id, b"mp4", "video/mp4")
            .unwrap();
        assert!(with_video.video_url.unwrap().contains("/workout-videos/u1/"));
        assert!(with_video.image_url.is_some());

        assert!(matches!(
            service.attach_workout_video(workout.id, b"png", "image/png"),
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            service.set_avatar(b"", "image/png"),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_media_without_blob_store() {
        let service = service();
        assert!(matches!(
            service.set_avatar(b"png", "image/png"),
            Err(CoreError::InvalidInput(_))
        ));
    }
}
