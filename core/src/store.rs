//! Collaborator seams: persistence, media storage, reminders and time.
//!
//! The engine itself is pure; everything that talks to the outside world goes
//! through one of these traits so the service can run against SQLite, a remote
//! backend, or test doubles.

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use serde::Serialize;

use crate::models::{
    Completion, NewCompletion, NewWorkout, Profile, UpdateWorkout, UserSettings, Workout,
};

/// Row-level access to the user's fitness data.
///
/// Every query is scoped to one `user_id`; implementations must never return
/// another user's rows.
pub trait FitnessStore: Send {
    fn insert_workout(
        &self,
        user_id: &str,
        workout: &NewWorkout,
        created_at: DateTime<Utc>,
    ) -> Result<Workout>;
    fn get_workout(&self, user_id: &str, id: i64) -> Result<Option<Workout>>;
    /// Newest first.
    fn list_workouts(&self, user_id: &str) -> Result<Vec<Workout>>;
    /// `None` when the workout doesn't exist.
    fn update_workout(&self, user_id: &str, id: i64, update: &UpdateWorkout)
    -> Result<Option<Workout>>;
    /// Completions referencing the workout keep their row with the reference
    /// cleared.
    fn delete_workout(&self, user_id: &str, id: i64) -> Result<bool>;
    /// Sets the single-slot "last completed" marker on the workout row;
    /// `None` clears it.
    fn stamp_workout_completed(
        &self,
        user_id: &str,
        id: i64,
        at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    fn insert_completion(&self, user_id: &str, completion: &NewCompletion) -> Result<Completion>;
    fn delete_completion(&self, user_id: &str, id: i64) -> Result<bool>;
    /// Newest first.
    fn list_completions(&self, user_id: &str) -> Result<Vec<Completion>>;
    /// Completions in the half-open range `[start, end)`, newest first.
    fn completions_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Completion>>;

    fn get_settings(&self, user_id: &str) -> Result<Option<UserSettings>>;
    /// Create-or-replace keyed by `user_id`.
    fn upsert_settings(&self, settings: &UserSettings) -> Result<UserSettings>;

    fn get_profile(&self, user_id: &str) -> Result<Option<Profile>>;
    fn upsert_profile(&self, profile: &Profile) -> Result<Profile>;

    /// Atomically add `delta` to the user's points, creating the settings row
    /// from `seed` if there is none. Returns the new total, or `None` if the
    /// store has no atomic increment and the caller must fall back to
    /// read-modify-write.
    fn atomic_add_points(&self, seed: &UserSettings, delta: i64) -> Result<Option<i64>> {
        let _ = (seed, delta);
        Ok(None)
    }

    /// Run `f` so that the writes it makes through this store land together
    /// or not at all. The default has no transactions and just runs `f`;
    /// callers must then undo their own writes when `f` fails.
    fn with_transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        f()
    }

    fn session_user(&self) -> Result<Option<String>>;
    /// `None` clears the session.
    fn set_session_user(&self, user_id: Option<&str>) -> Result<()>;
}

/// Binary object storage with public URL retrieval.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `bucket/path` and return the public URL.
    fn upload(&self, bucket: &str, path: &str, bytes: &[u8], content_type: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyReminder {
    pub hour: u32,
    pub minute: u32,
    pub title: String,
    pub body: String,
}

/// One repeating daily notification per device.
pub trait NotificationScheduler {
    /// Replaces any existing schedule.
    fn schedule_daily(&self, hour: u32, minute: u32, title: &str, body: &str) -> Result<()>;
    fn cancel_daily(&self) -> Result<()>;
    fn scheduled_daily(&self) -> Result<Option<DailyReminder>>;
}

/// The only source of "now".
pub trait Clock: Send + Sync {
    type Tz: TimeZone + Send + Sync;

    fn now(&self) -> DateTime<Self::Tz>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }

    fn timezone(&self) -> Self::Tz {
        self.now().timezone()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = Local;

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock stopped at one instant, in a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    #[must_use]
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    pub fn set(&mut self, now: DateTime<FixedOffset>) {
        self.now = now;
    }
}

impl Clock for FixedClock {
    type Tz = FixedOffset;

    fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let at = tz.with_ymd_and_hms(2024, 6, 15, 1, 30, 0).unwrap();
        let mut clock = FixedClock::new(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now_utc().to_rfc3339(), "2024-06-14T23:30:00+00:00");
        assert_eq!(clock.timezone(), tz);

        let later = at + chrono::Duration::hours(3);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn test_system_clock_is_local() {
        let before = Utc::now();
        let now = SystemClock.now_utc();
        assert!(now >= before);
    }
}
