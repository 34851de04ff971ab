use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{
    Completion, NewCompletion, NewWorkout, Profile, UpdateWorkout, UserSettings, Workout,
};
use crate::store::{DailyReminder, FitnessStore, NotificationScheduler};

const WORKOUT_COLUMNS: &str =
    "id, user_id, name, plan, category, image_url, video_url, created_at, completed_at";
const SETTINGS_COLUMNS: &str =
    "user_id, goal, level, weekly_target, reminders_enabled, reminder_time, points, updated_at";

pub struct Database {
    conn: Connection,
}

/// Timestamps are stored as fixed-width UTC RFC 3339 so that text comparison
/// orders them chronologically.
fn ts(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_opt_ts(idx: usize, value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_ts(idx, &v)).transpose()
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS workouts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    plan TEXT NOT NULL DEFAULT '[]',
                    category TEXT,
                    image_url TEXT,
                    video_url TEXT,
                    created_at TEXT NOT NULL,
                    completed_at TEXT
                );

                CREATE TABLE IF NOT EXISTS completions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL,
                    workout_id INTEGER REFERENCES workouts(id) ON DELETE SET NULL,
                    completed_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS user_settings (
                    user_id TEXT PRIMARY KEY,
                    goal TEXT,
                    level TEXT,
                    weekly_target INTEGER NOT NULL CHECK (weekly_target > 0),
                    reminders_enabled INTEGER NOT NULL DEFAULT 0,
                    reminder_time TEXT NOT NULL,
                    points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS profiles (
                    user_id TEXT PRIMARY KEY,
                    full_name TEXT,
                    avatar_url TEXT,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS config (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_workouts_user ON workouts(user_id, created_at);
                CREATE INDEX IF NOT EXISTS idx_completions_user ON completions(user_id, completed_at);
                CREATE INDEX IF NOT EXISTS idx_completions_workout ON completions(workout_id);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS reminder_schedule (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    hour INTEGER NOT NULL CHECK (hour BETWEEN 0 AND 23),
                    minute INTEGER NOT NULL CHECK (minute BETWEEN 0 AND 59),
                    title TEXT NOT NULL,
                    body TEXT NOT NULL
                );

                PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    fn workout_from_row(row: &rusqlite::Row) -> rusqlite::Result<Workout> {
        let plan_json: String = row.get(3)?;
        let plan: Vec<String> = serde_json::from_str(&plan_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let created_at: String = row.get(7)?;
        Ok(Workout {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            plan,
            category: row.get(4)?,
            image_url: row.get(5)?,
            video_url: row.get(6)?,
            created_at: parse_ts(7, &created_at)?,
            completed_at: parse_opt_ts(8, row.get(8)?)?,
        })
    }

    fn completion_from_row(row: &rusqlite::Row) -> rusqlite::Result<Completion> {
        let completed_at: String = row.get(3)?;
        Ok(Completion {
            id: row.get(0)?,
            user_id: row.get(1)?,
            workout_id: row.get(2)?,
            completed_at: parse_ts(3, &completed_at)?,
        })
    }

    fn settings_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserSettings> {
        let updated_at: String = row.get(7)?;
        Ok(UserSettings {
            user_id: row.get(0)?,
            goal: row.get(1)?,
            level: row.get(2)?,
            weekly_target: row.get(3)?,
            reminders_enabled: row.get(4)?,
            reminder_time: row.get(5)?,
            points: row.get(6)?,
            updated_at: parse_ts(7, &updated_at)?,
        })
    }

    fn profile_from_row(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
        let updated_at: String = row.get(3)?;
        Ok(Profile {
            user_id: row.get(0)?,
            full_name: row.get(1)?,
            avatar_url: row.get(2)?,
            updated_at: parse_ts(3, &updated_at)?,
        })
    }

    // --- Config ---

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete_config(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM config WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }
}

impl FitnessStore for Database {
    // --- Workouts ---

    fn insert_workout(
        &self,
        user_id: &str,
        workout: &NewWorkout,
        created_at: DateTime<Utc>,
    ) -> Result<Workout> {
        let plan = serde_json::to_string(&workout.plan)?;
        self.conn.execute(
            "INSERT INTO workouts (user_id, name, plan, category, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, workout.name, plan, workout.category, ts(&created_at)],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_workout(user_id, id)?
            .context("Workout not found after insert")
    }

    fn get_workout(&self, user_id: &str, id: i64) -> Result<Option<Workout>> {
        let workout = self
            .conn
            .query_row(
                &format!("SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = ?1 AND user_id = ?2"),
                params![id, user_id],
                Self::workout_from_row,
            )
            .optional()?;
        Ok(workout)
    }

    fn list_workouts(&self, user_id: &str) -> Result<Vec<Workout>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let workouts = stmt
            .query_map(params![user_id], Self::workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workouts)
    }

    fn update_workout(
        &self,
        user_id: &str,
        id: i64,
        update: &UpdateWorkout,
    ) -> Result<Option<Workout>> {
        if self.get_workout(user_id, id)?.is_none() {
            return Ok(None);
        }

        if let Some(ref name) = update.name {
            self.conn.execute(
                "UPDATE workouts SET name = ?1 WHERE id = ?2",
                params![name, id],
            )?;
        }
        if let Some(ref plan) = update.plan {
            self.conn.execute(
                "UPDATE workouts SET plan = ?1 WHERE id = ?2",
                params![serde_json::to_string(plan)?, id],
            )?;
        }
        if let Some(ref category) = update.category {
            self.conn.execute(
                "UPDATE workouts SET category = ?1 WHERE id = ?2",
                params![category, id],
            )?;
        }
        if let Some(ref image_url) = update.image_url {
            self.conn.execute(
                "UPDATE workouts SET image_url = ?1 WHERE id = ?2",
                params![image_url, id],
            )?;
        }
        if let Some(ref video_url) = update.video_url {
            self.conn.execute(
                "UPDATE workouts SET video_url = ?1 WHERE id = ?2",
                params![video_url, id],
            )?;
        }

        self.get_workout(user_id, id)
    }

    fn delete_workout(&self, user_id: &str, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM workouts WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows > 0)
    }

    fn stamp_workout_completed(
        &self,
        user_id: &str,
        id: i64,
        at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE workouts SET completed_at = ?1 WHERE id = ?2 AND user_id = ?3",
            params![at.as_ref().map(ts), id, user_id],
        )?;
        Ok(())
    }

    // --- Completions ---

    fn insert_completion(&self, user_id: &str, completion: &NewCompletion) -> Result<Completion> {
        self.conn.execute(
            "INSERT INTO completions (user_id, workout_id, completed_at) VALUES (?1, ?2, ?3)",
            params![user_id, completion.workout_id, ts(&completion.completed_at)],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                "SELECT id, user_id, workout_id, completed_at FROM completions WHERE id = ?1",
                params![id],
                Self::completion_from_row,
            )
            .context("Completion not found after insert")
    }

    fn delete_completion(&self, user_id: &str, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM completions WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows > 0)
    }

    fn list_completions(&self, user_id: &str) -> Result<Vec<Completion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, workout_id, completed_at FROM completions
             WHERE user_id = ?1
             ORDER BY completed_at DESC, id DESC",
        )?;
        let completions = stmt
            .query_map(params![user_id], Self::completion_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(completions)
    }

    fn completions_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Completion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, workout_id, completed_at FROM completions
             WHERE user_id = ?1 AND completed_at >= ?2 AND completed_at < ?3
             ORDER BY completed_at DESC, id DESC",
        )?;
        let completions = stmt
            .query_map(
                params![user_id, ts(&start), ts(&end)],
                Self::completion_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(completions)
    }

    // --- Settings ---

    fn get_settings(&self, user_id: &str) -> Result<Option<UserSettings>> {
        let settings = self
            .conn
            .query_row(
                &format!("SELECT {SETTINGS_COLUMNS} FROM user_settings WHERE user_id = ?1"),
                params![user_id],
                Self::settings_from_row,
            )
            .optional()?;
        Ok(settings)
    }

    fn upsert_settings(&self, settings: &UserSettings) -> Result<UserSettings> {
        self.conn.execute(
            "INSERT INTO user_settings (user_id, goal, level, weekly_target, reminders_enabled, reminder_time, points, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(user_id) DO UPDATE SET
                goal = excluded.goal,
                level = excluded.level,
                weekly_target = excluded.weekly_target,
                reminders_enabled = excluded.reminders_enabled,
                reminder_time = excluded.reminder_time,
                points = excluded.points,
                updated_at = excluded.updated_at",
            params![
                settings.user_id,
                settings.goal,
                settings.level,
                settings.weekly_target,
                settings.reminders_enabled,
                settings.reminder_time,
                settings.points,
                ts(&settings.updated_at),
            ],
        )?;
        self.get_settings(&settings.user_id)?
            .context("Settings not found after upsert")
    }

    fn atomic_add_points(&self, seed: &UserSettings, delta: i64) -> Result<Option<i64>> {
        let total: i64 = self.conn.query_row(
            "INSERT INTO user_settings (user_id, goal, level, weekly_target, reminders_enabled, reminder_time, points, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(user_id) DO UPDATE SET
                points = points + excluded.points,
                updated_at = excluded.updated_at
             RETURNING points",
            params![
                seed.user_id,
                seed.goal,
                seed.level,
                seed.weekly_target,
                seed.reminders_enabled,
                seed.reminder_time,
                delta,
                ts(&seed.updated_at),
            ],
            |row| row.get(0),
        )?;
        Ok(Some(total))
    }

    // --- Profiles ---

    fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT user_id, full_name, avatar_url, updated_at FROM profiles WHERE user_id = ?1",
                params![user_id],
                Self::profile_from_row,
            )
            .optional()?;
        Ok(profile)
    }

    fn upsert_profile(&self, profile: &Profile) -> Result<Profile> {
        self.conn.execute(
            "INSERT INTO profiles (user_id, full_name, avatar_url, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                full_name = excluded.full_name,
                avatar_url = excluded.avatar_url,
                updated_at = excluded.updated_at",
            params![
                profile.user_id,
                profile.full_name,
                profile.avatar_url,
                ts(&profile.updated_at),
            ],
        )?;
        self.get_profile(&profile.user_id)?
            .context("Profile not found after upsert")
    }

    // --- Transactions ---

    /// Dropping the transaction without committing rolls it back, so an error
    /// from `f` discards every write `f` made.
    fn with_transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        let value = f()?;
        tx.commit().context("Failed to commit transaction")?;
        Ok(value)
    }

    // --- Session ---

    fn session_user(&self) -> Result<Option<String>> {
        self.get_config("session_user")
    }

    fn set_session_user(&self, user_id: Option<&str>) -> Result<()> {
        match user_id {
            Some(id) => self.set_config("session_user", id),
            None => self.delete_config("session_user").map(|_| ()),
        }
    }
}

impl NotificationScheduler for Database {
    fn schedule_daily(&self, hour: u32, minute: u32, title: &str, body: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO reminder_schedule (id, hour, minute, title, body)
             VALUES (1, ?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                hour = excluded.hour,
                minute = excluded.minute,
                title = excluded.title,
                body = excluded.body",
            params![hour, minute, title, body],
        )?;
        Ok(())
    }

    fn cancel_daily(&self) -> Result<()> {
        self.conn.execute("DELETE FROM reminder_schedule", [])?;
        Ok(())
    }

    fn scheduled_daily(&self) -> Result<Option<DailyReminder>> {
        let reminder = self
            .conn
            .query_row(
                "SELECT hour, minute, title, body FROM reminder_schedule WHERE id = 1",
                [],
                |row| {
                    Ok(DailyReminder {
                        hour: row.get(0)?,
                        minute: row.get(1)?,
                        title: row.get(2)?,
                        body: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(reminder)
    }
}
