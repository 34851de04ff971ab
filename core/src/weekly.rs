use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::calendar::start_of_week;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeeklyProgress {
    pub done: u32,
    pub target: u32,
}

impl WeeklyProgress {
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.target.saturating_sub(self.done)
    }

    #[must_use]
    pub fn is_met(&self) -> bool {
        self.done >= self.target
    }
}

/// Count completions since Monday local midnight of the week containing `now`.
pub fn weekly_progress<'a, Tz, I>(completed_at: I, weekly_target: u32, now: &DateTime<Tz>) -> WeeklyProgress
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a DateTime<Utc>>,
{
    let week_start = start_of_week(now).with_timezone(&Utc);
    let done = completed_at
        .into_iter()
        .filter(|instant| **instant >= week_start)
        .count();
    WeeklyProgress {
        done: u32::try_from(done).unwrap_or(u32::MAX),
        target: weekly_target,
    }
}
