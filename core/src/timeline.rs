//! Trailing day-by-day completion timeline and single-day drill-down.

use std::collections::HashMap;

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde::{Serialize, Serializer};

use crate::calendar::{DateKey, day_key, ymd_to_bounds};
use crate::error::CoreResult;
use crate::models::{Completion, CompletionDetail, Workout};

pub const DEFAULT_TIMELINE_DAYS: u32 = 14;

/// Shown in place of a workout name when the workout no longer exists.
pub const DELETED_WORKOUT_LABEL: &str = "Workout";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date_key: DateKey,
    pub completion_count: u32,
    pub is_today: bool,
}

/// Completion counts for the `window_days` days ending today.
///
/// Buckets are produced on demand by [`Timeline::iter`], oldest first; the
/// iterator can be restarted any number of times.
#[derive(Debug, Clone)]
pub struct Timeline {
    today: DateKey,
    window_days: u32,
    counts: HashMap<DateKey, u32>,
}

impl Timeline {
    #[must_use]
    pub fn iter(&self) -> TimelineIter<'_> {
        TimelineIter {
            timeline: self,
            index: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.window_days as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window_days == 0
    }

    #[must_use]
    pub fn today(&self) -> DateKey {
        self.today
    }

    /// Total completions inside the window.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    fn day_at(&self, index: u32) -> DateKey {
        let back = u64::from(self.window_days - 1 - index);
        let date = self
            .today
            .date()
            .checked_sub_days(Days::new(back))
            .unwrap_or(NaiveDate::MIN);
        DateKey::new(date)
    }

    fn first_day(&self) -> Option<DateKey> {
        (self.window_days > 0).then(|| self.day_at(0))
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = DayBucket;
    type IntoIter = TimelineIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Timeline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

pub struct TimelineIter<'a> {
    timeline: &'a Timeline,
    index: u32,
}

impl Iterator for TimelineIter<'_> {
    type Item = DayBucket;

    fn next(&mut self) -> Option<DayBucket> {
        if self.index >= self.timeline.window_days {
            return None;
        }
        let date_key = self.timeline.day_at(self.index);
        self.index += 1;
        Some(DayBucket {
            date_key,
            completion_count: self.timeline.counts.get(&date_key).copied().unwrap_or(0),
            is_today: date_key == self.timeline.today,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.timeline.window_days - self.index) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for TimelineIter<'_> {}

pub fn build_timeline<'a, Tz, I>(completed_at: I, window_days: u32, now: &DateTime<Tz>) -> Timeline
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a DateTime<Utc>>,
{
    let tz = now.timezone();
    let mut timeline = Timeline {
        today: DateKey::new(now.date_naive()),
        window_days,
        counts: HashMap::new(),
    };
    let Some(first) = timeline.first_day() else {
        return timeline;
    };
    let today = timeline.today;
    for instant in completed_at {
        let key = day_key(instant, &tz);
        if key >= first && key <= today {
            *timeline.counts.entry(key).or_insert(0) += 1;
        }
    }
    timeline
}

/// Every completion on local day `ymd`, newest first, joined with its
/// workout's display fields.
pub fn day_details<Tz: TimeZone>(
    ymd: &str,
    completions: &[Completion],
    workouts_by_id: &HashMap<i64, Workout>,
    tz: &Tz,
) -> CoreResult<Vec<CompletionDetail>> {
    let bounds = ymd_to_bounds(ymd, tz)?;
    let mut details: Vec<CompletionDetail> = completions
        .iter()
        .filter(|c| bounds.contains(&c.completed_at))
        .map(|c| {
            let workout = c.workout_id.and_then(|id| workouts_by_id.get(&id));
            CompletionDetail {
                completion_id: c.id,
                workout_id: c.workout_id,
                workout_name: workout.map_or_else(
                    || DELETED_WORKOUT_LABEL.to_string(),
                    |w| w.name.clone(),
                ),
                category: workout.and_then(|w| w.category.clone()),
                image_url: workout.and_then(|w| w.image_url.clone()),
                completed_at: c.completed_at,
            }
        })
        .collect();
    details.sort_by(|a, b| {
        b.completed_at
            .cmp(&a.completed_at)
            .then(b.completion_id.cmp(&a.completion_id))
    });
    Ok(details)
}
