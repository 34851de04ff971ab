use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};

use crate::calendar::{DateKey, day_key};

/// Consecutive days with at least one completion, walking back from today.
///
/// The walk starts at today unconditionally: if nothing was completed today
/// the streak is 0 even when yesterday's chain is intact.
pub fn streak_days<'a, Tz, I>(completed_at: I, now: &DateTime<Tz>) -> u32
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a DateTime<Utc>>,
{
    let tz = now.timezone();
    let days: HashSet<DateKey> = completed_at
        .into_iter()
        .map(|instant| day_key(instant, &tz))
        .collect();

    let mut streak = 0;
    let mut cursor = Some(DateKey::new(now.date_naive()));
    while let Some(day) = cursor {
        if !days.contains(&day) {
            break;
        }
        streak += 1;
        cursor = day.pred();
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 15, 9, 0, 0)
            .unwrap()
    }

    fn days_ago(n: i64, hour_offset: i64) -> DateTime<Utc> {
        (now() - Duration::days(n) + Duration::hours(hour_offset)).with_timezone(&Utc)
    }

    #[test]
    fn test_empty_is_zero() {
        let none: Vec<DateTime<Utc>> = Vec::new();
        assert_eq!(streak_days(&none, &now()), 0);
    }

    #[test]
    fn test_single_completion_today() {
        let completions = vec![days_ago(0, 0)];
        assert_eq!(streak_days(&completions, &now()), 1);
    }

    #[test]
    fn test_today_and_yesterday() {
        let completions = vec![days_ago(0, 0), days_ago(1, 3)];
        assert_eq!(streak_days(&completions, &now()), 2);
    }

    #[test]
    fn test_missing_today_is_zero_even_with_yesterday_chain() {
        let completions = vec![days_ago(1, 0), days_ago(2, 0), days_ago(3, 0)];
        assert_eq!(streak_days(&completions, &now()), 0);
    }

    #[test]
    fn test_unbroken_run_then_gap() {
        for k in 0..10 {
            let mut completions: Vec<DateTime<Utc>> = (0..=k).map(|d| days_ago(d, 0)).collect();
            // gap at k+1, then older activity that must not count
            completions.push(days_ago(k + 2, 0));
            completions.push(days_ago(k + 3, 0));
            assert_eq!(streak_days(&completions, &now()), (k + 1) as u32);
        }
    }

    #[test]
    fn test_duplicates_and_order_do_not_matter() {
        let completions = vec![
            days_ago(1, 1),
            days_ago(0, 0),
            days_ago(1, 0),
            days_ago(0, -2),
            days_ago(2, 0),
        ];
        assert_eq!(streak_days(&completions, &now()), 3);
    }

    #[test]
    fn test_uses_local_day_boundaries() {
        // 23:30 local on the 14th is already the 15th in UTC; still "yesterday" locally
        let tz = now().timezone();
        let late_yesterday = tz
            .with_ymd_and_hms(2024, 6, 14, 23, 30, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(late_yesterday.date_naive().to_string(), "2024-06-15");
        assert_eq!(streak_days(&[late_yesterday], &now()), 0);
        assert_eq!(streak_days(&[late_yesterday, days_ago(0, 0)], &now()), 2);
    }
}
