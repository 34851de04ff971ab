//! Calendar arithmetic shared by the progress engine.
//!
//! Every function takes its time zone explicitly (either as an argument or
//! carried by the `DateTime`), so "local day" always means the day in the
//! caller's zone and tests can pin it with a `FixedOffset`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, CoreResult};

pub const YMD_FORMAT: &str = "%Y-%m-%d";

/// A local calendar date, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey(NaiveDate);

impl DateKey {
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    #[must_use]
    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// The previous calendar day, `None` only at chrono's minimum date.
    #[must_use]
    pub fn pred(self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }

    #[must_use]
    pub fn succ(self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    /// Strict `YYYY-MM-DD` parse. chrono alone accepts unpadded fields, so the
    /// shape is checked first.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let bytes = s.as_bytes();
        let shaped = bytes.len() == 10
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() });
        if !shaped {
            return Err(CoreError::InvalidDateKey(s.to_string()));
        }
        NaiveDate::parse_from_str(s, YMD_FORMAT)
            .map(Self)
            .map_err(|_| CoreError::InvalidDateKey(s.to_string()))
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(YMD_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Half-open `[start, end)` range covering one local day.
#[derive(Debug, Clone)]
pub struct DayBounds<Tz: TimeZone> {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> DayBounds<Tz> {
    #[must_use]
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        let start = self.start.with_timezone(&Utc);
        let end = self.end.with_timezone(&Utc);
        start <= *instant && *instant < end
    }
}

/// Local calendar day of `instant` as seen from `tz`.
pub fn day_key<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> DateKey {
    DateKey(instant.with_timezone(tz).date_naive())
}

/// First instant of `date` in `tz`.
///
/// When a DST transition skips midnight the first valid local time of the day
/// is used instead.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..96)
        .find_map(|quarter| {
            tz.from_local_datetime(&(midnight + Duration::minutes(15 * quarter)))
                .earliest()
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

/// Local midnight of the Monday on or before `instant` (ISO weeks; Sunday
/// belongs to the week that started six days earlier).
pub fn start_of_week<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<Tz> {
    let date = instant.date_naive();
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    local_midnight(&instant.timezone(), monday)
}

pub fn date_to_ymd<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant.date_naive().format(YMD_FORMAT).to_string()
}

pub fn ymd_to_bounds<Tz: TimeZone>(ymd: &str, tz: &Tz) -> CoreResult<DayBounds<Tz>> {
    let key = DateKey::parse(ymd)?;
    key_to_bounds(key, tz)
}

pub fn key_to_bounds<Tz: TimeZone>(key: DateKey, tz: &Tz) -> CoreResult<DayBounds<Tz>> {
    let next = key
        .succ()
        .ok_or_else(|| CoreError::InvalidDateKey(key.to_string()))?;
    Ok(DayBounds {
        start: local_midnight(tz, key.date()),
        end: local_midnight(tz, next.date()),
    })
}
