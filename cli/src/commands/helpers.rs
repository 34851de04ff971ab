use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;

use reps_core::blob::content_type_for_path;
use reps_core::calendar::{DateKey, YMD_FORMAT};

const BAR_WIDTH: usize = 20;

/// Resolve a day argument to `YYYY-MM-DD`. today/yesterday/tomorrow are
/// relative to `today`, the service clock's local date.
pub(crate) fn parse_day(day: Option<&str>, today: NaiveDate) -> Result<String> {
    let date: NaiveDate = match day {
        None | Some("today") => today,
        Some("yesterday") => today - chrono::Duration::days(1),
        Some("tomorrow") => today + chrono::Duration::days(1),
        Some(s) => DateKey::parse(s)
            .with_context(|| format!("Use YYYY-MM-DD or today/yesterday/tomorrow, got '{s}'"))?
            .date(),
    };
    Ok(date.format(YMD_FORMAT).to_string())
}

/// Read a media file, guessing its content type from the extension.
pub(crate) fn read_media(path: &Path) -> Result<(Vec<u8>, &'static str)> {
    let Some(content_type) = content_type_for_path(path) else {
        bail!(
            "Unsupported file type: {}. Use jpg, png, gif, webp, heic, mp4, mov, webm or m4v",
            path.display()
        );
    };
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((bytes, content_type))
}

/// Fixed-width text bar for a fraction in `[0, 1]`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn progress_bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_parse_day_none() {
        assert_eq!(parse_day(None, today()).unwrap(), "2024-03-01");
    }

    #[test]
    fn test_parse_day_keywords() {
        assert_eq!(parse_day(Some("today"), today()).unwrap(), "2024-03-01");
        assert_eq!(parse_day(Some("yesterday"), today()).unwrap(), "2024-02-29");
        assert_eq!(parse_day(Some("tomorrow"), today()).unwrap(), "2024-03-02");
    }

    #[test]
    fn test_parse_day_keywords_follow_given_date() {
        let new_year = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(parse_day(Some("yesterday"), new_year).unwrap(), "2024-12-31");
        assert_eq!(parse_day(None, new_year).unwrap(), "2025-01-01");
    }

    #[test]
    fn test_parse_day_iso() {
        assert_eq!(parse_day(Some("2024-01-15"), today()).unwrap(), "2024-01-15");
    }

    #[test]
    fn test_parse_day_invalid() {
        assert!(parse_day(Some("nope"), today()).is_err());
        assert!(parse_day(Some("2024-02-30"), today()).is_err());
    }

    #[test]
    fn test_read_media() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("squat.PNG");
        std::fs::write(&photo, b"png").unwrap();
        let (bytes, content_type) = read_media(&photo).unwrap();
        assert_eq!(bytes, b"png");
        assert_eq!(content_type, "image/png");

        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, b"text").unwrap();
        assert!(read_media(&notes).is_err());
        assert!(read_media(&dir.path().join("missing.mp4")).is_err());
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "-".repeat(20)));
        assert_eq!(progress_bar(1.0), format!("[{}]", "#".repeat(20)));
        assert_eq!(progress_bar(0.5), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
        assert_eq!(progress_bar(7.0), progress_bar(1.0));
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("boom"), r#"{"error":"boom"}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("日清カップヌードル", 8), "日清カップ...");
    }
}
