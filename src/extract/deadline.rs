//! Lightweight deadline-hint detection over raw item text.
//!
//! Used by the extraction-failure fallback path and the suggestion
//! reasoning text. Deterministic given the evaluation instant.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use regex::Regex;
use std::sync::OnceLock;

/// Hour of day (UTC) a phrase-derived deadline lands on.
const DEADLINE_HOUR: u32 = 17;

// The patterns are hard-coded literals; Regex::new cannot fail on them.
#[allow(clippy::unwrap_used)]
fn iso_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap())
}

#[allow(clippy::unwrap_used)]
fn weekday_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\bby\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
            .unwrap()
    })
}

#[allow(clippy::unwrap_used)]
fn phrase_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(eod|end of day|today|tomorrow|end of week|eow|this week|next week)\b")
            .unwrap()
    })
}

/// Detect a deadline hint in free-form text.
///
/// Recognizes ISO dates (`2026-03-14`), `by <weekday>` phrases, and a
/// small table of relative phrases (`eod`, `tomorrow`, `end of week`,
/// `next week`). Returns the earliest interpretation found, or `None`.
#[must_use]
pub fn detect_deadline(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(captures) = iso_date_pattern().captures(text) {
        let date = chrono::NaiveDate::from_ymd_opt(
            captures[1].parse().ok()?,
            captures[2].parse().ok()?,
            captures[3].parse().ok()?,
        )?;
        return at_deadline_hour(date);
    }

    if let Some(captures) = weekday_pattern().captures(text) {
        let target = parse_weekday(&captures[1])?;
        return next_weekday(now, target);
    }

    if let Some(captures) = phrase_pattern().captures(text) {
        let phrase = captures[1].to_ascii_lowercase();
        return match phrase.as_str() {
            "eod" | "end of day" | "today" => at_deadline_hour(now.date_naive()),
            "tomorrow" => at_deadline_hour((now + Duration::days(1)).date_naive()),
            "end of week" | "eow" | "this week" => next_weekday(now, Weekday::Fri),
            "next week" => at_deadline_hour((now + Duration::days(7)).date_naive()),
            _ => None,
        };
    }

    None
}

fn at_deadline_hour(date: chrono::NaiveDate) -> Option<DateTime<Utc>> {
    let time = NaiveTime::from_hms_opt(DEADLINE_HOUR, 0, 0)?;
    Some(DateTime::from_naive_utc_and_offset(date.and_time(time), Utc))
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name.to_ascii_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// The next occurrence of `target` strictly after today.
fn next_weekday(now: DateTime<Utc>, target: Weekday) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    let ahead = (7 + target.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { i64::from(ahead) };
    at_deadline_hour(today + Duration::days(ahead))
}
