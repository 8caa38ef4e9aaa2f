// crates/core/src/datetime.rs

//! Natural-language date/time resolution.
//!
//! Every output is an instant qualified with the configured timezone's UTC
//! offset; daylight-saving transitions are the timezone database's problem.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AgentError;

static AMPM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s?(am|pm)\b").expect("ampm regex"));

static CLOCK24_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").expect("24h regex"));

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// A timezone-qualified instant produced from a natural-language expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstant {
    pub instant: DateTime<Tz>,
    /// True when the expression was unparseable and the current instant was
    /// substituted (availability over precision).
    pub fallback: bool,
}

impl ResolvedInstant {
    pub fn to_rfc3339(&self) -> String {
        self.instant.to_rfc3339()
    }
}

/// Canonicalizes relative and absolute date/time expressions. Pure logic,
/// no I/O beyond reading the wall clock.
pub struct DateTimeResolver {
    tz: Tz,
}

impl DateTimeResolver {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// Resolve an expression to an instant in the operating timezone.
    ///
    /// `end_of_day` selects the end-of-day default when the expression
    /// carries no clock time (used for range termini).
    pub fn resolve(&self, expression: &str, end_of_day: bool) -> ResolvedInstant {
        self.resolve_at(expression, end_of_day, self.now())
    }

    fn resolve_at(&self, expression: &str, end_of_day: bool, now: DateTime<Tz>) -> ResolvedInstant {
        let raw = expression.trim();
        // Keyword and clock matching are case-insensitive; absolute parsing
        // needs the original casing (a literal 'T' in RFC 3339).
        let expr = raw.to_lowercase();
        let today = now.date_naive();

        let date = self
            .relative_day(&expr, today)
            .or_else(|| self.relative_span(&expr, today, end_of_day));

        if let Some(date) = date {
            let time = clock_time(&expr).unwrap_or_else(|| default_time(end_of_day));
            return ResolvedInstant {
                instant: self.localize(date, time, now),
                fallback: false,
            };
        }

        match self.parse_absolute(raw, end_of_day, now) {
            Ok(instant) => ResolvedInstant {
                instant,
                fallback: false,
            },
            Err(err) => {
                eprintln!("[datetime] {}; falling back to current instant", err);
                ResolvedInstant {
                    instant: now,
                    fallback: true,
                }
            }
        }
    }

    /// Fixed vocabulary for single calendar days.
    fn relative_day(&self, expr: &str, today: NaiveDate) -> Option<NaiveDate> {
        if expr.contains("today") || expr.contains("tonight") {
            return Some(today);
        }
        if expr.contains("tomorrow") {
            return Some(today + Duration::days(1));
        }
        if expr.contains("yesterday") {
            return Some(today - Duration::days(1));
        }

        for (name, weekday) in WEEKDAYS {
            if expr.contains(name) {
                let ahead = (weekday.num_days_from_monday() as i64
                    - today.weekday().num_days_from_monday() as i64)
                    .rem_euclid(7);
                // A bare weekday name means the next occurrence, counting
                // today; "next <weekday>" on that same weekday skips a week.
                let ahead = if ahead == 0 && expr.contains("next") {
                    7
                } else {
                    ahead
                };
                return Some(today + Duration::days(ahead));
            }
        }

        None
    }

    /// "this/next week|month" resolve to the span's first day, or its last
    /// day when the caller asked for a range terminus.
    fn relative_span(&self, expr: &str, today: NaiveDate, end_of_day: bool) -> Option<NaiveDate> {
        let next = expr.contains("next");
        // A span needs its qualifier; a bare "week"/"month" mention is not
        // part of the vocabulary.
        if !next && !expr.contains("this") {
            return None;
        }

        if expr.contains("week") {
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            let monday = if next { monday + Duration::days(7) } else { monday };
            return Some(if end_of_day {
                monday + Duration::days(6)
            } else {
                monday
            });
        }

        if expr.contains("month") {
            let first = today.with_day(1)?;
            let first = if next { next_month(first)? } else { first };
            return Some(if end_of_day {
                next_month(first)? - Duration::days(1)
            } else {
                first
            });
        }

        None
    }

    /// Direct parsing of absolute date/time strings in the operating timezone.
    fn parse_absolute(
        &self,
        expr: &str,
        end_of_day: bool,
        now: DateTime<Tz>,
    ) -> Result<DateTime<Tz>, AgentError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(expr) {
            return Ok(dt.with_timezone(&self.tz));
        }

        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(expr, format) {
                return Ok(self.localize(naive.date(), naive.time(), now));
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
            let time = clock_time(expr).unwrap_or_else(|| default_time(end_of_day));
            return Ok(self.localize(date, time, now));
        }

        Err(AgentError::UnparseableDate(expr.to_string()))
    }

    /// Attach the operating timezone to a local date and time. Ambiguous
    /// local times (DST overlap) take the earlier mapping; skipped local
    /// times fall back to the current instant.
    fn localize(&self, date: NaiveDate, time: NaiveTime, now: DateTime<Tz>) -> DateTime<Tz> {
        match self.tz.from_local_datetime(&date.and_time(time)) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earlier, _) => earlier,
            LocalResult::None => now,
        }
    }
}

/// Detect an embedded clock time: "2pm", "10:30am", or 24-hour "14:00".
fn clock_time(expr: &str) -> Option<NaiveTime> {
    if let Some(caps) = AMPM_RE.captures(expr) {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps
            .get(2)
            .map(|m| m.as_str().parse().unwrap_or(0))
            .unwrap_or(0);
        if hour == 0 || hour > 12 {
            return None;
        }
        let pm = caps.get(3)?.as_str().eq_ignore_ascii_case("pm");
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        return NaiveTime::from_hms_opt(hour, minute, 0);
    }

    if let Some(caps) = CLOCK24_RE.captures(expr) {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
        return NaiveTime::from_hms_opt(hour, minute, 0);
    }

    None
}

fn default_time(end_of_day: bool) -> NaiveTime {
    if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59).expect("valid time")
    } else {
        NaiveTime::from_hms_opt(0, 0, 0).expect("valid time")
    }
}

fn next_month(first: NaiveDate) -> Option<NaiveDate> {
    if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
}
