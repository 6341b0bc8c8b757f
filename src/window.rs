//! Rolling-window and Eastern-Time civil-day helpers.
//!
//! The upstream event store stamps civil days in fixed-offset Eastern Time:
//! UTC-4 April through October, UTC-5 otherwise. Bucketing reproduces that
//! rule rather than full IANA DST math so stored points line up with the
//! source data; the offset is keyed by each timestamp's own month.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

pub const WINDOW_HOURS: i64 = 24;
pub const TS_FMT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// ET offset from UTC in hours for a month (EDT Apr-Oct, EST otherwise).
pub fn et_offset_hours(month: u32) -> i64 {
    if (4..=10).contains(&month) {
        4
    } else {
        5
    }
}

/// ET calendar date of a UTC instant.
pub fn et_civil_date(utc: DateTime<Utc>) -> NaiveDate {
    (utc - Duration::hours(et_offset_hours(utc.month()))).date_naive()
}

/// Noon ET on the given civil date, expressed as a UTC timestamp string.
/// Every daily history point lands here for stable chart positioning.
pub fn noon_et_utc(day: NaiveDate) -> String {
    let base = day.and_time(NaiveTime::MIN);
    fmt_instant((base + Duration::hours(12 + et_offset_hours(day.month()))).and_utc())
}

/// Midnight ET on the current ET day, expressed as a UTC timestamp string.
pub fn et_day_start_utc(now: DateTime<Utc>) -> String {
    let day = et_civil_date(now);
    let base = day.and_time(NaiveTime::MIN);
    fmt_instant((base + Duration::hours(et_offset_hours(day.month()))).and_utc())
}

/// Trailing 24-hour window start for a run beginning at `now`.
pub fn window_start(now: DateTime<Utc>) -> String {
    fmt_instant(now - Duration::hours(WINDOW_HOURS))
}

pub fn fmt_instant(dt: DateTime<Utc>) -> String {
    dt.format(TS_FMT).to_string()
}

/// Parse the leading `YYYY-MM-DDTHH:MM:SS` of a stored timestamp as UTC.
/// Suffixes (Z, fractional seconds) are ignored; anything shorter is None.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let head = raw.get(..19)?;
    NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Spread `n` timestamps evenly from `since` to `now`, floored at
/// `min_span_secs` so a zero-width window still separates events.
pub fn spread_instants(since: &str, now: DateTime<Utc>, n: usize, min_span_secs: i64) -> Vec<String> {
    let start = parse_instant(since).unwrap_or_else(|| now - Duration::hours(WINDOW_HOURS));
    let span = (now - start).num_seconds().max(min_span_secs);
    let last = n.saturating_sub(1).max(1) as f64;
    (0..n)
        .map(|i| {
            let offset = ((i as f64 / last) * span as f64) as i64;
            fmt_instant(start + Duration::seconds(offset))
        })
        .collect()
}
