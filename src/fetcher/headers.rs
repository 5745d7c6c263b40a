//! Response header interpretation for backoff scheduling.

use chrono::{DateTime, TimeDelta, Utc};

/// Shortest delay ever derived from `Cache-Control`.
pub const MIN_MAX_AGE_SECS: i64 = 60;
/// Delay used when `Retry-After` is missing or unreadable.
pub const DEFAULT_RETRY_AFTER_SECS: i64 = 5 * 60;

/// Seconds until the next poll, from a `Cache-Control` value.
///
/// Uses the first `max-age` directive, floored at [`MIN_MAX_AGE_SECS`].
/// Missing or malformed values give the floor.
pub fn max_age_secs(cache_control: Option<&str>) -> i64 {
    let Some(value) = cache_control else {
        return MIN_MAX_AGE_SECS;
    };
    value
        .split(',')
        .map(str::trim)
        .find_map(|directive| directive.strip_prefix("max-age="))
        .and_then(|seconds| seconds.trim().parse::<i64>().ok())
        .map_or(MIN_MAX_AGE_SECS, |seconds| seconds.max(MIN_MAX_AGE_SECS))
}

/// Earliest next poll after a 304 or 200.
pub fn next_after_max_age(cache_control: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    add_secs(now, max_age_secs(cache_control))
}

/// Earliest next poll after a 429 or 503.
///
/// Integer values are seconds from `now`, HTTP dates are taken as absolute.
/// Anything else waits [`DEFAULT_RETRY_AFTER_SECS`].
pub fn retry_after(value: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return add_secs(now, DEFAULT_RETRY_AFTER_SECS);
    };
    // Negative delays are not valid delta-seconds; they fall through to the
    // default rather than meaning "retry now".
    if let Ok(seconds) = value.parse::<u32>() {
        return add_secs(now, i64::from(seconds));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return date.with_timezone(&Utc);
    }
    add_secs(now, DEFAULT_RETRY_AFTER_SECS)
}

/// Formats a timestamp as an IMF-fixdate for `If-Modified-Since`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn add_secs(now: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    TimeDelta::try_seconds(secs)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
