use chrono::{DateTime, Duration, FixedOffset, Local, Offset, TimeZone, Utc};

const ABSOLUTE_FORMAT: &str = "%B %d %Y %H:%M:%S";

/// Format a timestamp for a table cell.
///
/// Timestamps younger than `threshold` show strict relative time
/// (`"5 minutes ago"`), older ones the short date `M/D/YY`.
pub(crate) fn format_time_cell(dt: &DateTime<Utc>, now: DateTime<Utc>, threshold: Duration) -> String {
    if now.signed_duration_since(dt) < threshold {
        format_relative_strict(dt, now)
    } else {
        format_short_date(dt)
    }
}

/// `M/D/YY` without zero padding, e.g. `"8/25/23"`.
pub(crate) fn format_short_date(dt: &DateTime<Utc>) -> String {
    use chrono::Datelike;
    format!("{}/{}/{:02}", dt.month(), dt.day(), dt.year().rem_euclid(100))
}

/// Strict relative time in a single unit, rounded down: `"1 hour ago"`,
/// `"3 days ago"`. Future timestamps read `"in 2 minutes"`.
pub(crate) fn format_relative_strict(dt: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(dt);
    let future = elapsed < Duration::zero();
    let secs = elapsed.num_seconds().unsigned_abs();

    let (value, unit) = if secs < 60 {
        (secs, "second")
    } else if secs < 3_600 {
        (secs / 60, "minute")
    } else if secs < 86_400 {
        (secs / 3_600, "hour")
    } else if secs < 30 * 86_400 {
        (secs / 86_400, "day")
    } else if secs < 365 * 86_400 {
        (secs / (30 * 86_400), "month")
    } else {
        (secs / (365 * 86_400), "year")
    };
    let plural = if value == 1 { "" } else { "s" };

    if future {
        format!("in {value} {unit}{plural}")
    } else {
        format!("{value} {unit}{plural} ago")
    }
}

/// Lines of the timestamp detail panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampDetail {
    pub relative: String,
    pub utc: String,
    pub local_label: String,
    pub local: String,
}

impl TimestampDetail {
    /// Detail for the viewer's local time zone.
    pub fn new(dt: &DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let offset = Local.offset_from_utc_datetime(&dt.naive_utc()).fix();
        Self::with_offset(dt, now, offset)
    }

    pub fn with_offset(dt: &DateTime<Utc>, now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            relative: format_relative_strict(dt, now),
            utc: dt.format(ABSOLUTE_FORMAT).to_string(),
            local_label: gmt_label(offset),
            local: dt.with_timezone(&offset).format(ABSOLUTE_FORMAT).to_string(),
        }
    }
}

/// Short zone label: `"GMT+3"`, `"GMT-4:30"`, `"GMT+0"`.
pub(crate) fn gmt_label(offset: FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let minutes = secs.unsigned_abs() / 60;
    let (h, m) = (minutes / 60, minutes % 60);
    if m == 0 {
        format!("GMT{sign}{h}")
    } else {
        format!("GMT{sign}{h}:{m:02}")
    }
}

/// Format the age of the last successful fetch for the footer.
pub(crate) fn format_updated_ago(fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(fetched_at).num_seconds().max(0);
    if secs < 5 {
        "Updated just now".to_owned()
    } else if secs < 60 {
        format!("Updated {secs}s ago")
    } else {
        format!("Updated {}m ago", secs / 60)
    }
}
