use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::constants::*;

/// Combines a calendar date ("2024-06-01") and a local time ("11:00 AM")
/// into an absolute instant in the event time zone. Malformed input is a
/// per-record error for the caller, never a panic.
pub fn resolve_event_time(date: &str, time: &str) -> anyhow::Result<DateTime<Tz>> {
    let date_time = format!("{date} {time}");
    let naive = NaiveDateTime::parse_from_str(&date_time, EVENT_DATE_TIME_FORMAT)?;
    EVENT_TIME_ZONE
        .from_local_datetime(&naive)
        .single()
        .ok_or(anyhow::anyhow!("ambiguous local time: {date_time}"))
}
