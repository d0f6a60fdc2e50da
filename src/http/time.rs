//! Local-time ↔ instant conversion. This is the only place the engine's
//! epoch seconds meet a timezone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::model::Secs;

/// Resolve a local wall-clock date and time in `tz`. Ambiguous times (DST
/// fall-back) pick the earlier instant; times skipped by a DST jump are `None`.
pub fn local_to_epoch(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<Secs> {
    naive_to_epoch(tz, date.and_time(time))
}

fn naive_to_epoch(tz: Tz, naive: NaiveDateTime) -> Option<Secs> {
    tz.from_local_datetime(&naive).earliest().map(|dt| dt.timestamp())
}

/// ISO-8601 with offset, seconds precision, e.g. `2025-08-30T14:00:00+02:00`.
pub fn epoch_to_local_iso(tz: Tz, secs: Secs) -> String {
    match tz.timestamp_opt(secs, 0).single() {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
        None => secs.to_string(),
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// Parse an ISO-8601 timestamp. With an explicit offset it is taken as-is;
/// a bare date or date-time is interpreted in `tz`.
pub fn parse_instant(tz: Tz, s: &str) -> Option<Secs> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%:z", "%Y-%m-%dT%H:%M%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.timestamp());
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return naive_to_epoch(tz, naive);
        }
    }
    let date = parse_date(s)?;
    naive_to_epoch(tz, date.and_hms_opt(0, 0, 0)?)
}
