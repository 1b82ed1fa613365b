//! Date/time parsing for iCalendar values and configured window bounds.

use crate::calendar::{CalendarError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-])?P(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .expect("duration pattern is valid")
});

/// Resolves a `TZID` parameter, falling back to `default` for names the
/// tz database does not know (e.g. Windows zone names in Outlook exports).
pub fn resolve_zone(tzid: Option<&str>, default: Tz) -> Tz {
    let Some(raw) = tzid else {
        return default;
    };
    let name = raw.trim().trim_matches('"').trim_start_matches('/');
    match name.parse::<Tz>() {
        Ok(zone) => zone,
        Err(_) => {
            debug!("Unknown TZID '{}', using {}", name, default);
            default
        }
    }
}

/// Pins a wall-clock time to `zone`. A time skipped by a DST jump is read
/// one hour later.
pub fn localize(naive: NaiveDateTime, zone: Tz) -> Result<DateTime<Utc>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| CalendarError::InvalidDateTime(format!("{} does not exist in {}", naive, zone)))
}

/// Parses a DATE or DATE-TIME property value.
///
/// `Z`-suffixed values are UTC; other date-times and bare dates are read on
/// the wall clock of `zone` (dates at midnight).
pub fn parse_ical_datetime(value: &str, zone: Tz) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Some(utc) = value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .map(|naive| naive.and_utc())
            .map_err(|_| CalendarError::InvalidDateTime(value.to_string()));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return localize(naive, zone);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y%m%d") {
        return localize(date.and_time(NaiveTime::MIN), zone);
    }
    Err(CalendarError::InvalidDateTime(value.to_string()))
}

/// Parses an RFC 5545 DURATION value such as `PT30M`, `P1DT2H` or `-P1W`.
pub fn parse_ical_duration(value: &str) -> Result<TimeDelta> {
    let value = value.trim();
    let caps = DURATION_RE
        .captures(value)
        .filter(|_| value.len() > 1 && !value.ends_with('T'))
        .ok_or_else(|| CalendarError::InvalidDateTime(format!("not a duration: '{}'", value)))?;

    let part = |i: usize| -> i64 { caps.get(i).and_then(|m| m.as_str().parse().ok()).unwrap_or(0) };
    let delta = TimeDelta::weeks(part(2))
        + TimeDelta::days(part(3))
        + TimeDelta::hours(part(4))
        + TimeDelta::minutes(part(5))
        + TimeDelta::seconds(part(6));

    Ok(if caps.get(1).is_some_and(|m| m.as_str() == "-") { -delta } else { delta })
}

/// Parses a configured window bound: `YYYY-MM-DD` (midnight), a local
/// `YYYY-MM-DDTHH:MM[:SS]` (either separator), or RFC 3339.
pub fn parse_window_bound(value: &str, zone: Tz) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return localize(date.and_time(NaiveTime::MIN), zone);
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return localize(naive, zone);
        }
    }
    Err(CalendarError::InvalidDateTime(format!("unrecognised window bound '{}'", value)))
}
