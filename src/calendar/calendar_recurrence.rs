//! RRULE enumeration backed by the `rrule` crate.

use crate::calendar::calendar_datetime::localize;
use crate::calendar::calendar_types::AnalysisWindow;
use crate::calendar::{CalendarError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use log::warn;
use rrule::{RRule, RRuleSet, Tz as RuleTz, Unvalidated};

/// Hard cap on generated starts per series and window.
pub const MAX_OCCURRENCES: u16 = 10_000;

/// A recurrence rule anchored at its series start.
#[derive(Debug, Clone)]
pub struct RecurrenceRule {
    set: RRuleSet,
}

impl RecurrenceRule {
    /// Parses `rule` (with or without the `RRULE:` prefix) and anchors it at
    /// `dtstart`, expanded on the wall clock of `zone`.
    pub fn new(rule: &str, dtstart: DateTime<Utc>, zone: chrono_tz::Tz) -> Result<Self> {
        let text = normalize_rule_text(rule, zone);
        let parsed = text
            .parse::<RRule<Unvalidated>>()
            .map_err(|e| CalendarError::InvalidRecurrenceRule(format!("{}: {}", text, e)))?;
        let set = parsed
            .build(dtstart.with_timezone(&RuleTz::Tz(zone)))
            .map_err(|e| CalendarError::InvalidRecurrenceRule(format!("{}: {}", text, e)))?;
        Ok(Self { set })
    }

    /// Every start the rule generates within `window`, both boundary
    /// instants included, in chronological order.
    pub fn between(&self, window: &AnalysisWindow) -> Vec<DateTime<Utc>> {
        // Pad by one second on each side and clip here so the result does not
        // depend on whether the engine treats its bounds as inclusive.
        let padding = TimeDelta::seconds(1);
        let result = self
            .set
            .clone()
            .after((window.start() - padding).with_timezone(&RuleTz::UTC))
            .before((window.end() + padding).with_timezone(&RuleTz::UTC))
            .all(MAX_OCCURRENCES);
        if result.limited {
            warn!("Recurrence expansion stopped after {} occurrences", MAX_OCCURRENCES);
        }
        result
            .dates
            .into_iter()
            .map(|d| d.with_timezone(&Utc))
            .filter(|d| window.start() <= *d && *d <= window.end())
            .collect()
    }
}

/// Strips an `RRULE:` prefix and rewrites a floating `UNTIL` as UTC: a
/// date-time is read on the wall clock of `zone`, a date becomes the last
/// second of that day in `zone`. The engine rejects a local UNTIL against
/// a zoned DTSTART.
fn normalize_rule_text(rule: &str, zone: chrono_tz::Tz) -> String {
    let trimmed = rule.trim();
    let body = match trimmed.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("RRULE:") => &trimmed[6..],
        _ => trimmed,
    };

    body.split(';')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") => match floating_until(value, zone) {
                Some(until) => format!("UNTIL={}", until.format("%Y%m%dT%H%M%SZ")),
                None => part.to_string(),
            },
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn floating_until(value: &str, zone: chrono_tz::Tz) -> Option<DateTime<Utc>> {
    let naive = match value.len() {
        8 => NaiveDate::parse_from_str(value, "%Y%m%d").ok()?.and_hms_opt(23, 59, 59)?,
        15 => NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?,
        _ => return None,
    };
    localize(naive, zone).ok()
}
