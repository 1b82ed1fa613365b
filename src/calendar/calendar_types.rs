//! Core calendar types shared by the importer, the occurrence resolver and
//! the report stage.

use crate::calendar::{CalendarError, Result};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

const MILLIS_PER_SECOND: f64 = 1_000.0;
const MILLIS_PER_MINUTE: f64 = 60_000.0;
const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Day-granularity key used for override and exception lookups.
///
/// Two instants on the same UTC calendar day share a key, so at most one
/// override and one exception can apply per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    /// Truncates an instant to its UTC calendar day, dropping time-of-day.
    pub fn truncate(instant: DateTime<Utc>) -> Self {
        CalendarDay(instant.date_naive())
    }

    /// Midnight UTC at the start of this day.
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.0.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

impl FromStr for CalendarDay {
    type Err = CalendarError;

    /// Parses an ISO `YYYY-MM-DD` key.
    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(CalendarDay)
            .map_err(|_| CalendarError::InvalidDateTime(format!("not a calendar day: '{}'", s)))
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Length of one occurrence.
///
/// Holds a single millisecond delta; the day/hour/minute/second figures are
/// views over it and cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventDuration(TimeDelta);

impl EventDuration {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        EventDuration(end - start)
    }

    pub fn from_delta(delta: TimeDelta) -> Self {
        EventDuration(delta)
    }

    pub fn delta(&self) -> TimeDelta {
        self.0
    }

    pub fn milliseconds(&self) -> i64 {
        self.0.num_milliseconds()
    }

    pub fn days(&self) -> f64 {
        self.milliseconds() as f64 / MILLIS_PER_DAY
    }

    pub fn hours(&self) -> f64 {
        self.milliseconds() as f64 / MILLIS_PER_HOUR
    }

    pub fn minutes(&self) -> f64 {
        self.milliseconds() as f64 / MILLIS_PER_MINUTE
    }

    pub fn seconds(&self) -> f64 {
        self.milliseconds() as f64 / MILLIS_PER_SECOND
    }
}

impl Serialize for EventDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EventDuration", 4)?;
        state.serialize_field("seconds", &self.seconds())?;
        state.serialize_field("minutes", &self.minutes())?;
        state.serialize_field("hours", &self.hours())?;
        state.serialize_field("days", &self.days())?;
        state.end()
    }
}

/// Fixed date range that occurrences must intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl AnalysisWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(CalendarError::Config(format!(
                "analysis window start {} must be before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// An interval is kept unless it ends strictly before the window opens or
    /// starts strictly after it closes. Touching a boundary counts as inside.
    pub fn admits(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        !(end < self.start || start > self.end)
    }

    /// Exclusive containment: the boundary instants themselves are outside.
    pub fn strictly_contains(&self, instant: DateTime<Utc>) -> bool {
        self.start < instant && instant < self.end
    }
}

/// An organizer or attendee exactly as the calendar source carried it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParticipant {
    /// Display name (`CN` parameter), possibly wrapped in quotes.
    pub common_name: Option<String>,
    /// Property value, usually a `mailto:` URI.
    pub value: Option<String>,
}

impl RawParticipant {
    pub fn new(common_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { common_name: Some(common_name.into()), value: Some(value.into()) }
    }
}

/// Attendee field of a raw event: a lone record or a list of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Participants {
    One(RawParticipant),
    Many(Vec<RawParticipant>),
}

impl Participants {
    pub fn as_slice(&self) -> &[RawParticipant] {
        match self {
            Participants::One(p) => std::slice::from_ref(p),
            Participants::Many(list) => list,
        }
    }
}

/// Cleaned participant: quotes stripped from the name, `mailto:` from the email.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Individual {
    pub name: String,
    pub email: String,
}

/// Replacement details for one day of a recurring series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOverride {
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// One VEVENT as handed over by the importer. Never mutated after import.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub uid: Option<String>,
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Zone the series is anchored in; recurrence expansion follows its
    /// wall clock across DST changes.
    pub time_zone: Tz,
    /// `RRULE` value without the property name.
    pub recurrence_rule: Option<String>,
    pub overrides: BTreeMap<CalendarDay, EventOverride>,
    pub exception_dates: BTreeSet<CalendarDay>,
    pub organizer: Option<RawParticipant>,
    pub attendees: Option<Participants>,
}

impl RawEvent {
    /// A plain single event in UTC with no recurrence and no participants.
    pub fn new(subject: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            uid: None,
            subject: subject.into(),
            start,
            end,
            time_zone: Tz::UTC,
            recurrence_rule: None,
            overrides: BTreeMap::new(),
            exception_dates: BTreeSet::new(),
            organizer: None,
            attendees: None,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule.is_some()
    }
}

/// Organizer and attendees after normalization.
///
/// `attendees` is `None` when the source had no attendee field at all and
/// `Some(vec![])` when it had an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct EventParticipants {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<Individual>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Individual>>,
}

impl EventParticipants {
    pub fn is_empty(&self) -> bool {
        self.organizer.is_none() && self.attendees.as_ref().is_none_or(|a| a.is_empty())
    }

    /// Organizer first, then attendees in source order.
    pub fn iter(&self) -> impl Iterator<Item = &Individual> {
        self.organizer.iter().chain(self.attendees.iter().flatten())
    }
}

/// A single dated instance of an event inside the analysis window.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub subject: String,
    pub is_recurring: bool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    pub participants: EventParticipants,
}

impl Occurrence {
    /// End time is always `start + duration`.
    pub fn new(
        subject: impl Into<String>,
        start: DateTime<Utc>,
        duration: EventDuration,
        is_recurring: bool,
        participants: EventParticipants,
    ) -> Self {
        Self {
            subject: subject.into(),
            is_recurring,
            start,
            end: start + duration.delta(),
            participants,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> EventDuration {
        EventDuration::between(self.start, self.end)
    }
}

impl Serialize for Occurrence {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Occurrence", 7)?;
        state.serialize_field("isRecurring", &self.is_recurring)?;
        state.serialize_field("subject", &self.subject)?;
        state.serialize_field("startDate", &self.start.to_rfc3339())?;
        state.serialize_field("endDate", &self.end.to_rfc3339())?;
        state.serialize_field("duration", &self.duration())?;
        if let Some(organizer) = &self.participants.organizer {
            state.serialize_field("organizer", organizer)?;
        } else {
            state.skip_field("organizer")?;
        }
        if let Some(attendees) = &self.participants.attendees {
            state.serialize_field("attendees", attendees)?;
        } else {
            state.skip_field("attendees")?;
        }
        state.end()
    }
}
