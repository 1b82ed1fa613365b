//! Expansion of raw events into dated occurrences inside the analysis window.
//!
//! A single event yields at most one occurrence. A recurring series merges
//! three sources: the dates its rule generates inside the window, the days
//! named by its overrides (an override may move an occurrence into the
//! window from outside it), and its exception days. For each candidate day
//! an override wins over an exception, and an exception cancels the
//! generated occurrence. Every resolved occurrence is clipped against the
//! window once more, because an override can also move one out of it.

use crate::calendar::calendar_participants::extract_participants;
use crate::calendar::calendar_recurrence::RecurrenceRule;
use crate::calendar::calendar_types::{
    AnalysisWindow, CalendarDay, EventDuration, EventOverride, EventParticipants, Occurrence, RawEvent,
};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::HashSet;

/// How one candidate date of a series was settled.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Resolution<'a> {
    Overridden(&'a EventOverride),
    Excepted,
    Generated,
}

/// Expands one event into the occurrences that intersect `window`, in
/// discovery order. Pure: the same event and window always give the same
/// sequence.
pub fn resolve_occurrences(event: &RawEvent, window: &AnalysisWindow) -> Vec<Occurrence> {
    match event.recurrence_rule.as_deref() {
        Some(rule) => resolve_series(event, rule, window),
        None => resolve_single(event, window).into_iter().collect(),
    }
}

/// Expands every event in order and concatenates the results.
pub fn resolve_all(events: &[RawEvent], window: &AnalysisWindow) -> Vec<Occurrence> {
    events.iter().flat_map(|event| resolve_occurrences(event, window)).collect()
}

fn participants_of(event: &RawEvent) -> EventParticipants {
    extract_participants(event.organizer.as_ref(), event.attendees.as_ref())
}

fn resolve_single(event: &RawEvent, window: &AnalysisWindow) -> Option<Occurrence> {
    if !window.admits(event.start, event.end) {
        debug!("'{}' at {} lies outside the analysis window", event.subject, event.start);
        return None;
    }
    Some(Occurrence::new(
        event.subject.clone(),
        event.start,
        EventDuration::between(event.start, event.end),
        false,
        participants_of(event),
    ))
}

fn resolve_series(event: &RawEvent, rule: &str, window: &AnalysisWindow) -> Vec<Occurrence> {
    let base_duration = EventDuration::between(event.start, event.end);
    let participants = participants_of(event);
    let mut overridden_days = HashSet::new();

    candidate_starts(event, rule, window)
        .into_iter()
        .filter_map(|candidate| {
            let day = CalendarDay::truncate(candidate);
            let (subject, start, duration) = match resolve_candidate(event, day, !overridden_days.contains(&day)) {
                Resolution::Overridden(o) => {
                    overridden_days.insert(day);
                    (o.subject.as_str(), o.start, EventDuration::between(o.start, o.end))
                }
                Resolution::Excepted => {
                    debug!("'{}' cancelled on {}", event.subject, day);
                    return None;
                }
                Resolution::Generated => (event.subject.as_str(), candidate, base_duration),
            };

            let end = start + duration.delta();
            if !window.admits(start, end) {
                debug!("'{}' on {} resolved to {} outside the analysis window", subject, day, start);
                return None;
            }
            Some(Occurrence::new(subject, start, duration, true, participants.clone()))
        })
        .collect()
}

/// Override first, then exception, otherwise the generated date stands.
/// An override replaces only the first candidate of its day.
fn resolve_candidate(event: &RawEvent, day: CalendarDay, override_open: bool) -> Resolution<'_> {
    match event.overrides.get(&day) {
        Some(found) if override_open => Resolution::Overridden(found),
        _ if event.exception_dates.contains(&day) => Resolution::Excepted,
        _ => Resolution::Generated,
    }
}

/// Every rule date inside the window, followed by the override days the
/// rule did not produce and whose midnight is not strictly inside it.
fn candidate_starts(event: &RawEvent, rule: &str, window: &AnalysisWindow) -> Vec<DateTime<Utc>> {
    let generated = match RecurrenceRule::new(rule, event.start, event.time_zone) {
        Ok(rule) => rule.between(window),
        Err(e) => {
            warn!("'{}': {}; using its first instance only", event.subject, e);
            vec![event.start].into_iter().filter(|s| window.start() <= *s && *s <= window.end()).collect()
        }
    };

    let rule_days: HashSet<CalendarDay> = generated.iter().copied().map(CalendarDay::truncate).collect();
    let rescheduled: Vec<_> = event
        .overrides
        .keys()
        .filter(|day| !rule_days.contains(*day))
        .map(CalendarDay::start_instant)
        .filter(|day_start| !window.strictly_contains(*day_start))
        .collect();

    generated.into_iter().chain(rescheduled).collect()
}
