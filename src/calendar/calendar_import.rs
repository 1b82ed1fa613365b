//! ICS import logic for the calendar module.
//
// Turns the VEVENT components of an iCalendar file into `RawEvent`s. Every
// other component type is ignored. Overrides (VEVENTs with RECURRENCE-ID)
// are folded into their series by UID.

use crate::calendar::calendar_datetime::{parse_ical_datetime, parse_ical_duration, resolve_zone};
use crate::calendar::calendar_types::{
    CalendarDay, EventOverride, Participants, RawEvent, RawParticipant,
};
use crate::calendar::{CalendarError, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use ical::parser::ical::component::IcalEvent;
use ical::property::Property;
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A VEVENT after property extraction, before overrides are attached.
struct ParsedEvent {
    event: RawEvent,
    recurrence_id: Option<DateTime<Utc>>,
    has_explicit_end: bool,
}

/// Import events from an ICS file
pub fn import_ics_file(path: &Path, default_zone: Tz) -> Result<Vec<RawEvent>> {
    let file = File::open(path).map_err(|e| CalendarError::io(path, e))?;
    let events = import_ics(BufReader::new(file), default_zone)?;
    info!("Read {} events from {}", events.len(), path.display());
    Ok(events)
}

/// Import events from iCalendar text. Floating times and all-day dates are
/// read in `default_zone`.
pub fn import_ics<R: BufRead>(reader: R, default_zone: Tz) -> Result<Vec<RawEvent>> {
    let mut parsed = Vec::new();
    for calendar in ical::IcalParser::new(reader) {
        let calendar = calendar.map_err(|e| CalendarError::Parse(e.to_string()))?;
        for component in &calendar.events {
            if let Some(event) = parse_event(component, default_zone) {
                parsed.push(event);
            }
        }
    }
    debug!("Parsed {} VEVENT components", parsed.len());
    Ok(attach_overrides(parsed))
}

/// Folds override components into the recurring series sharing their UID.
/// Overrides whose series is missing are kept as standalone events after
/// all series.
fn attach_overrides(parsed: Vec<ParsedEvent>) -> Vec<RawEvent> {
    let (overrides, masters): (Vec<_>, Vec<_>) = parsed.into_iter().partition(|p| p.recurrence_id.is_some());

    let mut events: Vec<RawEvent> = masters.into_iter().map(|p| p.event).collect();
    let mut series_by_uid: HashMap<String, usize> = HashMap::new();
    for (index, event) in events.iter().enumerate() {
        if let (Some(uid), true) = (&event.uid, event.is_recurring()) {
            series_by_uid.entry(uid.clone()).or_insert(index);
        }
    }

    let mut orphans = Vec::new();
    for ParsedEvent { event, recurrence_id, has_explicit_end } in overrides {
        let series = event.uid.as_ref().and_then(|uid| series_by_uid.get(uid)).copied();
        let (Some(index), Some(recurrence_id)) = (series, recurrence_id) else {
            debug!("Override '{}' has no series in this file; keeping it standalone", event.subject);
            orphans.push(event);
            continue;
        };

        let master = &mut events[index];
        let end = if has_explicit_end { event.end } else { event.start + (master.end - master.start) };
        let day = CalendarDay::truncate(recurrence_id);
        let subject = if event.subject.is_empty() { master.subject.clone() } else { event.subject };
        if master
            .overrides
            .insert(day, EventOverride { subject, start: event.start, end })
            .is_some()
        {
            warn!("'{}' has more than one override on {}; keeping the last", master.subject, day);
        }
    }

    events.extend(orphans);
    events
}

fn parse_event(component: &IcalEvent, default_zone: Tz) -> Option<ParsedEvent> {
    let subject = find(component, "SUMMARY").and_then(|p| p.value.as_deref()).map(unescape_text).unwrap_or_default();
    let uid = find(component, "UID").and_then(|p| p.value.clone());

    let recurrence_id = find(component, "RECURRENCE-ID").and_then(|p| read_datetime(p, default_zone));
    let Some((start, time_zone)) = find(component, "DTSTART")
        .and_then(|p| read_datetime(p, default_zone).map(|dt| (dt, zone_of(p, default_zone))))
        .or_else(|| recurrence_id.map(|dt| (dt, default_zone)))
    else {
        warn!("Skipping event '{}' without a readable DTSTART", subject);
        return None;
    };

    let explicit_end = find(component, "DTEND").and_then(|p| read_datetime(p, default_zone)).or_else(|| {
        find(component, "DURATION")
            .and_then(|p| p.value.as_deref())
            .and_then(|v| parse_ical_duration(v).map_err(|e| debug!("'{}': {}", subject, e)).ok())
            .map(|duration| start + duration)
    });

    let recurrence_rule = find(component, "RRULE").and_then(|p| p.value.clone()).filter(|r| !r.trim().is_empty());

    let event = RawEvent {
        uid,
        end: explicit_end.unwrap_or(start),
        start,
        time_zone,
        recurrence_rule,
        overrides: BTreeMap::new(),
        exception_dates: exception_days(component, default_zone),
        organizer: find(component, "ORGANIZER").map(raw_participant),
        attendees: attendees(component),
        subject,
    };
    Some(ParsedEvent { event, recurrence_id, has_explicit_end: explicit_end.is_some() })
}

fn find<'a>(component: &'a IcalEvent, name: &str) -> Option<&'a Property> {
    component.properties.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

fn param<'a>(property: &'a Property, name: &str) -> Option<&'a str> {
    property
        .params
        .as_ref()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(String::as_str)
}

fn zone_of(property: &Property, default_zone: Tz) -> Tz {
    resolve_zone(param(property, "TZID"), default_zone)
}

fn read_datetime(property: &Property, default_zone: Tz) -> Option<DateTime<Utc>> {
    let value = property.value.as_deref()?;
    parse_ical_datetime(value, zone_of(property, default_zone))
        .map_err(|e| warn!("Ignoring {}: {}", property.name, e))
        .ok()
}

/// EXDATE may repeat and may list several comma-separated values.
fn exception_days(component: &IcalEvent, default_zone: Tz) -> BTreeSet<CalendarDay> {
    component
        .properties
        .iter()
        .filter(|p| p.name.eq_ignore_ascii_case("EXDATE"))
        .flat_map(|p| {
            let zone = zone_of(p, default_zone);
            p.value
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .filter(|v| !v.trim().is_empty())
                .filter_map(move |v| {
                    parse_ical_datetime(v, zone).map_err(|e| warn!("Ignoring EXDATE: {}", e)).ok()
                })
                .collect::<Vec<_>>()
        })
        .map(CalendarDay::truncate)
        .collect()
}

fn raw_participant(property: &Property) -> RawParticipant {
    RawParticipant { common_name: param(property, "CN").map(unescape_text), value: property.value.clone() }
}

fn attendees(component: &IcalEvent) -> Option<Participants> {
    let mut list: Vec<RawParticipant> = component
        .properties
        .iter()
        .filter(|p| p.name.eq_ignore_ascii_case("ATTENDEE"))
        .map(raw_participant)
        .collect();
    match list.len() {
        0 => None,
        1 => list.pop().map(Participants::One),
        _ => Some(Participants::Many(list)),
    }
}

/// Undoes RFC 5545 TEXT escaping.
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
