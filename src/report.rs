//! Output rows and the CSV / debug JSON writers.

use crate::calendar::{CalendarError, Occurrence, Result};
use chrono_tz::Tz;
use log::info;
use serde::{Serialize, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const RECURRING_LABEL: &str = "Recurring";
pub const UNCLASSIFIED_LABEL: &str = "?";
pub const START_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One CSV row. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    #[serde(rename = "Organization")]
    pub organization: String,
    #[serde(rename = "Recurrence")]
    pub recurrence: String,
    #[serde(rename = "Start")]
    pub start: String,
    #[serde(rename = "Duration (Minutes)", serialize_with = "serialize_minutes")]
    pub duration_minutes: f64,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Organizer")]
    pub organizer: String,
    #[serde(rename = "Attendees")]
    pub attendees: String,
}

/// Whole minutes print without a fractional part (`30`, `22.5`).
fn serialize_minutes<S: Serializer>(minutes: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&minutes.to_string())
}

/// Projects a classified occurrence into its output row. Attendees whose
/// email is on `skip_emails` are left out of the attendee column only.
pub fn project(
    occurrence: &Occurrence,
    organization: Option<&str>,
    skip_emails: &[String],
    display_zone: Tz,
) -> OutputRecord {
    let participants = &occurrence.participants;
    OutputRecord {
        organization: organization.unwrap_or(UNCLASSIFIED_LABEL).to_string(),
        recurrence: if occurrence.is_recurring { RECURRING_LABEL.to_string() } else { String::new() },
        start: occurrence.start().with_timezone(&display_zone).format(START_FORMAT).to_string(),
        duration_minutes: occurrence.duration().minutes(),
        subject: occurrence.subject.clone(),
        organizer: participants.organizer.as_ref().map(|o| o.name.clone()).unwrap_or_default(),
        attendees: participants
            .attendees
            .as_ref()
            .map(|list| {
                list.iter()
                    .filter(|a| !skip_emails.iter().any(|skip| *skip == a.email))
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default(),
    }
}

/// Writes the header and one row per record. The writer quotes any field
/// holding a comma, quote or line break.
pub fn write_csv<W: Write>(writer: W, records: &[OutputRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if records.is_empty() {
        csv.write_record(["Organization", "Recurrence", "Start", "Duration (Minutes)", "Subject", "Organizer", "Attendees"])?;
    }
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush().map_err(|e| CalendarError::Csv(e.into()))?;
    Ok(())
}

pub fn write_csv_file(path: &Path, records: &[OutputRecord]) -> Result<()> {
    let file = File::create(path).map_err(|e| CalendarError::io(path, e))?;
    write_csv(BufWriter::new(file), records)?;
    info!("Saved {} CSV entries in {}", records.len(), path.display());
    Ok(())
}

/// Pretty-printed dump of every resolved occurrence, before filtering.
pub fn write_debug_json<W: Write>(writer: W, occurrences: &[Occurrence]) -> Result<()> {
    serde_json::to_writer_pretty(writer, occurrences)?;
    Ok(())
}

pub fn write_debug_json_file(path: &Path, occurrences: &[Occurrence]) -> Result<()> {
    let file = File::create(path).map_err(|e| CalendarError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_debug_json(&mut writer, occurrences)?;
    writer.flush().map_err(|e| CalendarError::io(path, e))?;
    info!("Saved occurrence debug JSON in {}", path.display());
    Ok(())
}
