//! Calendar model, import, and occurrence expansion.
//
// Raw events come in through `calendar_import`, get expanded against the
// analysis window in `calendar_occurrences`, and carry their participants
// through `calendar_participants`.

use std::path::PathBuf;

mod calendar_datetime;
mod calendar_import;
mod calendar_occurrences;
mod calendar_participants;
mod calendar_recurrence;
mod calendar_types;

pub use calendar_datetime::*;
pub use calendar_import::*;
pub use calendar_occurrences::*;
pub use calendar_participants::*;
pub use calendar_recurrence::*;
pub use calendar_types::*;

/// Custom error type for calendar operations
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid iCalendar data: {0}")]
    Parse(String),
    #[error("Invalid date/time format: {0}")]
    InvalidDateTime(String),
    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrenceRule(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("CSV output failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl CalendarError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CalendarError::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, CalendarError>;
