//! Expand, classify and project, as one callable pass.

use crate::calendar::{resolve_all, Occurrence, RawEvent};
use crate::config::Settings;
use crate::organization::classify;
use crate::report::{project, OutputRecord};
use log::{debug, info};

/// Everything one pass produces: all resolved occurrences (for the debug
/// dump) and the rows of the ones attributed to an organization.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub occurrences: Vec<Occurrence>,
    pub records: Vec<OutputRecord>,
}

/// Runs the pure part of the pipeline. Row order is discovery order: raw
/// event order, then candidate order within each series.
pub fn analyze(events: &[RawEvent], settings: &Settings) -> Analysis {
    let occurrences = resolve_all(events, &settings.window);
    info!("Resolved {} occurrences from {} events", occurrences.len(), events.len());

    let records: Vec<OutputRecord> = occurrences
        .iter()
        .filter_map(|occurrence| {
            let organization = classify(occurrence, &settings.organizations);
            if organization.is_none() {
                debug!("No organization for '{}' at {}", occurrence.subject, occurrence.start());
            }
            organization.map(|org| project(occurrence, Some(org), &settings.skip_emails, settings.timezone))
        })
        .collect();

    Analysis { occurrences, records }
}
