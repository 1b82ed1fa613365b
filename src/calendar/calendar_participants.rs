//! Organizer/attendee normalization.
//
// The raw fields arrive as whatever shape the source used; everything past
// this module only sees `EventParticipants`.

use crate::calendar::calendar_types::{EventParticipants, Individual, Participants, RawParticipant};
use log::debug;

const MAILTO_PREFIX: &str = "mailto:";

impl Individual {
    /// Builds an individual from a raw display name and email URI.
    pub fn new(name: &str, email_uri: &str) -> Self {
        Self { name: clean_display_name(name), email: strip_mailto(email_uri) }
    }
}

fn clean_display_name(name: &str) -> String {
    match name.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"').unwrap_or(rest).to_string(),
        None => name.to_string(),
    }
}

fn strip_mailto(email_uri: &str) -> String {
    if email_uri.len() >= MAILTO_PREFIX.len()
        && email_uri.is_char_boundary(MAILTO_PREFIX.len())
        && email_uri[..MAILTO_PREFIX.len()].eq_ignore_ascii_case(MAILTO_PREFIX)
    {
        email_uri[MAILTO_PREFIX.len()..].to_string()
    } else {
        email_uri.to_string()
    }
}

/// Normalizes one raw record. A record without a value carries no address
/// and is dropped; a missing display name becomes empty.
pub fn normalize_participant(raw: &RawParticipant) -> Option<Individual> {
    let Some(value) = raw.value.as_deref() else {
        debug!("Dropping participant without a value: {:?}", raw);
        return None;
    };
    Some(Individual::new(raw.common_name.as_deref().unwrap_or_default(), value))
}

/// Resolves organizer and attendee fields into a canonical participant list.
pub fn extract_participants(
    organizer: Option<&RawParticipant>,
    attendees: Option<&Participants>,
) -> EventParticipants {
    EventParticipants {
        organizer: organizer.and_then(normalize_participant),
        attendees: attendees
            .map(|field| field.as_slice().iter().filter_map(normalize_participant).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("\"Jane Doe\"", "Jane Doe" ; "quoted name")]
    #[test_case("Jane Doe", "Jane Doe" ; "bare name")]
    #[test_case("\"Jane", "Jane" ; "unbalanced quote")]
    #[test_case("", "" ; "empty name")]
    fn test_display_name_cleaning(raw: &str, expected: &str) {
        assert_eq!(Individual::new(raw, "x@y.com").name, expected);
    }

    #[test_case("mailto:jane@company1.com", "jane@company1.com" ; "lowercase scheme")]
    #[test_case("MAILTO:jane@company1.com", "jane@company1.com" ; "uppercase scheme")]
    #[test_case("jane@company1.com", "jane@company1.com" ; "no scheme")]
    fn test_mailto_stripping(raw: &str, expected: &str) {
        assert_eq!(Individual::new("Jane", raw).email, expected);
    }

    #[test]
    fn test_single_attendee_becomes_one_element_list() {
        let attendee = Participants::One(RawParticipant::new("Bob", "mailto:bob@x.com"));
        let participants = extract_participants(None, Some(&attendee));
        assert_eq!(
            participants.attendees,
            Some(vec![Individual { name: "Bob".into(), email: "bob@x.com".into() }])
        );
        assert_eq!(participants.organizer, None);
    }

    #[test]
    fn test_attendee_list_normalizes_elementwise() {
        let attendees = Participants::Many(vec![
            RawParticipant::new("\"Ann\"", "mailto:ann@x.com"),
            RawParticipant::new("Ben", "mailto:ben@y.com"),
        ]);
        let organizer = RawParticipant::new("Org", "mailto:org@z.com");
        let participants = extract_participants(Some(&organizer), Some(&attendees));
        let names: Vec<_> = participants.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Org", "Ann", "Ben"]);
    }

    #[test]
    fn test_missing_attendee_field_differs_from_empty_list() {
        let absent = extract_participants(None, None);
        assert_eq!(absent.attendees, None);

        let empty = Participants::Many(Vec::new());
        let present = extract_participants(None, Some(&empty));
        assert_eq!(present.attendees, Some(Vec::new()));
    }

    #[test]
    fn test_record_without_value_is_dropped() {
        let raw = RawParticipant { common_name: Some("Ghost".into()), value: None };
        assert_eq!(normalize_participant(&raw), None);

        let nameless = RawParticipant { common_name: None, value: Some("mailto:a@b.com".into()) };
        assert_eq!(
            normalize_participant(&nameless),
            Some(Individual { name: String::new(), email: "a@b.com".into() })
        );
    }
}
