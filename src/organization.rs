//! Attribution of occurrences to configured organizations.

use crate::calendar::{EventParticipants, Occurrence};
use regex::Regex;

/// One configured organization. Either filter may be absent; a rule with
/// neither never matches.
#[derive(Debug, Clone)]
pub struct OrganizationRule {
    pub name: String,
    pub email_filter: Option<Regex>,
    pub name_filter: Option<Regex>,
}

impl OrganizationRule {
    pub fn new(name: impl Into<String>, email_filter: Option<Regex>, name_filter: Option<Regex>) -> Self {
        Self { name: name.into(), email_filter, name_filter }
    }

    /// True if the organizer or any attendee has a non-empty email matching
    /// `email_filter` or a non-empty name matching `name_filter`.
    pub fn matches(&self, participants: &EventParticipants) -> bool {
        participants.iter().any(|individual| {
            let email_hit = self
                .email_filter
                .as_ref()
                .is_some_and(|re| !individual.email.is_empty() && re.is_match(&individual.email));
            let name_hit = self
                .name_filter
                .as_ref()
                .is_some_and(|re| !individual.name.is_empty() && re.is_match(&individual.name));
            email_hit || name_hit
        })
    }
}

/// Name of the first rule, in configured order, that matches the
/// occurrence's participants.
pub fn classify<'a>(occurrence: &Occurrence, rules: &'a [OrganizationRule]) -> Option<&'a str> {
    if occurrence.participants.is_empty() {
        return None;
    }
    rules.iter().find(|rule| rule.matches(&occurrence.participants)).map(|rule| rule.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{EventDuration, Individual};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn person(name: &str, email: &str) -> Individual {
        Individual { name: name.into(), email: email.into() }
    }

    fn occurrence(organizer: Option<Individual>, attendees: Option<Vec<Individual>>) -> Occurrence {
        let start = Utc.with_ymd_and_hms(2021, 4, 5, 9, 0, 0).unwrap();
        Occurrence::new(
            "Sync",
            start,
            EventDuration::between(start, start),
            false,
            EventParticipants { organizer, attendees },
        )
    }

    fn rules() -> Vec<OrganizationRule> {
        vec![
            OrganizationRule::new("Company1", Regex::new("company1.com").ok(), None),
            OrganizationRule::new("Customer2", Regex::new("customer2.com").ok(), None),
            OrganizationRule::new("Microsoft", Regex::new("microsoft.com").ok(), None),
            OrganizationRule::new("Apple Computer", Regex::new("apple").ok(), None),
        ]
    }

    #[test]
    fn test_first_rule_in_order_wins() {
        let o = occurrence(
            Some(person("Ann", "ann@company1.com")),
            Some(vec![person("Satya", "satya@microsoft.com")]),
        );
        assert_eq!(classify(&o, &rules()), Some("Company1"));
    }

    #[test]
    fn test_rule_order_not_participant_order_decides() {
        let o = occurrence(
            Some(person("Satya", "satya@microsoft.com")),
            Some(vec![person("Cleo", "cleo@customer2.com")]),
        );
        assert_eq!(classify(&o, &rules()), Some("Customer2"));
    }

    #[test]
    fn test_attendee_alone_can_match() {
        let o = occurrence(None, Some(vec![person("Me", "me@apple.com")]));
        assert_eq!(classify(&o, &rules()), Some("Apple Computer"));
    }

    #[test]
    fn test_name_filter() {
        let rules = vec![OrganizationRule::new("Board", None, Regex::new("(?i)director").ok())];
        let o = occurrence(Some(person("Managing Director", "md@else.com")), None);
        assert_eq!(classify(&o, &rules), Some("Board"));
    }

    #[test]
    fn test_no_participants_never_matches() {
        let catch_all = vec![OrganizationRule::new("Anyone", Regex::new(".*").ok(), Regex::new(".*").ok())];
        assert_eq!(classify(&occurrence(None, None), &catch_all), None);
        assert_eq!(classify(&occurrence(None, Some(vec![])), &catch_all), None);
    }

    #[test]
    fn test_no_match() {
        let o = occurrence(Some(person("Zed", "zed@elsewhere.org")), None);
        assert_eq!(classify(&o, &rules()), None);
    }

    #[test]
    fn test_rule_without_filters_never_matches() {
        let rules = vec![OrganizationRule::new("Empty", None, None)];
        let o = occurrence(Some(person("Ann", "ann@company1.com")), None);
        assert_eq!(classify(&o, &rules), None);
    }
}
