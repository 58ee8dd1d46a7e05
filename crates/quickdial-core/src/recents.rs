//! Recent-call surfacing from call-log rows.

use crate::domain::{normalize_display_name, CallRecord, Contact, ContactId};
use crate::phone;
use crate::provider::CallLogRow;
use crate::rules::validation;
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Turns call-log rows into at most `limit` contacts, newest call first.
///
/// Each line and each contact appears once, carrying its newest call. Calls
/// on several lines of one contact fold into a single entry whose primary is
/// the most recently called line. Numbers held by any `excluded` contact are
/// left out. `lookup` resolves a number to its whole provider contact;
/// unknown numbers get a synthesized `call_history_…` contact named after the
/// cached name or the number.
pub fn collect_recent_calls<I, L>(
    rows: I,
    mut lookup: L,
    excluded: &[Contact],
    limit: usize,
) -> Vec<Contact>
where
    I: IntoIterator<Item = CallLogRow>,
    L: FnMut(&str) -> Option<Contact>,
{
    let excluded_lines: HashSet<String> = excluded
        .iter()
        .flat_map(|contact| contact.phone_numbers.iter())
        .map(|number| phone::normalize(number))
        .collect();

    let mut rows: Vec<CallLogRow> = rows.into_iter().collect();
    rows.sort_by_key(|row| std::cmp::Reverse(row.timestamp_millis));

    let mut seen_lines = HashSet::new();
    let mut slots: HashMap<ContactId, usize> = HashMap::new();
    let mut out: Vec<Contact> = Vec::new();

    for row in rows {
        if out.len() >= limit {
            break;
        }
        let (Some(number), Some(timestamp_millis), Some(call_type)) =
            (row.number.as_deref(), row.timestamp_millis, row.call_type)
        else {
            trace!(?row, "skipping call-log row with missing fields");
            continue;
        };
        let number = number.trim();
        if !phone::is_valid(number) {
            trace!(number, "skipping call-log row with invalid number");
            continue;
        }

        let line = phone::normalize(number);
        if excluded_lines.contains(&line) || !seen_lines.insert(line) {
            continue;
        }

        let contact = lookup(number).unwrap_or_else(|| {
            let name = row
                .cached_name
                .as_deref()
                .and_then(normalize_display_name)
                .unwrap_or_else(|| phone::format(number));
            Contact::new(ContactId::call_history(number), &name, number)
        });
        let Some(contact) = validation::sanitize(Contact {
            last_call: Some(CallRecord {
                call_type,
                timestamp_millis,
            }),
            ..contact
        }) else {
            continue;
        };
        let contact = contact.with_primary_number(number).unwrap_or(contact);

        match slots.get(&contact.id) {
            // An older call on another line of a contact already listed.
            Some(&slot) => {
                let newer = out[slot].clone();
                out[slot] = validation::merge_same_id(newer, contact);
            }
            None => {
                slots.insert(contact.id.clone(), out.len());
                out.push(contact);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::collect_recent_calls;
    use crate::domain::{CallType, Contact, ContactId};
    use crate::provider::CallLogRow;

    fn alex() -> Contact {
        Contact::new(ContactId::new("42"), "Alex Kim", "+15550101")
            .with_number("(415) 555-1212")
            .unwrap()
    }

    fn lookup_alex(number: &str) -> Option<Contact> {
        let alex = alex();
        alex.has_number(number).then_some(alex)
    }

    #[test]
    fn unknown_numbers_get_synthesized_contacts() {
        let rows = vec![CallLogRow::new("555-0199", 1_000, CallType::Missed)];
        let recents = collect_recent_calls(rows, |_| None, &[], 10);
        assert_eq!(recents.len(), 1);
        assert_eq!(recents[0].id, ContactId::call_history("5550199"));
        assert_eq!(recents[0].name, "5550199");
        let call = recents[0].last_call.expect("call info");
        assert_eq!(call.call_type, CallType::Missed);
        assert_eq!(call.timestamp_millis, 1_000);
    }

    #[test]
    fn cached_name_is_preferred_over_number() {
        let rows = vec![CallLogRow::new("4155550000", 1, CallType::Incoming)
            .with_cached_name("  Dr.  Lee ")];
        let recents = collect_recent_calls(rows, |_| None, &[], 10);
        assert_eq!(recents[0].name, "Dr. Lee");
    }

    #[test]
    fn known_numbers_resolve_to_provider_contact() {
        let rows = vec![CallLogRow::new("4155551212", 5, CallType::Outgoing)];
        let recents = collect_recent_calls(rows, lookup_alex, &[], 10);
        assert_eq!(recents[0].id.as_str(), "42");
        assert_eq!(recents[0].phone_number, "(415) 555-1212");
    }

    #[test]
    fn newest_call_wins_per_line_and_contact() {
        let rows = vec![
            CallLogRow::new("555-0101", 10, CallType::Missed),
            CallLogRow::new("+15550101", 30, CallType::Incoming),
            CallLogRow::new("4155551212", 20, CallType::Outgoing),
        ];
        let recents = collect_recent_calls(rows, lookup_alex, &[], 10);
        assert_eq!(recents.len(), 1);
        let call = recents[0].last_call.unwrap();
        assert_eq!(call.timestamp_millis, 30);
        assert_eq!(call.call_type, CallType::Incoming);
    }

    #[test]
    fn calls_on_different_lines_fold_into_one_contact() {
        let by_line = |number: &str| {
            let id = ContactId::new("42");
            ["+15550101", "(415) 555-1212"]
                .into_iter()
                .find(|known| crate::phone::same_number(known, number))
                .map(|known| Contact::new(id, "Alex Kim", known))
        };
        let rows = vec![
            CallLogRow::new("4155551212", 20, CallType::Outgoing),
            CallLogRow::new("555-0101", 10, CallType::Missed),
            CallLogRow::new("5550150", 5, CallType::Missed),
        ];
        let recents = collect_recent_calls(rows, by_line, &[], 10);
        assert_eq!(recents.len(), 2);
        assert_eq!(recents[0].id.as_str(), "42");
        assert_eq!(
            recents[0].phone_numbers,
            vec!["(415) 555-1212".to_string(), "+15550101".to_string()]
        );
        assert_eq!(recents[0].phone_number, "(415) 555-1212");
        assert_eq!(recents[0].last_call.map(|call| call.timestamp_millis), Some(20));
    }

    #[test]
    fn excluded_contacts_are_not_surfaced() {
        let rows = vec![
            CallLogRow::new("555-0101", 10, CallType::Missed),
            CallLogRow::new("5550150", 5, CallType::Missed),
        ];
        let recents = collect_recent_calls(rows, |_| None, &[alex()], 10);
        assert_eq!(recents.len(), 1);
        assert_eq!(recents[0].phone_number, "5550150");
    }

    #[test]
    fn malformed_rows_are_skipped_and_limit_applies() {
        let rows = vec![
            CallLogRow::default(),
            CallLogRow {
                timestamp_millis: None,
                ..CallLogRow::new("5550101", 0, CallType::Missed)
            },
            CallLogRow::new("12", 9, CallType::Missed),
            CallLogRow::new("5550102", 8, CallType::Missed),
            CallLogRow::new("5550103", 7, CallType::Missed),
            CallLogRow::new("5550104", 6, CallType::Missed),
        ];
        let recents = collect_recent_calls(rows, |_| None, &[], 2);
        let numbers: Vec<&str> = recents.iter().map(|c| c.phone_number.as_str()).collect();
        assert_eq!(numbers, vec!["5550102", "5550103"]);
    }
}
