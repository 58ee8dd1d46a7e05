use crate::domain::{normalize_display_name, Contact};
use crate::phone;
use std::collections::HashSet;

pub fn validate(contact: &Contact) -> bool {
    contact.validate().is_ok()
}

/// Drops invalid and same-line duplicate numbers and normalizes the name.
///
/// A record that cannot be repaired (blank id or name, no valid number left)
/// is discarded as a whole. The first surviving number becomes the primary;
/// callers that selected another line reapply it with
/// [`Contact::with_primary_number`].
pub fn sanitize(contact: Contact) -> Option<Contact> {
    if contact.id.is_blank() {
        return None;
    }
    let name = normalize_display_name(&contact.name)?;

    let mut seen = HashSet::new();
    let phone_numbers: Vec<String> = contact
        .phone_numbers
        .iter()
        .map(|number| number.trim())
        .filter(|number| phone::is_valid(number))
        .filter(|number| seen.insert(phone::normalize(number)))
        .map(str::to_string)
        .collect();

    let phone_number = phone_numbers.first()?.clone();

    Some(Contact {
        name,
        phone_numbers,
        phone_number,
        ..contact
    })
}

/// Folds `other` into `base` (same id): numbers are unioned by normalized
/// form, `base` wins for every other field it has.
pub fn merge_same_id(base: Contact, other: Contact) -> Contact {
    debug_assert_eq!(base.id, other.id);
    let mut merged = base;
    for number in &other.phone_numbers {
        if let Some(grown) = merged.with_number(number) {
            merged = grown;
        }
    }
    if merged.photo_uri.is_none() {
        merged.photo_uri = other.photo_uri;
    }
    if merged.last_call.is_none() {
        merged.last_call = other.last_call;
    }
    merged
}
