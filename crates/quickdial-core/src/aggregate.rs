//! Folds per-number provider rows into one contact per provider id.

use crate::domain::{Contact, ContactId};
use crate::phone;
use crate::provider::ProviderRow;
use crate::rules::validation;
use std::collections::HashMap;
use tracing::trace;

/// Aggregation state for one scan. Output keeps first-discovery order.
#[derive(Debug, Default)]
pub struct ContactAggregator {
    contacts: Vec<Contact>,
    index: HashMap<ContactId, usize>,
    skipped: usize,
}

impl ContactAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one row. `photo` runs only the first time a provider id shows up.
    ///
    /// Returns the id of the contact the row belongs to, including when the
    /// row only repeated a number that was already known. Malformed rows and
    /// rejected updates return `None` and leave the state untouched.
    pub fn push<F>(&mut self, row: &ProviderRow, photo: F) -> Option<ContactId>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let Some((id, name, number)) = row.fields() else {
            trace!(?row, "skipping provider row with missing fields");
            self.skipped += 1;
            return None;
        };
        if !phone::is_valid(number) {
            trace!(contact_id = id, number, "skipping provider row with invalid number");
            self.skipped += 1;
            return None;
        }

        let id = ContactId::new(id);
        match self.index.get(&id) {
            Some(&slot) => {
                let Some(updated) = self.contacts[slot].with_number(number) else {
                    trace!(contact_id = %id, number, "duplicate number");
                    return Some(id);
                };
                if !validation::validate(&updated) {
                    self.skipped += 1;
                    return None;
                }
                self.contacts[slot] = updated;
            }
            None => {
                let mut contact = Contact::new(id.clone(), name, number);
                contact.photo_uri = photo(id.as_str());
                if !validation::validate(&contact) {
                    self.skipped += 1;
                    return None;
                }
                self.index.insert(id.clone(), self.contacts.len());
                self.contacts.push(contact);
            }
        }
        Some(id)
    }

    pub fn extend<I, F>(&mut self, rows: I, photo: F)
    where
        I: IntoIterator<Item = ProviderRow>,
        F: Fn(&str) -> Option<String>,
    {
        for row in rows {
            self.push(&row, &photo);
        }
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Rows dropped as malformed so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn finish(self) -> Vec<Contact> {
        self.contacts
            .into_iter()
            .filter_map(validation::sanitize)
            .collect()
    }
}

/// Aggregates a whole scan in one call.
pub fn aggregate<I, F>(rows: I, photo: F) -> Vec<Contact>
where
    I: IntoIterator<Item = ProviderRow>,
    F: Fn(&str) -> Option<String>,
{
    let mut aggregator = ContactAggregator::new();
    aggregator.extend(rows, photo);
    aggregator.finish()
}
