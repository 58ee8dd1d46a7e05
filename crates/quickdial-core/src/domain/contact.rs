use crate::domain::call::CallRecord;
use crate::domain::ids::ContactId;
use crate::error::CoreError;
use crate::phone;
use serde::{Deserialize, Serialize};

/// A person reachable by phone. Values are never edited in place; the
/// `with_*`/`renamed` helpers return a replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    /// Distinct by normalized form, in discovery order.
    pub phone_numbers: Vec<String>,
    /// Primary number, always a member of `phone_numbers`.
    pub phone_number: String,
    pub photo_uri: Option<String>,
    pub last_call: Option<CallRecord>,
}

impl Contact {
    pub fn new(id: ContactId, name: &str, number: &str) -> Self {
        let name = normalize_display_name(name).unwrap_or_default();
        Self {
            id,
            name,
            phone_numbers: vec![number.to_string()],
            phone_number: number.to_string(),
            photo_uri: None,
            last_call: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.id.is_blank() {
            return Err(CoreError::EmptyContactId);
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::EmptyDisplayName);
        }
        if self.phone_numbers.is_empty() {
            return Err(CoreError::NoPhoneNumbers);
        }
        if let Some(bad) = self
            .phone_numbers
            .iter()
            .chain(std::iter::once(&self.phone_number))
            .find(|number| !phone::is_valid(number))
        {
            return Err(CoreError::InvalidPhoneNumber(bad.clone()));
        }
        if !self.phone_numbers.contains(&self.phone_number) {
            return Err(CoreError::PrimaryNotMember(self.phone_number.clone()));
        }
        Ok(())
    }

    /// The stored spelling of `raw` if this contact already has that line.
    pub fn find_number(&self, raw: &str) -> Option<&str> {
        let key = phone::normalize(raw);
        if key.is_empty() {
            return None;
        }
        self.phone_numbers
            .iter()
            .find(|number| phone::normalize(number) == key)
            .map(String::as_str)
    }

    pub fn has_number(&self, raw: &str) -> bool {
        self.find_number(raw).is_some()
    }

    /// Selects another of the contact's numbers as primary.
    pub fn with_primary_number(&self, raw: &str) -> Result<Contact, CoreError> {
        let number = self
            .find_number(raw)
            .ok_or_else(|| CoreError::PrimaryNotMember(raw.to_string()))?
            .to_string();
        Ok(Contact {
            phone_number: number,
            ..self.clone()
        })
    }

    pub fn renamed(&self, name: &str) -> Result<Contact, CoreError> {
        let name = normalize_display_name(name).ok_or(CoreError::EmptyDisplayName)?;
        Ok(Contact {
            name,
            ..self.clone()
        })
    }

    /// Appends `raw` unless a number on the same line is already present.
    /// Returns `None` when nothing would change.
    pub fn with_number(&self, raw: &str) -> Option<Contact> {
        if self.has_number(raw) {
            return None;
        }
        let mut phone_numbers = self.phone_numbers.clone();
        phone_numbers.push(raw.to_string());
        Some(Contact {
            phone_numbers,
            ..self.clone()
        })
    }
}

/// Trims and collapses internal whitespace runs to one space.
pub fn normalize_display_name(raw: &str) -> Option<String> {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_display_name, Contact};
    use crate::domain::ContactId;
    use crate::error::CoreError;

    fn alex() -> Contact {
        let contact = Contact::new(ContactId::new("42"), "Alex Kim", "+15550101");
        contact.with_number("(415) 555-1212").expect("second number")
    }

    #[test]
    fn normalize_display_name_collapses_whitespace() {
        assert_eq!(
            normalize_display_name("  Alex \t  Kim \n").as_deref(),
            Some("Alex Kim")
        );
        assert!(normalize_display_name(" \t ").is_none());
    }

    #[test]
    fn validate_accepts_well_formed_contact() {
        assert!(alex().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let mut contact = alex();
        contact.name = "  ".to_string();
        assert_eq!(contact.validate(), Err(CoreError::EmptyDisplayName));

        let mut contact = alex();
        contact.id = ContactId::new(" ");
        assert_eq!(contact.validate(), Err(CoreError::EmptyContactId));
    }

    #[test]
    fn validate_rejects_primary_outside_numbers() {
        let mut contact = alex();
        contact.phone_number = "5559999".to_string();
        assert_eq!(
            contact.validate(),
            Err(CoreError::PrimaryNotMember("5559999".to_string()))
        );
    }

    #[test]
    fn with_number_skips_same_line() {
        let contact = alex();
        assert!(contact.with_number("555-0101").is_none());
        assert!(contact.with_number("+1 415 555 1212").is_none());
        let grown = contact.with_number("555-0199").expect("new line");
        assert_eq!(grown.phone_numbers.len(), 3);
        assert_eq!(contact.phone_numbers.len(), 2);
    }

    #[test]
    fn with_primary_number_uses_stored_spelling() {
        let contact = alex();
        let updated = contact.with_primary_number("4155551212").expect("member");
        assert_eq!(updated.phone_number, "(415) 555-1212");
        assert_eq!(contact.phone_number, "+15550101");
        assert!(contact.with_primary_number("5559999").is_err());
    }

    #[test]
    fn renamed_normalizes_and_rejects_blank() {
        let contact = alex();
        assert_eq!(contact.renamed(" Alexandra   Kim ").unwrap().name, "Alexandra Kim");
        assert_eq!(contact.renamed(""), Err(CoreError::EmptyDisplayName));
    }
}
