//! Boundary to the device-local contact and call-log provider.

mod memory;

pub use memory::MemoryProvider;

use crate::domain::CallType;
use crate::search::MatchPass;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("provider error: {0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// One phone number of one provider contact. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderRow {
    pub contact_id: Option<String>,
    pub display_name: Option<String>,
    pub number: Option<String>,
}

impl ProviderRow {
    pub fn new(contact_id: &str, display_name: &str, number: &str) -> Self {
        Self {
            contact_id: Some(contact_id.to_string()),
            display_name: Some(display_name.to_string()),
            number: Some(number.to_string()),
        }
    }

    /// `(id, name, number)` when every field is present and non-blank.
    pub fn fields(&self) -> Option<(&str, &str, &str)> {
        let id = non_blank(self.contact_id.as_deref())?;
        let name = non_blank(self.display_name.as_deref())?;
        let number = non_blank(self.number.as_deref())?;
        Some((id, name, number))
    }
}

/// One call-log entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLogRow {
    pub number: Option<String>,
    pub cached_name: Option<String>,
    pub timestamp_millis: Option<i64>,
    pub call_type: Option<CallType>,
}

impl CallLogRow {
    pub fn new(number: &str, timestamp_millis: i64, call_type: CallType) -> Self {
        Self {
            number: Some(number.to_string()),
            cached_name: None,
            timestamp_millis: Some(timestamp_millis),
            call_type: Some(call_type),
        }
    }

    pub fn with_cached_name(mut self, name: &str) -> Self {
        self.cached_name = Some(name.to_string());
        self
    }
}

pub trait ContactProvider {
    /// Rows whose display name satisfies `pass` for `query`.
    fn name_matches(&self, pass: MatchPass, query: &str) -> Result<Vec<ProviderRow>>;
    /// Rows whose number is the same line as `number`.
    fn number_matches(&self, number: &str) -> Result<Vec<ProviderRow>>;
    /// Every row of one contact.
    fn contact_rows(&self, contact_id: &str) -> Result<Vec<ProviderRow>>;
    fn favorites(&self) -> Result<Vec<ProviderRow>>;
    fn roster(&self) -> Result<Vec<ProviderRow>>;
    /// Newest first.
    fn recent_calls(&self, limit: usize) -> Result<Vec<CallLogRow>>;
    fn photo_uri(&self, contact_id: &str) -> Option<String>;
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::ProviderRow;

    #[test]
    fn fields_require_every_value() {
        let row = ProviderRow::new("42", "Alex Kim", "+15550101");
        assert_eq!(row.fields(), Some(("42", "Alex Kim", "+15550101")));

        let missing = ProviderRow {
            number: None,
            ..row.clone()
        };
        assert!(missing.fields().is_none());

        let blank = ProviderRow {
            display_name: Some("  ".to_string()),
            ..row
        };
        assert!(blank.fields().is_none());
    }
}
