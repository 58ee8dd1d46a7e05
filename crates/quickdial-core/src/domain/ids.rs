use crate::phone;
use serde::{Deserialize, Serialize};
use std::fmt;

const CALL_HISTORY_PREFIX: &str = "call_history_";
const SEARCH_NUMBER_PREFIX: &str = "search_number_";

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Provider-stable contact identifier, or a synthesized one for records the
/// provider does not know about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Id for a call-log entry with no matching provider contact. Stable for
    /// every spelling of the same line.
    pub fn call_history(number: &str) -> Self {
        let key = phone::normalize(number);
        Self(format!("{CALL_HISTORY_PREFIX}{:016x}", fnv1a(key.as_bytes())))
    }

    /// Id for the placeholder offered when a digit query matched nobody.
    pub fn search_number(query: &str) -> Self {
        Self(format!("{SEARCH_NUMBER_PREFIX}{}", query.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn is_synthesized(&self) -> bool {
        self.0.starts_with(CALL_HISTORY_PREFIX) || self.0.starts_with(SEARCH_NUMBER_PREFIX)
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContactId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::ContactId;

    #[test]
    fn call_history_id_is_stable_across_spellings() {
        let a = ContactId::call_history("+1 (415) 555-1212");
        let b = ContactId::call_history("415.555.1212");
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("call_history_"));
        assert!(a.is_synthesized());
    }

    #[test]
    fn call_history_id_differs_per_line() {
        assert_ne!(
            ContactId::call_history("4155551212"),
            ContactId::call_history("4155551213")
        );
    }

    #[test]
    fn search_number_id_embeds_query() {
        let id = ContactId::search_number(" 1234567 ");
        assert_eq!(id.as_str(), "search_number_1234567");
        assert!(id.is_synthesized());
        assert!(!ContactId::new("42").is_synthesized());
    }
}
