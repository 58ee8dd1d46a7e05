use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Missed,
    Rejected,
    Incoming,
    Outgoing,
}

impl CallType {
    pub const fn as_str(self) -> &'static str {
        match self {
            CallType::Missed => "missed",
            CallType::Rejected => "rejected",
            CallType::Incoming => "incoming",
            CallType::Outgoing => "outgoing",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "missed" => Some(CallType::Missed),
            "rejected" => Some(CallType::Rejected),
            "incoming" => Some(CallType::Incoming),
            "outgoing" => Some(CallType::Outgoing),
            _ => None,
        }
    }

    pub const fn all() -> &'static [CallType] {
        &[
            CallType::Missed,
            CallType::Rejected,
            CallType::Incoming,
            CallType::Outgoing,
        ]
    }
}

/// Call-log evidence attached to a contact surfaced from recent calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_type: CallType,
    pub timestamp_millis: i64,
}

#[cfg(test)]
mod tests {
    use super::CallType;

    #[test]
    fn parse_round_trip() {
        for call_type in CallType::all() {
            let parsed = CallType::parse(call_type.as_str()).expect("parse call type");
            assert_eq!(*call_type, parsed);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(CallType::parse(" Missed "), Some(CallType::Missed));
        assert!(CallType::parse("voicemail").is_none());
    }
}
