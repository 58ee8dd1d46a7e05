//! Relevance-ranked contact search.

mod engine;
mod guard;
mod session;

pub use engine::{RankedContact, SearchEngine, NUMBER_MATCH_WEIGHT, RECENT_SCAN_FACTOR};
pub use guard::{should_publish, CancelToken, RequestTracker};
pub use session::{SearchOutcome, SearchSession, SearchTicket};

use serde::{Deserialize, Serialize};

/// One name-matching pass. Passes run in declaration order; a contact keeps
/// the weight of the best pass that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPass {
    /// Whole name equals the query.
    Exact,
    /// Name starts with the query.
    Prefix,
    /// Query appears anywhere in the name.
    Substring,
    /// Query appears as an inner word, space on both sides.
    WordBoundary,
}

impl MatchPass {
    pub const ALL: [MatchPass; 4] = [
        MatchPass::Exact,
        MatchPass::Prefix,
        MatchPass::Substring,
        MatchPass::WordBoundary,
    ];

    pub const fn weight(self) -> u8 {
        match self {
            MatchPass::Exact => 100,
            MatchPass::Prefix => 80,
            MatchPass::Substring => 60,
            MatchPass::WordBoundary => 40,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MatchPass::Exact => "exact",
            MatchPass::Prefix => "prefix",
            MatchPass::Substring => "substring",
            MatchPass::WordBoundary => "word_boundary",
        }
    }

    /// Case-insensitive reference predicate for providers that match in memory.
    pub fn matches(self, name: &str, query: &str) -> bool {
        let name = name.to_lowercase();
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return false;
        }
        match self {
            MatchPass::Exact => name == query,
            MatchPass::Prefix => name.starts_with(&query),
            MatchPass::Substring => name.contains(&query),
            MatchPass::WordBoundary => name.contains(&format!(" {query} ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MatchPass;

    #[test]
    fn weights_descend_with_precedence() {
        let weights: Vec<u8> = MatchPass::ALL.iter().map(|pass| pass.weight()).collect();
        assert_eq!(weights, vec![100, 80, 60, 40]);
    }

    #[test]
    fn matches_is_case_insensitive() {
        assert!(MatchPass::Exact.matches("Alex", "ALEX"));
        assert!(!MatchPass::Exact.matches("Alex Kim", "alex"));
        assert!(MatchPass::Prefix.matches("Alex Kim", "al"));
        assert!(MatchPass::Substring.matches("Sam Alexander", "xand"));
        assert!(!MatchPass::Prefix.matches("Sam Alexander", "xand"));
    }

    #[test]
    fn word_boundary_needs_surrounding_spaces() {
        assert!(MatchPass::WordBoundary.matches("Sam Alex Ford", "alex"));
        assert!(!MatchPass::WordBoundary.matches("Alex Ford", "alex"));
        assert!(!MatchPass::WordBoundary.matches("Sam Alexander Ford", "alex"));
    }

    #[test]
    fn blank_query_matches_nothing() {
        for pass in MatchPass::ALL {
            assert!(!pass.matches("Alex", "  "));
        }
    }
}
