//! SQL fragments for the four name-match passes.
//!
//! Passes compare the lowercased query against `c.name_folded` and bind
//! exactly one parameter, `?1`.

use crate::repo::fold_name;
use quickdial_core::MatchPass;

const LIKE_ESCAPE: char = '\\';

/// `WHERE` clause for `pass`.
pub fn name_clause(pass: MatchPass) -> &'static str {
    match pass {
        MatchPass::Exact => "c.name_folded = ?1",
        MatchPass::Prefix | MatchPass::Substring | MatchPass::WordBoundary => {
            "c.name_folded LIKE ?1 ESCAPE '\\'"
        }
    }
}

/// Bound value for `pass` and an already trimmed `query`.
pub fn name_param(pass: MatchPass, query: &str) -> String {
    let folded = fold_name(query);
    match pass {
        MatchPass::Exact => folded,
        MatchPass::Prefix => format!("{}%", escape_like(&folded)),
        MatchPass::Substring => format!("%{}%", escape_like(&folded)),
        MatchPass::WordBoundary => format!("% {} %", escape_like(&folded)),
    }
}

/// Escapes `LIKE` wildcards so the query matches literally.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(ch);
    }
    out
}
