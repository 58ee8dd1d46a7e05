//! Phone number cleaning, comparison keys and presentation.
//!
//! Comparison is a best-effort heuristic tuned for North American numbers,
//! not full E.164 parsing: two raw strings denote the same line iff their
//! [`normalize`] keys are equal.

mod countries;

pub use countries::{country_for_prefix, is_known_country, DIALING_CODES};

use thiserror::Error;

/// Shortest accepted number (service codes such as `911`).
pub const MIN_DIGITS: usize = 3;
/// Longest accepted number (E.164 maximum).
pub const MAX_DIGITS: usize = 15;

const NATIONAL_DIGITS: usize = 10;
const LOCAL_DIGITS: usize = 7;
const MAX_PREFIX_DIGITS: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number has no digits")]
    Empty,
}

/// Strips everything except digits and a single leading `+`.
pub fn clean(raw: &str) -> Result<String, PhoneError> {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    if trimmed.starts_with('+') {
        out.push('+');
    }
    out.extend(trimmed.chars().filter(|ch| ch.is_ascii_digit()));

    if out.trim_start_matches('+').is_empty() {
        return Err(PhoneError::Empty);
    }
    Ok(out)
}

/// Digit-only comparison key.
///
/// Numbers longer than ten digits keep their last ten (drops the `1` trunk
/// of `+1 415 555 1212` as well as longer country prefixes). An eight digit
/// number starting with `1` is a trunk prefix on a seven digit local number
/// and loses the `1`. Everything else, including short service codes, passes
/// through unchanged.
pub fn normalize(raw: &str) -> String {
    let digits = digits_of(raw);
    let len = digits.len();

    if len > NATIONAL_DIGITS {
        return digits[len - NATIONAL_DIGITS..].to_string();
    }
    if len == LOCAL_DIGITS + 1 && digits.starts_with('1') {
        return digits[1..].to_string();
    }
    digits
}

pub fn same_number(a: &str, b: &str) -> bool {
    let left = normalize(a);
    !left.is_empty() && left == normalize(b)
}

/// The single gate a number passes before it may enter a contact.
pub fn is_valid(raw: &str) -> bool {
    if raw.chars().any(|ch| ch.is_alphabetic()) {
        return false;
    }
    match clean(raw) {
        Ok(cleaned) => {
            let count = cleaned.trim_start_matches('+').len();
            (MIN_DIGITS..=MAX_DIGITS).contains(&count)
        }
        Err(_) => false,
    }
}

/// True when the trimmed input is only digits (with an optional leading
/// `+`) and has a plausible phone length.
pub fn looks_like_number(query: &str) -> bool {
    let trimmed = query.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    !digits.is_empty()
        && digits.chars().all(|ch| ch.is_ascii_digit())
        && (MIN_DIGITS..=MAX_DIGITS).contains(&digits.len())
}

/// Presentation form. Re-formatting an already formatted number is a no-op.
pub fn format(raw: &str) -> String {
    let Ok(cleaned) = clean(raw) else {
        return raw.trim().to_string();
    };
    let international = cleaned.starts_with('+');
    let digits = cleaned.trim_start_matches('+');

    match digits.len() {
        11 if digits.starts_with('1') => format!(
            "+1 ({}) {}-{}",
            &digits[1..4],
            &digits[4..7],
            &digits[7..]
        ),
        NATIONAL_DIGITS if !international => format!(
            "({}) {}-{}",
            &digits[..3],
            &digits[3..6],
            &digits[6..]
        ),
        len if international && len > MAX_PREFIX_DIGITS => {
            format_international(digits).unwrap_or(cleaned)
        }
        _ => cleaned,
    }
}

/// ISO country of an internationally written number (`+44…` or `0044…`),
/// by longest dialing-prefix match. Nationally written numbers carry no
/// country and yield `None`.
pub fn country_code_of(raw: &str) -> Option<&'static str> {
    let cleaned = clean(raw).ok()?;
    let digits = match cleaned.strip_prefix('+') {
        Some(rest) => rest,
        None => cleaned.strip_prefix("00")?,
    };
    split_country_prefix(digits).map(|(_, country, _)| country)
}

pub fn is_international(home_country: &str, raw: &str, detection_enabled: bool) -> bool {
    if !detection_enabled {
        return false;
    }
    match country_code_of(raw) {
        Some(country) => !country.eq_ignore_ascii_case(home_country.trim()),
        None => false,
    }
}

fn digits_of(raw: &str) -> String {
    raw.chars().filter(|ch| ch.is_ascii_digit()).collect()
}

fn split_country_prefix(digits: &str) -> Option<(&str, &'static str, &str)> {
    let longest = MAX_PREFIX_DIGITS.min(digits.len());
    (1..=longest).rev().find_map(|len| {
        let (prefix, rest) = digits.split_at(len);
        country_for_prefix(prefix).map(|country| (prefix, country, rest))
    })
}

fn format_international(digits: &str) -> Option<String> {
    let (prefix, _, rest) = split_country_prefix(digits)?;
    // NANP sub-prefixes (1876…) still display as +1.
    let (prefix, rest) = if prefix.len() == MAX_PREFIX_DIGITS && prefix.starts_with('1') {
        digits.split_at(1)
    } else {
        (prefix, rest)
    };
    if rest.is_empty() {
        return None;
    }

    let mut groups: Vec<&str> = Vec::new();
    let mut remaining = rest;
    while remaining.len() > 4 {
        let (head, tail) = remaining.split_at(3);
        groups.push(head);
        remaining = tail;
    }
    groups.push(remaining);

    Some(format!("+{} {}", prefix, groups.join(" ")))
}
