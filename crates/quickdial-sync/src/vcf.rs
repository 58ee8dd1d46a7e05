use crate::error::{Result, SyncError};
use quickdial_core::domain::{normalize_display_name, Contact, ContactId};
use quickdial_core::phone;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;

const STARRED_PROPERTY: &str = "X-QUICKDIAL-STARRED";
const STARRED_CATEGORIES: &[&str] = &["starred", "favorites", "favourites"];

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcfContact {
    pub display_name: String,
    /// Valid numbers only, one spelling per line, in card order.
    pub numbers: Vec<String>,
    pub photo_uri: Option<String>,
    pub starred: bool,
}

#[derive(Debug, Clone)]
pub struct ParsedVcf {
    pub contacts: Vec<VcfContact>,
    pub warnings: Vec<String>,
    pub skipped: usize,
}

pub fn parse_vcf(data: &str) -> Result<ParsedVcf> {
    let mut warnings = Vec::new();
    let mut contacts = Vec::new();
    let mut skipped = 0;
    let mut cards_seen = 0;

    let mut current: Option<RawCard> = None;
    for line in unfold_lines(data) {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("BEGIN:VCARD") {
            if current.is_some() {
                warnings.push("nested BEGIN:VCARD encountered".to_string());
            }
            cards_seen += 1;
            current = Some(RawCard::default());
            continue;
        }

        if trimmed.eq_ignore_ascii_case("END:VCARD") {
            if let Some(card) = current.take() {
                if let Some(contact) = card.into_contact(&mut warnings, &mut skipped) {
                    contacts.push(contact);
                }
            } else {
                warnings.push("END:VCARD without matching BEGIN:VCARD".to_string());
            }
            continue;
        }

        let Some(card) = current.as_mut() else {
            continue;
        };
        let Some(property) = Property::parse(trimmed) else {
            continue;
        };
        card.absorb(property);
    }

    if let Some(card) = current.take() {
        warnings.push("missing END:VCARD at end of file".to_string());
        if let Some(contact) = card.into_contact(&mut warnings, &mut skipped) {
            contacts.push(contact);
        }
    }

    if cards_seen == 0 && !data.trim().is_empty() {
        return Err(SyncError::Parse("no BEGIN:VCARD found".to_string()));
    }

    Ok(ParsedVcf {
        contacts,
        warnings,
        skipped,
    })
}

/// vCard 3.0 text for `contacts`, sorted by name. Contacts whose id is in
/// `starred` carry the starred marker.
pub fn export_vcf(contacts: &[Contact], starred: &HashSet<ContactId>) -> String {
    let mut entries: Vec<&Contact> = contacts.iter().collect();
    entries.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut out = String::new();
    for contact in entries {
        out.push_str("BEGIN:VCARD\r\n");
        out.push_str("VERSION:3.0\r\n");
        out.push_str(&format!("FN:{}\r\n", escape_vcard_value(&contact.name)));
        for number in &contact.phone_numbers {
            let pref = if *number == contact.phone_number {
                ";TYPE=pref"
            } else {
                ""
            };
            out.push_str(&format!("TEL{pref}:{}\r\n", escape_vcard_value(number)));
        }
        if let Some(uri) = &contact.photo_uri {
            out.push_str(&format!("PHOTO;VALUE=uri:{uri}\r\n"));
        }
        if starred.contains(&contact.id) {
            out.push_str(&format!("{STARRED_PROPERTY}:1\r\n"));
        }
        out.push_str("END:VCARD\r\n");
    }
    out
}

struct Property {
    name: String,
    params: Vec<String>,
    value: String,
}

impl Property {
    fn parse(line: &str) -> Option<Self> {
        let (left, value) = line.split_once(':')?;
        let mut parts = left.split(';');
        let mut name = parts.next()?.trim();
        if let Some((_, ungrouped)) = name.rsplit_once('.') {
            name = ungrouped;
        }
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_ascii_uppercase(),
            params: parts.map(|p| p.trim().to_ascii_uppercase()).collect(),
            value: value.to_string(),
        })
    }

    fn has_param(&self, param: &str) -> bool {
        self.params.iter().any(|p| p == param)
    }

    fn text(&self) -> Option<String> {
        let value = unescape_vcard_value(&self.value);
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

#[derive(Default)]
struct RawCard {
    fn_name: Option<String>,
    structured_name: Option<String>,
    numbers: Vec<String>,
    photo: Option<RawPhoto>,
    starred: bool,
}

enum RawPhoto {
    Uri(String),
    Inline,
}

impl RawCard {
    fn absorb(&mut self, property: Property) {
        match property.name.as_str() {
            "FN" => {
                if self.fn_name.is_none() {
                    self.fn_name = property.text();
                }
            }
            "N" => {
                if self.structured_name.is_none() {
                    self.structured_name = structured_name(&property.value);
                }
            }
            "TEL" => {
                if let Some(number) = property.text() {
                    self.numbers.push(strip_tel_scheme(number));
                }
            }
            "PHOTO" => {
                if self.photo.is_none() {
                    self.photo = Some(photo_of(&property));
                }
            }
            "CATEGORIES" => {
                for item in split_escaped_commas(property.value.trim()) {
                    let item = unescape_vcard_value(&item);
                    let item = item.trim().to_lowercase();
                    if STARRED_CATEGORIES.contains(&item.as_str()) {
                        self.starred = true;
                    }
                }
            }
            STARRED_PROPERTY => {
                if let Some(flag) = property.text() {
                    self.starred |= matches!(
                        flag.to_ascii_lowercase().as_str(),
                        "1" | "true" | "yes"
                    );
                }
            }
            _ => {}
        }
    }

    fn into_contact(self, warnings: &mut Vec<String>, skipped: &mut usize) -> Option<VcfContact> {
        let display_name = match self
            .fn_name
            .or(self.structured_name)
            .as_deref()
            .and_then(normalize_display_name)
        {
            Some(name) => name,
            None => {
                warnings.push("missing FN; skipping vCard".to_string());
                *skipped += 1;
                return None;
            }
        };

        let mut numbers: Vec<String> = Vec::new();
        for raw in self.numbers {
            if !phone::is_valid(&raw) {
                warnings.push(format!("{display_name}: invalid TEL {raw}"));
                continue;
            }
            if !numbers.iter().any(|kept| phone::same_number(kept, &raw)) {
                numbers.push(raw);
            }
        }
        if numbers.is_empty() {
            warnings.push(format!("{display_name}: no valid TEL; skipping vCard"));
            *skipped += 1;
            return None;
        }

        let photo_uri = match self.photo {
            Some(RawPhoto::Uri(uri)) => Some(uri),
            Some(RawPhoto::Inline) => {
                warnings.push(format!("{display_name}: inline PHOTO ignored"));
                None
            }
            None => None,
        };

        Some(VcfContact {
            display_name,
            numbers,
            photo_uri,
            starred: self.starred,
        })
    }
}

/// `N:Family;Given;Additional;Prefix;Suffix` as "Given Family".
fn structured_name(raw: &str) -> Option<String> {
    let parts: Vec<String> = split_escaped(raw, ';')
        .iter()
        .map(|part| unescape_vcard_value(part).trim().to_string())
        .collect();
    let family = parts.first().map(String::as_str).unwrap_or_default();
    let given = parts.get(1).map(String::as_str).unwrap_or_default();
    normalize_display_name(&format!("{given} {family}"))
}

fn strip_tel_scheme(number: String) -> String {
    let has_scheme = number
        .get(..4)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("tel:"));
    if has_scheme {
        number[4..].trim().to_string()
    } else {
        number
    }
}

fn photo_of(property: &Property) -> RawPhoto {
    let value = property.value.trim();
    let inline = property.has_param("ENCODING=B")
        || property.has_param("ENCODING=BASE64")
        || value.starts_with("data:");
    if !inline && value.contains("://") {
        RawPhoto::Uri(value.to_string())
    } else {
        RawPhoto::Inline
    }
}

fn unfold_lines(input: &str) -> Vec<String> {
    let input = normalize_line_endings(input);
    let mut lines: Vec<String> = Vec::new();
    for line in input.lines() {
        if let Some(rest) = line.strip_prefix(&[' ', '\t'][..]) {
            match lines.last_mut() {
                Some(last) => last.push_str(rest),
                None => lines.push(rest.to_string()),
            }
        } else {
            lines.push(line.to_string());
        }
    }
    lines
}

fn normalize_line_endings(input: &str) -> Cow<'_, str> {
    if !input.contains('\r') {
        return Cow::Borrowed(input);
    }
    Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
}

fn split_escaped_commas(value: &str) -> Vec<String> {
    split_escaped(value, ',')
}

/// Splits on `separator` unless it is backslash-escaped. Escapes are kept.
fn split_escaped(value: &str, separator: char) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut escape = false;

    for ch in value.chars() {
        if escape {
            current.push(ch);
            escape = false;
            continue;
        }
        if ch == '\\' {
            current.push(ch);
            escape = true;
            continue;
        }
        if ch == separator {
            items.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }

    items.push(current);
    items
}

fn escape_vcard_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' | '\r' => out.push_str("\\n"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape_vcard_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') | Some('r') | Some('R') => out.push('\n'),
            Some(other) => out.push(other),
            None => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_vcf_collects_every_valid_tel() {
        let data = "BEGIN:VCARD\nVERSION:3.0\nFN:Alex Kim\nTEL;TYPE=cell:+15550101\nTEL;TYPE=home:555-0101\nTEL;TYPE=work:(415) 555-1212\nTEL:call me\nEND:VCARD\n";
        let parsed = parse_vcf(data).expect("parse");
        assert_eq!(parsed.contacts.len(), 1);
        let contact = &parsed.contacts[0];
        assert_eq!(contact.display_name, "Alex Kim");
        assert_eq!(contact.numbers, vec!["+15550101", "(415) 555-1212"]);
        assert!(parsed
            .warnings
            .iter()
            .any(|warning| warning.contains("invalid TEL call me")));
    }

    #[test]
    fn parse_vcf_skips_cards_without_name_or_numbers() {
        let data = "BEGIN:VCARD\nTEL:5550101\nEND:VCARD\nBEGIN:VCARD\nFN:Nobody\nTEL:12\nEND:VCARD\n";
        let parsed = parse_vcf(data).expect("parse");
        assert!(parsed.contacts.is_empty());
        assert_eq!(parsed.skipped, 2);
        assert!(parsed.warnings.iter().any(|w| w.contains("missing FN")));
        assert!(parsed.warnings.iter().any(|w| w.contains("no valid TEL")));
    }

    #[test]
    fn tel_uris_lose_their_scheme() {
        let data = "BEGIN:VCARD\nVERSION:4.0\nFN:Ivy\nTEL;VALUE=uri;TYPE=cell:tel:+1-415-555-1212\nEND:VCARD\n";
        let parsed = parse_vcf(data).expect("parse");
        assert_eq!(parsed.contacts[0].numbers, vec!["+1-415-555-1212"]);
    }

    #[test]
    fn structured_name_is_a_fallback_for_fn() {
        let data = "BEGIN:VCARD\nN:Kim;Alex;;;\nTEL:5550101\nEND:VCARD\n";
        let parsed = parse_vcf(data).expect("parse");
        assert_eq!(parsed.contacts[0].display_name, "Alex Kim");
    }

    #[test]
    fn photo_uri_is_kept_and_inline_photo_dropped() {
        let data = "BEGIN:VCARD\nFN:A\nTEL:5550101\nPHOTO;VALUE=uri:https://example.com/a.jpg\nEND:VCARD\n\
BEGIN:VCARD\nFN:B\nTEL:5550102\nPHOTO;ENCODING=b;TYPE=JPEG:/9j/4AAQSkZJRg\nEND:VCARD\n";
        let parsed = parse_vcf(data).expect("parse");
        assert_eq!(
            parsed.contacts[0].photo_uri.as_deref(),
            Some("https://example.com/a.jpg")
        );
        assert!(parsed.contacts[1].photo_uri.is_none());
        assert!(parsed.warnings.iter().any(|w| w.contains("inline PHOTO")));
    }

    #[test]
    fn starred_marker_and_categories() {
        let data = "BEGIN:VCARD\nFN:A\nTEL:5550101\nX-QUICKDIAL-STARRED:true\nEND:VCARD\n\
BEGIN:VCARD\nFN:B\nTEL:5550102\nCATEGORIES:Work,Favorites\nEND:VCARD\n\
BEGIN:VCARD\nFN:C\nTEL:5550103\nCATEGORIES:Work\\,Favorites\nEND:VCARD\n";
        let parsed = parse_vcf(data).expect("parse");
        let starred: Vec<bool> = parsed.contacts.iter().map(|c| c.starred).collect();
        assert_eq!(starred, vec![true, true, false]);
    }

    #[test]
    fn folded_lines_and_crlf_are_handled() {
        let data = "BEGIN:VCARD\r\nFN:Alexandra\r\n  Stone\r\nTEL:5550101\r\nEND:VCARD\r\n";
        let parsed = parse_vcf(data).expect("parse");
        assert_eq!(parsed.contacts[0].display_name, "Alexandra Stone");
    }

    #[test]
    fn missing_end_still_yields_contact() {
        let parsed = parse_vcf("BEGIN:VCARD\nFN:Ivy\nTEL:5550101\n").expect("parse");
        assert_eq!(parsed.contacts.len(), 1);
        assert!(parsed.warnings.iter().any(|w| w.contains("missing END:VCARD")));
    }

    #[test]
    fn non_vcard_input_is_a_parse_error() {
        let err = parse_vcf("name,number\nIvy,5550101\n").unwrap_err();
        assert!(matches!(err, SyncError::Parse(_)));
        assert!(parse_vcf("  \n").expect("empty input").contacts.is_empty());
    }

    #[test]
    fn export_vcf_can_be_read_back() {
        let alex = Contact {
            photo_uri: Some("content://photos/4".to_string()),
            ..Contact::new(ContactId::new("4"), "Alex; Kim", "5550104")
                .with_number("(415) 555-1212")
                .expect("second number")
        };
        let ivy = Contact::new(ContactId::new("7"), "ivy", "5550107");
        let starred: HashSet<ContactId> = [ContactId::new("4")].into_iter().collect();

        let data = export_vcf(&[ivy, alex], &starred);
        assert!(data.contains("FN:Alex\\; Kim\r\n"));
        assert!(data.contains("TEL;TYPE=pref:5550104\r\n"));

        let parsed = parse_vcf(&data).expect("parse");
        assert_eq!(parsed.contacts.len(), 2);
        let first = &parsed.contacts[0];
        assert_eq!(first.display_name, "Alex; Kim");
        assert_eq!(first.numbers, vec!["5550104", "(415) 555-1212"]);
        assert_eq!(first.photo_uri.as_deref(), Some("content://photos/4"));
        assert!(first.starred);
        assert!(!parsed.contacts[1].starred);
    }
}
