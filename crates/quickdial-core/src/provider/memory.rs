use crate::phone;
use crate::provider::{CallLogRow, ContactProvider, ProviderError, ProviderRow, Result};
use crate::search::MatchPass;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory provider with the same matching rules as the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    rows: Vec<ProviderRow>,
    photos: HashMap<String, String>,
    starred: HashSet<String>,
    calls: Vec<CallLogRow>,
    scans: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contact(mut self, id: &str, name: &str, numbers: &[&str]) -> Self {
        for number in numbers {
            self.rows.push(ProviderRow::new(id, name, number));
        }
        self
    }

    pub fn with_row(mut self, row: ProviderRow) -> Self {
        self.rows.push(row);
        self
    }

    pub fn with_photo(mut self, id: &str, uri: &str) -> Self {
        self.photos.insert(id.to_string(), uri.to_string());
        self
    }

    pub fn with_starred(mut self, id: &str) -> Self {
        self.starred.insert(id.to_string());
        self
    }

    pub fn with_call(mut self, row: CallLogRow) -> Self {
        self.calls.push(row);
        self
    }

    /// Number of provider queries served so far.
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    /// Makes every following query fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn begin_scan(&self) -> Result<()> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::new("provider unavailable"));
        }
        Ok(())
    }

    fn rows_where(&self, keep: impl Fn(&ProviderRow) -> bool) -> Vec<ProviderRow> {
        self.rows.iter().filter(|row| keep(row)).cloned().collect()
    }
}

impl ContactProvider for MemoryProvider {
    fn name_matches(&self, pass: MatchPass, query: &str) -> Result<Vec<ProviderRow>> {
        self.begin_scan()?;
        Ok(self.rows_where(|row| {
            row.display_name
                .as_deref()
                .is_some_and(|name| pass.matches(name, query))
        }))
    }

    fn number_matches(&self, number: &str) -> Result<Vec<ProviderRow>> {
        self.begin_scan()?;
        Ok(self.rows_where(|row| {
            row.number
                .as_deref()
                .is_some_and(|stored| phone::same_number(stored, number))
        }))
    }

    fn contact_rows(&self, contact_id: &str) -> Result<Vec<ProviderRow>> {
        self.begin_scan()?;
        Ok(self.rows_where(|row| row.contact_id.as_deref() == Some(contact_id)))
    }

    fn favorites(&self) -> Result<Vec<ProviderRow>> {
        self.begin_scan()?;
        Ok(self.rows_where(|row| {
            row.contact_id
                .as_deref()
                .is_some_and(|id| self.starred.contains(id))
        }))
    }

    fn roster(&self) -> Result<Vec<ProviderRow>> {
        self.begin_scan()?;
        Ok(self.rows.clone())
    }

    fn recent_calls(&self, limit: usize) -> Result<Vec<CallLogRow>> {
        self.begin_scan()?;
        let mut calls = self.calls.clone();
        calls.sort_by_key(|call| std::cmp::Reverse(call.timestamp_millis.unwrap_or(i64::MIN)));
        calls.truncate(limit);
        Ok(calls)
    }

    fn photo_uri(&self, contact_id: &str) -> Option<String> {
        self.photos.get(contact_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryProvider;
    use crate::domain::CallType;
    use crate::provider::{CallLogRow, ContactProvider};
    use crate::search::MatchPass;

    #[test]
    fn name_matches_follow_pass_rules() {
        let provider = MemoryProvider::new()
            .with_contact("1", "Alex", &["5550101"])
            .with_contact("2", "Alexandra Kim", &["5550102"])
            .with_contact("3", "Sam Alex Ford", &["5550103"]);

        let exact = provider.name_matches(MatchPass::Exact, "alex").unwrap();
        assert_eq!(exact.len(), 1);
        let prefix = provider.name_matches(MatchPass::Prefix, "alex").unwrap();
        assert_eq!(prefix.len(), 2);
        let word = provider.name_matches(MatchPass::WordBoundary, "alex").unwrap();
        assert_eq!(word[0].contact_id.as_deref(), Some("3"));
        assert_eq!(provider.scans(), 3);
    }

    #[test]
    fn recent_calls_are_newest_first_and_limited() {
        let provider = MemoryProvider::new()
            .with_call(CallLogRow::new("5550101", 10, CallType::Incoming))
            .with_call(CallLogRow::new("5550102", 30, CallType::Missed))
            .with_call(CallLogRow::new("5550103", 20, CallType::Outgoing));
        let calls = provider.recent_calls(2).unwrap();
        let stamps: Vec<_> = calls.iter().map(|c| c.timestamp_millis).collect();
        assert_eq!(stamps, vec![Some(30), Some(20)]);
    }

    #[test]
    fn failing_provider_reports_errors() {
        let provider = MemoryProvider::new().with_contact("1", "Alex", &["5550101"]);
        provider.set_failing(true);
        assert!(provider.roster().is_err());
    }
}
