use crate::aggregate::{aggregate, ContactAggregator};
use crate::domain::{Contact, ContactId};
use crate::phone;
use crate::provider::{ContactProvider, ProviderRow};
use crate::recents::collect_recent_calls;
use crate::search::{CancelToken, MatchPass};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Weight of a hit from the number lookup run for digit queries.
pub const NUMBER_MATCH_WEIGHT: u8 = 100;

/// Call-log rows fetched per requested recent, to leave room for
/// duplicates and excluded numbers.
pub const RECENT_SCAN_FACTOR: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedContact {
    pub contact: Contact,
    pub weight: u8,
}

/// Runs the ranked passes against a provider. Holds no per-query state.
#[derive(Debug)]
pub struct SearchEngine<P> {
    provider: P,
}

impl<P: ContactProvider> SearchEngine<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn search(&self, query: &str) -> Vec<Contact> {
        self.search_ranked(query)
            .into_iter()
            .map(|ranked| ranked.contact)
            .collect()
    }

    pub fn search_ranked(&self, query: &str) -> Vec<RankedContact> {
        self.scan(query, &CancelToken::new()).unwrap_or_default()
    }

    /// Like [`SearchEngine::search`], but gives up between provider passes
    /// once `cancel` fires. A cancelled scan yields `None`, never a partial
    /// list.
    pub fn search_cancellable(&self, query: &str, cancel: &CancelToken) -> Option<Vec<Contact>> {
        let ranked = self.scan(query, cancel)?;
        Some(ranked.into_iter().map(|ranked| ranked.contact).collect())
    }

    /// Starred contacts, by name.
    pub fn favorites(&self) -> Vec<Contact> {
        match self.provider.favorites() {
            Ok(rows) => self.aggregate_sorted(rows),
            Err(err) => {
                warn!(error = %err, "favorites scan failed");
                Vec::new()
            }
        }
    }

    /// Every contact with at least one valid number, by name.
    pub fn roster(&self) -> Vec<Contact> {
        match self.provider.roster() {
            Ok(rows) => self.aggregate_sorted(rows),
            Err(err) => {
                warn!(error = %err, "roster scan failed");
                Vec::new()
            }
        }
    }

    /// Recent calls, skipping every number held by `excluded`.
    pub fn recent_calls(&self, excluded: &[Contact], limit: usize) -> Vec<Contact> {
        if limit == 0 {
            return Vec::new();
        }
        let rows = match self
            .provider
            .recent_calls(limit.saturating_mul(RECENT_SCAN_FACTOR))
        {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, "call-log scan failed");
                return Vec::new();
            }
        };
        collect_recent_calls(rows, |number| self.lookup_number(number), excluded, limit)
    }

    /// Provider contact owning `number`, with all of its numbers.
    pub fn lookup_number(&self, number: &str) -> Option<Contact> {
        let hits = match self.provider.number_matches(number) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, "number lookup failed");
                return None;
            }
        };
        let owner = hits.iter().find_map(|row| {
            let (id, _, stored) = row.fields()?;
            phone::is_valid(stored).then(|| id.to_string())
        })?;
        let rows = match self.provider.contact_rows(&owner) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(contact_id = %owner, error = %err, "contact lookup failed");
                hits
            }
        };
        aggregate(rows, |id| self.provider.photo_uri(id))
            .into_iter()
            .find(|contact| contact.id.as_str() == owner)
    }

    fn scan(&self, query: &str, cancel: &CancelToken) -> Option<Vec<RankedContact>> {
        let query = query.trim();
        if query.is_empty() {
            return Some(Vec::new());
        }

        let mut aggregator = ContactAggregator::new();
        let mut weights: HashMap<ContactId, u8> = HashMap::new();

        for pass in MatchPass::ALL {
            if cancel.is_cancelled() {
                debug!(query, "search cancelled");
                return None;
            }
            match self.provider.name_matches(pass, query) {
                Ok(rows) => self.absorb(&mut aggregator, &mut weights, rows, pass.weight()),
                Err(err) => warn!(error = %err, pass = pass.as_str(), "search pass failed"),
            }
        }

        let number_query = phone::looks_like_number(query);
        if number_query {
            if cancel.is_cancelled() {
                debug!(query, "search cancelled");
                return None;
            }
            match self.provider.number_matches(query) {
                Ok(rows) => self.absorb(&mut aggregator, &mut weights, rows, NUMBER_MATCH_WEIGHT),
                Err(err) => warn!(error = %err, "number lookup failed"),
            }
        }
        if cancel.is_cancelled() {
            debug!(query, "search cancelled");
            return None;
        }

        let mut ranked: Vec<RankedContact> = aggregator
            .finish()
            .into_iter()
            .filter_map(|contact| {
                let weight = *weights.get(&contact.id)?;
                Some(RankedContact { contact, weight })
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.weight
                .cmp(&a.weight)
                .then_with(|| {
                    a.contact
                        .name
                        .to_lowercase()
                        .cmp(&b.contact.name.to_lowercase())
                })
                .then_with(|| a.contact.id.cmp(&b.contact.id))
        });

        if ranked.is_empty() && number_query {
            ranked.push(RankedContact {
                contact: Contact::new(ContactId::search_number(query), query, query),
                weight: 0,
            });
        }

        debug!(query, results = ranked.len(), "search finished");
        Some(ranked)
    }

    fn absorb(
        &self,
        aggregator: &mut ContactAggregator,
        weights: &mut HashMap<ContactId, u8>,
        rows: Vec<ProviderRow>,
        weight: u8,
    ) {
        for row in rows {
            if let Some(id) = aggregator.push(&row, |id| self.provider.photo_uri(id)) {
                let best = weights.entry(id).or_insert(weight);
                *best = (*best).max(weight);
            }
        }
    }

    fn aggregate_sorted(&self, rows: Vec<ProviderRow>) -> Vec<Contact> {
        let mut contacts = aggregate(rows, |id| self.provider.photo_uri(id));
        contacts.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        contacts
    }
}

#[cfg(test)]
mod tests {
    use super::SearchEngine;
    use crate::domain::{CallType, ContactId};
    use crate::provider::{CallLogRow, MemoryProvider, ProviderRow};

    fn engine() -> SearchEngine<MemoryProvider> {
        SearchEngine::new(
            MemoryProvider::new()
                .with_contact("1", "Alexandra Stone", &["5550101"])
                .with_contact("2", "alex", &["5550102"])
                .with_contact("3", "Sam Alex Ford", &["5550103"])
                .with_contact("4", "Alex Kim", &["5550104", "(415) 555-1212"])
                .with_contact("5", "Malexa Ortiz", &["5550105"])
                .with_contact("6", "Zed", &["5550106"])
                .with_photo("4", "content://photos/4")
                .with_starred("4")
                .with_starred("2"),
        )
    }

    #[test]
    fn blank_query_short_circuits_without_scanning() {
        let engine = engine();
        assert!(engine.search("   ").is_empty());
        assert_eq!(engine.provider().scans(), 0);
    }

    #[test]
    fn ranks_by_weight_then_name() {
        let ranked = engine().search_ranked("alex");
        let summary: Vec<(&str, u8)> = ranked
            .iter()
            .map(|r| (r.contact.id.as_str(), r.weight))
            .collect();
        assert_eq!(
            summary,
            vec![("2", 100), ("4", 80), ("1", 80), ("5", 60), ("3", 60)]
        );
    }

    #[test]
    fn best_pass_wins_instead_of_sum() {
        let ranked = engine().search_ranked("alex kim");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].weight, 100);

        let ranked = engine().search_ranked("alexandra");
        assert_eq!(ranked[0].weight, 80);
    }

    #[test]
    fn exact_match_never_ranks_below_substring_match() {
        let ranked = engine().search_ranked("ALEX");
        let exact = ranked.iter().position(|r| r.contact.id.as_str() == "2").unwrap();
        let substring = ranked.iter().position(|r| r.contact.id.as_str() == "5").unwrap();
        assert!(exact < substring);
    }

    #[test]
    fn ordering_is_deterministic() {
        let first = engine().search("a");
        let second = engine().search("a");
        assert_eq!(first, second);
    }

    #[test]
    fn results_carry_all_numbers_and_photo() {
        let results = engine().search("kim");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].phone_numbers.len(), 2);
        assert_eq!(results[0].photo_uri.as_deref(), Some("content://photos/4"));
    }

    #[test]
    fn digit_query_without_match_yields_placeholder() {
        let results = engine().search("1234567");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, ContactId::search_number("1234567"));
        assert_eq!(results[0].name, "1234567");
        assert_eq!(results[0].phone_number, "1234567");
        assert_eq!(results[0].phone_numbers, vec!["1234567".to_string()]);
    }

    #[test]
    fn digit_query_with_matching_number_has_no_placeholder() {
        let engine = SearchEngine::new(
            MemoryProvider::new().with_contact("8", "Hal", &["123-4567"]),
        );
        let results = engine.search("1234567");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id.as_str(), "8");
    }

    #[test]
    fn lookup_number_returns_the_whole_contact() {
        let engine = engine();
        let found = engine.lookup_number("+1 415 555 1212").expect("known number");
        assert_eq!(found.id.as_str(), "4");
        assert_eq!(found.phone_numbers.len(), 2);
        assert_eq!(found.photo_uri.as_deref(), Some("content://photos/4"));
        assert_eq!(found, engine.search("alex kim")[0]);
        assert!(engine.lookup_number("5559999").is_none());
    }

    #[test]
    fn provider_failure_yields_empty_results() {
        let engine = engine();
        engine.provider().set_failing(true);
        assert!(engine.search("alex").is_empty());
        assert!(engine.favorites().is_empty());
        assert!(engine.recent_calls(&[], 5).is_empty());
    }

    #[test]
    fn cancelled_scan_returns_nothing() {
        let engine = engine();
        let cancel = crate::search::CancelToken::new();
        cancel.cancel();
        assert!(engine.search_cancellable("alex", &cancel).is_none());
        assert_eq!(engine.provider().scans(), 0);
    }

    #[test]
    fn favorites_are_sorted_by_name() {
        let names: Vec<String> = engine().favorites().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["alex".to_string(), "Alex Kim".to_string()]);
    }

    #[test]
    fn roster_skips_malformed_rows() {
        let engine = SearchEngine::new(
            MemoryProvider::new()
                .with_contact("1", "Ivy", &["5550101"])
                .with_row(ProviderRow {
                    contact_id: None,
                    ..ProviderRow::new("x", "Ghost", "5550199")
                }),
        );
        assert_eq!(engine.roster().len(), 1);
    }

    #[test]
    fn recent_calls_resolve_known_numbers() {
        let engine = SearchEngine::new(
            MemoryProvider::new()
                .with_contact("4", "Alex Kim", &["5550104", "(415) 555-1212"])
                .with_call(CallLogRow::new("+1 415 555 1212", 20, CallType::Missed))
                .with_call(CallLogRow::new("5550199", 10, CallType::Incoming)),
        );
        let recents = engine.recent_calls(&[], 10);
        assert_eq!(recents.len(), 2);
        assert_eq!(recents[0].id.as_str(), "4");
        assert_eq!(recents[0].phone_number, "(415) 555-1212");
        assert_eq!(
            recents[0].phone_numbers,
            vec!["5550104".to_string(), "(415) 555-1212".to_string()]
        );
        assert!(recents[1].id.is_synthesized());
    }
}
