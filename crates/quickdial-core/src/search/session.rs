use crate::cache::SearchResultCache;
use crate::domain::Contact;
use crate::provider::ContactProvider;
use crate::search::{should_publish, CancelToken, RequestTracker, SearchEngine};
use crate::time::Clock;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// A query stamped at submission time.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    pub request_id: u64,
    pub query: String,
    cancel: CancelToken,
}

impl SearchTicket {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results became visible; carries the result count.
    Published(usize),
    /// A newer request or different query text superseded this one.
    Stale,
    /// The scan was cancelled before it finished.
    Cancelled,
}

#[derive(Debug, Default)]
struct SessionState {
    live_query: String,
    in_flight: Option<CancelToken>,
    results: Vec<Contact>,
}

/// Ties engine, cache and staleness guard together for a typing user.
///
/// `submit` runs on the input side as the (debounced) query changes;
/// `execute` may run on any worker thread. Only the newest request for the
/// query still on screen ever replaces the visible results.
pub struct SearchSession<P, C: Clock> {
    engine: SearchEngine<P>,
    cache: Arc<SearchResultCache<C>>,
    requests: RequestTracker,
    state: Mutex<SessionState>,
}

impl<P: ContactProvider, C: Clock> SearchSession<P, C> {
    pub fn new(engine: SearchEngine<P>, cache: Arc<SearchResultCache<C>>) -> Self {
        Self {
            engine,
            cache,
            requests: RequestTracker::new(),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn engine(&self) -> &SearchEngine<P> {
        &self.engine
    }

    pub fn cache(&self) -> &Arc<SearchResultCache<C>> {
        &self.cache
    }

    /// Stamps a new request for `query`, makes it the live query and cancels
    /// whatever scan was still running for the previous one.
    pub fn submit(&self, query: &str) -> SearchTicket {
        let mut state = self.lock_state();
        if let Some(previous) = state.in_flight.take() {
            previous.cancel();
        }
        let cancel = CancelToken::new();
        let request_id = self.requests.issue();
        state.live_query = query.to_string();
        state.in_flight = Some(cancel.clone());
        SearchTicket {
            request_id,
            query: query.to_string(),
            cancel,
        }
    }

    /// Records the text currently in the search box without issuing a
    /// request, e.g. while the debounce timer is still running.
    pub fn set_live_query(&self, query: &str) {
        self.lock_state().live_query = query.to_string();
    }

    pub fn live_query(&self) -> String {
        self.lock_state().live_query.clone()
    }

    pub fn latest_request_id(&self) -> u64 {
        self.requests.latest()
    }

    pub fn execute(&self, ticket: &SearchTicket) -> SearchOutcome {
        if ticket.is_cancelled() {
            return SearchOutcome::Cancelled;
        }

        let results = match self.cache.get(&ticket.query) {
            Some(hit) => hit,
            None => {
                let Some(results) = self
                    .engine
                    .search_cancellable(&ticket.query, &ticket.cancel)
                else {
                    return SearchOutcome::Cancelled;
                };
                if !ticket.query.trim().is_empty() {
                    self.cache.put(&ticket.query, results.clone());
                }
                results
            }
        };

        self.publish(ticket, results)
    }

    /// Submit and execute on the calling thread.
    pub fn search(&self, query: &str) -> SearchOutcome {
        let ticket = self.submit(query);
        self.execute(&ticket)
    }

    pub fn results(&self) -> Vec<Contact> {
        self.lock_state().results.clone()
    }

    fn publish(&self, ticket: &SearchTicket, results: Vec<Contact>) -> SearchOutcome {
        let mut state = self.lock_state();
        let latest = self.requests.latest();
        if !should_publish(ticket.request_id, latest, &ticket.query, &state.live_query) {
            debug!(
                request_id = ticket.request_id,
                latest,
                query = %ticket.query,
                "discarding stale search response"
            );
            return SearchOutcome::Stale;
        }
        let count = results.len();
        state.results = results;
        if state
            .in_flight
            .as_ref()
            .is_some_and(|token| token.same_as(&ticket.cancel))
        {
            state.in_flight = None;
        }
        SearchOutcome::Published(count)
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
