//! Time- and size-bounded cache of ranked search results.

use crate::domain::Contact;
use crate::time::{duration_millis, Clock, SystemClock};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_MAX_ENTRIES: usize = 50;
pub const DEFAULT_EVICTION_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub max_entries: usize,
    pub eviction_interval: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
            eviction_interval: DEFAULT_EVICTION_INTERVAL,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<Contact>,
    inserted_at_millis: i64,
}

/// What one eviction run removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub expired: usize,
    pub trimmed: usize,
}

/// Maps a lowercased, trimmed query to its ranked results.
///
/// Expired entries are never served but stay stored until the next
/// [`SearchResultCache::evict`]. Every operation takes the lock for its
/// whole duration, so readers see either the old or the new entry.
#[derive(Debug)]
pub struct SearchResultCache<C = SystemClock> {
    clock: C,
    settings: CacheSettings,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl<C: Clock> SearchResultCache<C> {
    pub fn new(clock: C, settings: CacheSettings) -> Self {
        Self {
            clock,
            settings,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn key_for(query: &str) -> String {
        query.to_lowercase().trim().to_string()
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    pub fn get(&self, query: &str) -> Option<Vec<Contact>> {
        let key = Self::key_for(query);
        let now = self.clock.now_millis();
        let entries = self.read();
        match entries.get(&key) {
            Some(entry) if !self.is_expired(entry, now) => {
                debug!(key = %key, "search cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(key = %key, "search cache entry expired");
                None
            }
            None => {
                debug!(key = %key, "search cache miss");
                None
            }
        }
    }

    /// Stores `results`, replacing any entry for the same key.
    pub fn put(&self, query: &str, results: Vec<Contact>) {
        let entry = CacheEntry {
            value: results,
            inserted_at_millis: self.clock.now_millis(),
        };
        self.write().insert(Self::key_for(query), entry);
    }

    /// Drops expired entries, then the oldest survivors while the cache is
    /// over capacity.
    pub fn evict(&self) -> EvictionReport {
        let now = self.clock.now_millis();
        let mut entries = self.write();

        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let expired = before - entries.len();

        let mut trimmed = 0;
        if entries.len() > self.settings.max_entries {
            let mut by_age: Vec<(i64, String)> = entries
                .iter()
                .map(|(key, entry)| (entry.inserted_at_millis, key.clone()))
                .collect();
            by_age.sort();
            let excess = entries.len() - self.settings.max_entries;
            for (_, key) in by_age.into_iter().take(excess) {
                entries.remove(&key);
                trimmed += 1;
            }
        }

        let report = EvictionReport { expired, trimmed };
        if expired > 0 || trimmed > 0 {
            debug!(expired, trimmed, remaining = entries.len(), "search cache evicted");
        }
        report
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of every stored entry keyed by normalized query.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<Contact>> {
        self.read()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    fn is_expired(&self, entry: &CacheEntry, now: i64) -> bool {
        now.saturating_sub(entry.inserted_at_millis) > duration_millis(self.settings.ttl)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background thread running [`SearchResultCache::evict`] on a fixed period.
/// Stops when dropped.
#[derive(Debug)]
pub struct EvictionWorker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl EvictionWorker {
    pub fn spawn<C>(cache: Arc<SearchResultCache<C>>, period: Duration) -> io::Result<Self>
    where
        C: Clock + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("quickdial-cache-eviction".to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        cache.evict();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EvictionWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
