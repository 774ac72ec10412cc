//! Query cache shared by every view.
//!
//! Entries are keyed by logical query and hold the last known server response.
//! Each fetch is identified by a [`RequestToken`]; only the token carrying the
//! current generation for its key may write back, so a late response from a
//! cancelled or superseded fetch is dropped.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{RequestFailure, UrlDetail, UrlEntry, UrlId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryKey {
    Urls,
    UrlDetail(UrlId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryData {
    Urls(Vec<UrlEntry>),
    UrlDetail(UrlDetail),
}

/// A view reading from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subscriber {
    ListView,
    DetailView,
    StatusBar,
}

/// Handle for one fetch of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken {
    pub key: QueryKey,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched and nothing in flight.
    Idle,
    /// No data yet, first fetch in flight.
    Loading,
    Success,
    Error,
}

/// Outcome of [`QueryCache::invalidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Invalidation {
    /// In-flight fetch that was superseded and should be aborted.
    pub superseded: Option<RequestToken>,
    /// Replacement fetch to start.
    pub refetch: Option<RequestToken>,
}

/// Outcome of [`QueryCache::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Result written; these subscribers were notified.
    Applied(Vec<Subscriber>),
    /// Token no longer current; result dropped.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct QueryEntry {
    data: Option<QueryData>,
    error: Option<RequestFailure>,
    in_flight: Option<u64>,
    stale: bool,
    subscribers: BTreeSet<Subscriber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryCache {
    entries: BTreeMap<QueryKey, QueryEntry>,
    last_generation: u64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: QueryKey) -> Option<&QueryData> {
        self.entries.get(&key).and_then(|entry| entry.data.as_ref())
    }

    pub fn urls(&self) -> Option<&[UrlEntry]> {
        match self.get(QueryKey::Urls) {
            Some(QueryData::Urls(rows)) => Some(rows),
            _ => None,
        }
    }

    pub fn detail(&self, id: UrlId) -> Option<&UrlDetail> {
        match self.get(QueryKey::UrlDetail(id)) {
            Some(QueryData::UrlDetail(detail)) => Some(detail),
            _ => None,
        }
    }

    pub fn error(&self, key: QueryKey) -> Option<&RequestFailure> {
        self.entries.get(&key).and_then(|entry| entry.error.as_ref())
    }

    pub fn is_fetching(&self, key: QueryKey) -> bool {
        self.entries
            .get(&key)
            .is_some_and(|entry| entry.in_flight.is_some())
    }

    pub fn is_stale(&self, key: QueryKey) -> bool {
        self.entries.get(&key).is_some_and(|entry| entry.stale)
    }

    pub fn status(&self, key: QueryKey) -> QueryStatus {
        let Some(entry) = self.entries.get(&key) else {
            return QueryStatus::Idle;
        };
        if entry.error.is_some() {
            QueryStatus::Error
        } else if entry.data.is_some() {
            QueryStatus::Success
        } else if entry.in_flight.is_some() {
            QueryStatus::Loading
        } else {
            QueryStatus::Idle
        }
    }

    pub fn subscribers(&self, key: QueryKey) -> Vec<Subscriber> {
        self.entries
            .get(&key)
            .map(|entry| entry.subscribers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Registers `subscriber` on `key` and returns the fetch to start, if any.
    ///
    /// Nothing is started while another fetch for the key is in flight; the
    /// new subscriber shares that fetch's result.
    pub fn subscribe(&mut self, key: QueryKey, subscriber: Subscriber) -> Option<RequestToken> {
        let entry = self.entries.entry(key).or_default();
        let was_unobserved = entry.subscribers.is_empty();
        entry.subscribers.insert(subscriber);

        if entry.in_flight.is_some() {
            return None;
        }
        if entry.data.is_none() || entry.stale || was_unobserved {
            return Some(self.begin_fetch(key));
        }
        None
    }

    pub fn unsubscribe(&mut self, key: QueryKey, subscriber: Subscriber) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.subscribers.remove(&subscriber);
        }
    }

    /// Stores `data` and returns every subscriber of `key`.
    pub fn set(&mut self, key: QueryKey, data: QueryData) -> Vec<Subscriber> {
        let entry = self.entries.entry(key).or_default();
        entry.data = Some(data);
        entry.error = None;
        entry.stale = false;
        entry.subscribers.iter().copied().collect()
    }

    /// Drops the cached value so the key reads as absent.
    pub fn clear(&mut self, key: QueryKey) -> Vec<Subscriber> {
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.data = None;
                entry.subscribers.iter().copied().collect()
            }
            None => Vec::new(),
        }
    }

    /// Marks `key` stale. Observed keys are refetched at once, superseding
    /// any fetch still in flight.
    pub fn invalidate(&mut self, key: QueryKey) -> Invalidation {
        let entry = self.entries.entry(key).or_default();
        entry.stale = true;
        if entry.subscribers.is_empty() {
            return Invalidation::default();
        }
        let superseded = entry
            .in_flight
            .take()
            .map(|generation| RequestToken { key, generation });
        Invalidation {
            superseded,
            refetch: Some(self.begin_fetch(key)),
        }
    }

    /// Forgets the pending fetch for `key`; its response will be discarded.
    pub fn cancel_in_flight(&mut self, key: QueryKey) -> Option<RequestToken> {
        let entry = self.entries.get_mut(&key)?;
        entry
            .in_flight
            .take()
            .map(|generation| RequestToken { key, generation })
    }

    /// Applies a fetch result if `token` is still the current fetch.
    pub fn resolve(
        &mut self,
        token: RequestToken,
        result: Result<QueryData, RequestFailure>,
    ) -> Resolution {
        let Some(entry) = self.entries.get_mut(&token.key) else {
            return Resolution::Stale;
        };
        if entry.in_flight != Some(token.generation) {
            return Resolution::Stale;
        }
        entry.in_flight = None;
        match result {
            Ok(data) => {
                entry.data = Some(data);
                entry.error = None;
                entry.stale = false;
            }
            Err(failure) => {
                entry.error = Some(failure);
            }
        }
        Resolution::Applied(entry.subscribers.iter().copied().collect())
    }

    fn begin_fetch(&mut self, key: QueryKey) -> RequestToken {
        self.last_generation += 1;
        let generation = self.last_generation;
        let entry = self.entries.entry(key).or_default();
        entry.in_flight = Some(generation);
        entry.error = None;
        RequestToken { key, generation }
    }
}
