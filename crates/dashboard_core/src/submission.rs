//! Optimistic write-through of URL submissions into the list cache.
//!
//! `begin` shows the new row immediately; `settle` rolls back on failure and
//! always invalidates the list so the server's answer replaces the
//! placeholder. The exact pre-submission list is restored only while the
//! cache still holds what `begin` wrote; otherwise just the failed row goes.

use std::collections::BTreeMap;

use crate::cache::{Invalidation, QueryCache, QueryData, QueryKey, RequestToken, Subscriber};
use crate::model::{CorrelationId, RequestFailure, RowId, UrlEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingSubmission {
    url: String,
    snapshot: Option<Vec<UrlEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Begun {
    pub correlation: CorrelationId,
    /// List fetch aborted so it cannot overwrite the optimistic row.
    pub cancelled: Option<RequestToken>,
    pub notified: Vec<Subscriber>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    pub url: Option<String>,
    pub rolled_back: bool,
    pub invalidation: Invalidation,
    pub notified: Vec<Subscriber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Submissions {
    pending: BTreeMap<CorrelationId, PendingSubmission>,
    last_correlation: u64,
}

impl Submissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn begin(&mut self, cache: &mut QueryCache, url: &str, submitted_at: &str) -> Begun {
        let cancelled = cache.cancel_in_flight(QueryKey::Urls);
        let snapshot = cache.urls().map(<[UrlEntry]>::to_vec);

        self.last_correlation += 1;
        let correlation = CorrelationId(self.last_correlation);

        let mut rows = Vec::with_capacity(snapshot.as_ref().map_or(1, |rows| rows.len() + 1));
        rows.push(UrlEntry::optimistic(correlation, url, submitted_at));
        if let Some(previous) = &snapshot {
            rows.extend(previous.iter().cloned());
        }
        let notified = cache.set(QueryKey::Urls, QueryData::Urls(rows));

        self.pending.insert(
            correlation,
            PendingSubmission {
                url: url.to_string(),
                snapshot,
            },
        );

        Begun {
            correlation,
            cancelled,
            notified,
        }
    }

    pub fn settle(
        &mut self,
        cache: &mut QueryCache,
        correlation: CorrelationId,
        outcome: &Result<(), RequestFailure>,
    ) -> Settled {
        let pending = self.pending.remove(&correlation);
        let url = pending.as_ref().map(|p| p.url.clone());

        let mut rolled_back = false;
        let mut notified = Vec::new();
        if let (Err(_), Some(pending)) = (outcome, pending) {
            rolled_back = true;
            let exact = self.pending.is_empty() && untouched_since_begin(cache, correlation, &pending);
            notified = if exact {
                match pending.snapshot {
                    Some(rows) => cache.set(QueryKey::Urls, QueryData::Urls(rows)),
                    None => cache.clear(QueryKey::Urls),
                }
            } else {
                drop_own_row(cache, correlation)
            };
        }

        Settled {
            url,
            rolled_back,
            invalidation: cache.invalidate(QueryKey::Urls),
            notified,
        }
    }
}

/// True when the list is still the placeholder followed by the snapshot.
fn untouched_since_begin(
    cache: &QueryCache,
    correlation: CorrelationId,
    pending: &PendingSubmission,
) -> bool {
    let Some((first, rest)) = cache.urls().and_then(<[UrlEntry]>::split_first) else {
        return false;
    };
    first.id == RowId::Pending(correlation) && pending.snapshot.as_deref().unwrap_or(&[]) == rest
}

fn drop_own_row(cache: &mut QueryCache, correlation: CorrelationId) -> Vec<Subscriber> {
    let Some(rows) = cache.urls() else {
        return Vec::new();
    };
    if rows.iter().all(|row| row.id != RowId::Pending(correlation)) {
        return Vec::new();
    }
    let kept: Vec<UrlEntry> = rows
        .iter()
        .filter(|row| row.id != RowId::Pending(correlation))
        .cloned()
        .collect();
    cache.set(QueryKey::Urls, QueryData::Urls(kept))
}
