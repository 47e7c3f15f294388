//! Field-aware cache in front of a record fetch function

use crate::cache::types::{CacheEntry, CacheStats, Record};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    fetch_errors: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
        }
    }
}

/// Caches the results of `fetch(identity, fields)`.
///
/// An entry is served from the cache only when it was last fetched with the
/// very same field list. Any other list triggers a fetch whose result is
/// merged into the entry, so fields fetched earlier are kept.
pub struct FieldAwareCache<K, F> {
    /// Wrapped fetch operation
    fetch: F,

    /// Entries by identity (lazy-populated)
    entries: DashMap<K, CacheEntry>,

    /// Field stripped from every fetched record
    identity_field: String,

    stats: Counters,
}

impl<K, F> FieldAwareCache<K, F>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Create a cache around `fetch`, stripping the `uid` field from results
    pub fn new(fetch: F) -> Self {
        Self::with_identity_field(fetch, "uid")
    }

    /// Create a cache that strips a custom identity field from results
    pub fn with_identity_field(fetch: F, identity_field: impl Into<String>) -> Self {
        let identity_field = identity_field.into();
        tracing::debug!(identity_field = %identity_field, "Creating field-aware cache");

        Self {
            fetch,
            entries: DashMap::new(),
            identity_field,
            stats: Counters::default(),
        }
    }

    /// Get the entry for `uid` covering `fields`, fetching on a miss.
    ///
    /// Errors from the fetch function are returned unchanged.
    pub fn get<S, E>(&self, uid: &K, fields: &[S]) -> Result<CacheEntry, E>
    where
        S: AsRef<str>,
        F: Fn(&K, &[&str]) -> Result<Record, E>,
    {
        let fields: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();
        let fields_key = fields.join(",");

        if let Some(entry) = self.cached(uid, &fields_key) {
            return Ok(entry);
        }

        Counters::bump(&self.stats.misses);
        Counters::bump(&self.stats.fetches);
        tracing::debug!(uid = ?uid, fields = %fields_key, "Cache miss, fetching record");

        let mut record = match (self.fetch)(uid, &fields) {
            Ok(record) => record,
            Err(e) => {
                Counters::bump(&self.stats.fetch_errors);
                return Err(e);
            }
        };
        record.remove(&self.identity_field);

        let merged = match self.entries.entry(uid.clone()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.merge(fields_key, record);
                entry.clone()
            }
            Entry::Vacant(vacant) => vacant
                .insert(CacheEntry {
                    fields: fields_key,
                    data: record,
                })
                .clone(),
        };

        Ok(merged)
    }

    fn cached(&self, uid: &K, fields_key: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(uid)?;
        if entry.is_fresh_for(fields_key) {
            Counters::bump(&self.stats.hits);
            tracing::trace!(uid = ?uid, fields = %fields_key, "Cache hit");
            Some(entry.clone())
        } else {
            tracing::debug!(
                uid = ?uid,
                cached_fields = %entry.fields,
                requested_fields = %fields_key,
                "Cached field set differs"
            );
            None
        }
    }

    /// Current entry for `uid` without fetching
    pub fn peek(&self, uid: &K) -> Option<CacheEntry> {
        self.entries.get(uid).map(|entry| entry.clone())
    }

    /// Drop the entry for `uid`
    pub fn invalidate(&self, uid: &K) -> Option<CacheEntry> {
        self.entries.remove(uid).map(|(_, entry)| entry)
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Log cache statistics (for periodic monitoring)
    pub fn log_stats(&self) {
        let stats = self.stats();
        tracing::info!(
            entries = self.len(),
            hit_rate = stats.hit_rate(),
            fetches = stats.fetches,
            fetch_errors = stats.fetch_errors,
            "Field cache statistics"
        );
    }
}

impl<K: Eq + Hash, F> fmt::Debug for FieldAwareCache<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAwareCache")
            .field("entries", &self.entries.len())
            .field("identity_field", &self.identity_field)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}
