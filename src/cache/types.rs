//! Cache entry and statistics types

use serde::Serialize;
use serde_json::Value;

/// A fetched record: field name to value
pub type Record = serde_json::Map<String, Value>;

/// Everything known about one identity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheEntry {
    /// Comma-joined field list of the most recent fetch (freshness key)
    pub fields: String,

    /// Accumulated field values, without the identity field
    pub data: Record,
}

impl CacheEntry {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.data.contains_key(field)
    }

    /// Whether this entry was last fetched with exactly `fields`
    pub fn is_fresh_for(&self, fields: &str) -> bool {
        self.fields == fields
    }

    pub(crate) fn merge(&mut self, fields: String, record: Record) {
        self.fields = fields;
        self.data.extend(record);
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub fetches: u64,
    pub fetch_errors: u64,
}

impl CacheStats {
    /// Hit rate in whole percent
    pub fn hit_rate(&self) -> u32 {
        let total = self.hits + self.misses;
        if total > 0 {
            (self.hits as f32 / total as f32 * 100.0) as u32
        } else {
            0
        }
    }
}
