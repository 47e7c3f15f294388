//! Field-aware record cache
//!
//! Wraps a "fetch record by identity, with a field subset" operation and
//! remembers results per identity.
//!
//! Key features:
//! - Freshness is keyed on the exact requested field list, not a union
//! - A different field list always refetches and merges into the entry
//! - Fetch errors reach the caller untouched and leave the store as it was
//! - Not serialized per identity: concurrent mismatched requests race on the
//!   merge and the last write wins

mod field_cache;
mod types;

pub use field_cache::FieldAwareCache;
pub use types::{CacheEntry, CacheStats, Record};
