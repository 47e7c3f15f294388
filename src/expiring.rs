//! Values with a limited lifetime
//!
//! [`ExpiringProxy`] shares a value and behaves like it (through `Deref` and
//! the [`Proxied`] capability) while remembering when it was created. Expiry
//! is informational only: callers check [`ExpiringProxy::has_expired`] and
//! refresh the value themselves.

use crate::cache::{CacheEntry, Record};
use crate::duration;
use crate::error::{Result, TransportError};
use serde_json::Value;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Capability a value needs to be enumerated and rendered through a proxy.
///
/// Mappings ([`Record`], [`CacheEntry`]) iterate their keys. A JSON [`Value`]
/// iterates only when it is an array, since its items must all be `Value`s;
/// a JSON object reports not iterable and renders as JSON. Use the `Record`
/// inside it to iterate its keys.
pub trait Proxied {
    type Item: fmt::Display;

    type Iter<'a>: Iterator<Item = &'a Self::Item>
    where
        Self: 'a;

    /// Elements of the value, or `None` when it is not iterable
    fn elements(&self) -> Option<Self::Iter<'_>>;

    /// Text for values that are not iterable
    fn fallback_text(&self) -> String {
        String::new()
    }
}

impl<T: fmt::Display> Proxied for Vec<T> {
    type Item = T;
    type Iter<'a>
        = std::slice::Iter<'a, T>
    where
        T: 'a;

    fn elements(&self) -> Option<Self::Iter<'_>> {
        Some(self.iter())
    }
}

impl<T: fmt::Display> Proxied for VecDeque<T> {
    type Item = T;
    type Iter<'a>
        = std::collections::vec_deque::Iter<'a, T>
    where
        T: 'a;

    fn elements(&self) -> Option<Self::Iter<'_>> {
        Some(self.iter())
    }
}

impl<T: fmt::Display> Proxied for BTreeSet<T> {
    type Item = T;
    type Iter<'a>
        = std::collections::btree_set::Iter<'a, T>
    where
        T: 'a;

    fn elements(&self) -> Option<Self::Iter<'_>> {
        Some(self.iter())
    }
}

/// Arrays are iterable; every other JSON value renders as JSON
impl Proxied for Value {
    type Item = Value;
    type Iter<'a> = std::slice::Iter<'a, Value>;

    fn elements(&self) -> Option<Self::Iter<'_>> {
        self.as_array().map(|items| items.iter())
    }

    fn fallback_text(&self) -> String {
        self.to_string()
    }
}

impl Proxied for Record {
    type Item = String;
    type Iter<'a> = serde_json::map::Keys<'a>;

    fn elements(&self) -> Option<Self::Iter<'_>> {
        Some(self.keys())
    }
}

/// Iterates field names, like its record does
impl Proxied for CacheEntry {
    type Item = String;
    type Iter<'a> = serde_json::map::Keys<'a>;

    fn elements(&self) -> Option<Self::Iter<'_>> {
        self.data.elements()
    }
}

macro_rules! scalar_proxied {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Proxied for $ty {
                type Item = $ty;
                type Iter<'a> = std::iter::Empty<&'a $ty>;

                fn elements(&self) -> Option<Self::Iter<'_>> {
                    None
                }

                fn fallback_text(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

scalar_proxied!(String, bool, char, i32, i64, u32, u64, usize, f64);

/// A shared value paired with a lifetime
#[derive(Debug)]
pub struct ExpiringProxy<T> {
    wrapped: Arc<T>,
    created_at: Instant,
    lifetime: Duration,
}

impl<T> ExpiringProxy<T> {
    pub fn new(value: T, lifetime: Duration) -> Self {
        Self::from_arc(Arc::new(value), lifetime)
    }

    /// Wrap an already shared value
    pub fn from_arc(wrapped: Arc<T>, lifetime: Duration) -> Self {
        Self {
            wrapped,
            created_at: Instant::now(),
            lifetime,
        }
    }

    /// Wrap a value with a lifetime given as duration text, e.g. `"1d"`
    pub fn with_lifetime_text(value: T, lifetime: &str) -> Result<Self> {
        Ok(Self::new(value, duration::parse_duration(lifetime)?))
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn has_expired(&self) -> bool {
        self.created_at.elapsed() >= self.lifetime
    }

    /// Time left before expiry, zero once expired
    pub fn remaining(&self) -> Duration {
        self.lifetime.saturating_sub(self.created_at.elapsed())
    }

    pub fn wrapped(&self) -> &T {
        &self.wrapped
    }

    pub fn shared(&self) -> Arc<T> {
        Arc::clone(&self.wrapped)
    }
}

impl<T: Proxied> ExpiringProxy<T> {
    /// Iterate the wrapped value exactly as it iterates itself
    pub fn try_iter(&self) -> Result<T::Iter<'_>> {
        self.wrapped.elements().ok_or(TransportError::NotIterable)
    }
}

impl<T> Clone for ExpiringProxy<T> {
    fn clone(&self) -> Self {
        Self {
            wrapped: Arc::clone(&self.wrapped),
            created_at: self.created_at,
            lifetime: self.lifetime,
        }
    }
}

impl<T> Deref for ExpiringProxy<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.wrapped
    }
}

impl<T> AsRef<T> for ExpiringProxy<T> {
    fn as_ref(&self) -> &T {
        &self.wrapped
    }
}

impl<T: Proxied> fmt::Display for ExpiringProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.wrapped.elements() {
            Some(items) => {
                for (num, item) in items.enumerate() {
                    if num > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            None => f.write_str(&self.wrapped.fallback_text()),
        }
    }
}
