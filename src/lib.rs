//! Resilience and caching toolkit for chat transports.
//!
//! - [`executor`]: run handlers so no failure escapes
//! - [`dispatch`]: named, optionally delayed background execution
//! - [`cache`]: field-aware record cache with merge-on-mismatch
//! - [`expiring`]: shared values with a lifetime
//! - [`duration`]: compact duration strings (`"10m5s"`)
//! - [`link`]: fetch remote content, ignoring failures

pub mod cache;
pub mod config;
pub mod crash;
pub mod dispatch;
pub mod duration;
pub mod error;
pub mod executor;
pub mod expiring;
pub mod link;
pub mod logging;
pub mod toolkit;

pub use cache::{CacheEntry, CacheStats, FieldAwareCache, Record};
pub use crash::{CrashReport, CrashReporter, FileCrashReporter, TracingReporter};
pub use dispatch::{ThreadDispatcher, ThreadHandle};
pub use error::{Result, TransportError};
pub use executor::{ControlSignal, ExecutionResult, HandlerError, HandlerResult, SafeExecutor};
pub use expiring::{ExpiringProxy, Proxied};
pub use link::LinkFetcher;
pub use toolkit::Toolkit;
