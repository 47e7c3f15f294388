//! Wiring of the toolkit components from [`Settings`]

use crate::cache::FieldAwareCache;
use crate::config::Settings;
use crate::crash::{CrashReporter, FileCrashReporter};
use crate::dispatch::ThreadDispatcher;
use crate::error::Result;
use crate::executor::SafeExecutor;
use crate::expiring::ExpiringProxy;
use crate::link::LinkFetcher;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Shared handles for a running transport
#[derive(Debug, Clone)]
pub struct Toolkit {
    executor: SafeExecutor,
    dispatcher: ThreadDispatcher,
    links: LinkFetcher,
    lifetime: Duration,
    identity_field: String,
}

impl Toolkit {
    /// Build the toolkit, writing crash reports under the configured directory
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let reporter = Arc::new(FileCrashReporter::new(settings.crash.log_dir.clone()));
        Self::with_reporter(settings, reporter)
    }

    /// Build the toolkit around a custom crash reporter
    pub fn with_reporter(settings: &Settings, reporter: Arc<dyn CrashReporter>) -> Result<Self> {
        let executor = SafeExecutor::new(reporter);
        let dispatcher = ThreadDispatcher::new(executor.clone());
        let links = LinkFetcher::from_config(&settings.link)?;

        tracing::info!(
            crash_dir = %settings.crash.log_dir.display(),
            lifetime_secs = settings.cache.lifetime.as_secs(),
            identity_field = %settings.cache.identity_field,
            "Toolkit initialized"
        );

        Ok(Self {
            executor,
            dispatcher,
            links,
            lifetime: settings.cache.lifetime,
            identity_field: settings.cache.identity_field.clone(),
        })
    }

    pub fn executor(&self) -> &SafeExecutor {
        &self.executor
    }

    pub fn dispatcher(&self) -> &ThreadDispatcher {
        &self.dispatcher
    }

    pub fn links(&self) -> &LinkFetcher {
        &self.links
    }

    /// Default lifetime for expiring values
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Field-aware cache using the configured identity field
    pub fn cache<K, F>(&self, fetch: F) -> FieldAwareCache<K, F>
    where
        K: Eq + Hash + Clone + fmt::Debug,
    {
        FieldAwareCache::with_identity_field(fetch, self.identity_field.clone())
    }

    /// Wrap a value with the configured default lifetime
    pub fn expiring<T>(&self, value: T) -> ExpiringProxy<T> {
        ExpiringProxy::new(value, self.lifetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Record;
    use crate::executor::ExecutionResult;
    use serde_json::json;
    use std::collections::HashMap;

    fn settings(crash_dir: &std::path::Path) -> Settings {
        let vars: HashMap<&str, String> = HashMap::from([
            ("CRASH_LOG_DIR", crash_dir.display().to_string()),
            ("CACHE_LIFETIME", "05m".to_string()),
            ("CACHE_IDENTITY_FIELD", "id".to_string()),
        ]);
        Settings::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn test_toolkit_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let toolkit = Toolkit::from_settings(&settings(dir.path())).unwrap();

        assert_eq!(toolkit.lifetime(), Duration::from_secs(1800));

        let proxy = toolkit.expiring(vec![1, 2]);
        assert_eq!(proxy.lifetime(), Duration::from_secs(1800));
        assert!(!proxy.has_expired());

        let cache: FieldAwareCache<u32, _> =
            toolkit.cache(|id: &u32, _: &[&str]| -> std::result::Result<Record, String> {
                let mut record = Record::new();
                record.insert("id".to_string(), json!(id));
                record.insert("name".to_string(), json!("chat"));
                Ok(record)
            });
        let entry = cache.get(&3, &["name"]).unwrap();
        assert_eq!(cache.identity_field(), "id");
        assert!(!entry.contains("id"));
    }

    #[test]
    fn test_dispatch_failure_writes_crash_log() {
        let dir = tempfile::tempdir().unwrap();
        let toolkit = Toolkit::from_settings(&settings(dir.path())).unwrap();

        let handle = toolkit
            .dispatcher()
            .spawn(
                "sync_friends",
                |uid: u64| -> crate::executor::HandlerResult<()> {
                    Err(anyhow::anyhow!("token expired for {}", uid).into())
                },
                9,
            )
            .unwrap();

        assert_eq!(
            handle.join(),
            ExecutionResult::Failed {
                handler: "sync_friends".to_string()
            }
        );

        let log = std::fs::read_to_string(dir.path().join("sync_friends.txt")).unwrap();
        assert!(log.contains("sync_friends9"));
        assert!(log.contains("token expired for 9"));
    }
}
