use crate::duration;
use crate::error::{Result, TransportError};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub crash: CrashConfig,
    pub cache: CacheConfig,
    pub link: LinkConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct CrashConfig {
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime handed to expiring values, parsed from duration text like "1d"
    pub lifetime: Duration,
    pub identity_field: String,
}

#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "transport_kit=info".to_string(),
            json: false,
        }
    }
}

/// Load settings from the process environment (and `.env` if present)
pub fn load_settings() -> Result<Settings> {
    dotenvy::dotenv().ok();
    Settings::from_lookup(|key| std::env::var(key).ok())
}

impl Settings {
    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let crash = CrashConfig {
            log_dir: lookup("CRASH_LOG_DIR")
                .unwrap_or_else(|| {
                    let home = lookup("HOME").unwrap_or_else(|| ".".to_string());
                    format!("{}/.transport_kit/crash", home)
                })
                .into(),
        };

        let lifetime_text = lookup("CACHE_LIFETIME").unwrap_or_else(|| "1d".to_string());
        let cache = CacheConfig {
            lifetime: duration::parse_duration(&lifetime_text).map_err(|e| {
                TransportError::Config(format!("Invalid CACHE_LIFETIME {:?}: {}", lifetime_text, e))
            })?,
            identity_field: lookup("CACHE_IDENTITY_FIELD").unwrap_or_else(|| "uid".to_string()),
        };

        let link = LinkConfig {
            timeout_secs: lookup("LINK_FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .map_err(|_| TransportError::Config("Invalid LINK_FETCH_TIMEOUT_SECS".to_string()))?,
        };

        let logging = LoggingConfig {
            filter: lookup("LOG_FILTER").unwrap_or_else(|| LoggingConfig::default().filter),
            json: lookup("LOG_JSON")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };

        Ok(Self {
            crash,
            cache,
            link,
            logging,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[("HOME", "/home/bot")])).unwrap();

        assert_eq!(
            settings.crash.log_dir,
            PathBuf::from("/home/bot/.transport_kit/crash")
        );
        assert_eq!(settings.cache.lifetime, Duration::from_secs(86_400));
        assert_eq!(settings.cache.identity_field, "uid");
        assert_eq!(settings.link.timeout_secs, 10);
        assert_eq!(settings.logging.filter, "transport_kit=info");
        assert!(!settings.logging.json);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("CRASH_LOG_DIR", "/var/crash"),
            ("CACHE_LIFETIME", "10m5s"),
            ("CACHE_IDENTITY_FIELD", "id"),
            ("LINK_FETCH_TIMEOUT_SECS", "3"),
            ("LOG_JSON", "true"),
        ]))
        .unwrap();

        assert_eq!(settings.crash.log_dir, PathBuf::from("/var/crash"));
        assert_eq!(settings.cache.lifetime, Duration::from_secs(3900));
        assert_eq!(settings.cache.identity_field, "id");
        assert_eq!(settings.link.timeout_secs, 3);
        assert!(settings.logging.json);
    }

    #[test]
    fn test_invalid_values() {
        let err = Settings::from_lookup(lookup(&[("CACHE_LIFETIME", "x1d")])).unwrap_err();
        assert!(matches!(err, TransportError::Config(_)));

        let err =
            Settings::from_lookup(lookup(&[("LINK_FETCH_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, TransportError::Config(_)));
    }
}
