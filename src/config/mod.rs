mod settings;

pub use settings::{
    CacheConfig, CrashConfig, LinkConfig, LoggingConfig, Settings, load_settings,
};
