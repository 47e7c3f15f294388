use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid duration chunk {chunk:?} at offset {offset}")]
    InvalidDuration {
        chunk: String,
        offset: usize,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Not iterable")]
    NotIterable,

    #[error("Failed to spawn worker thread {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
