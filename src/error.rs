use thiserror::Error;

/// Failures reading or writing a persistent key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("keychain error: {0}")]
    Keychain(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("storage lock poisoned")]
    Poisoned,

    #[error("failed to read device memory: {0}")]
    Probe(String),
}

/// Failures talking to the document store.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("store returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid store url: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard access failed: {0}")]
    Access(String),
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("clipboard is empty, nothing to share")]
    EmptyClipboard,

    #[error("device id unavailable")]
    Unidentified,

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid store url: {0}")]
    Url(#[from] url::ParseError),
}

/// Failures wiring the client together at start-up.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
