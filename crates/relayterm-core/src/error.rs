//! Error types for relayterm-core
//!
//! Transport drops are not errors: they surface as connection state. These
//! cover configuration, addressing and misuse of a closed session.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid relay endpoint '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported endpoint scheme '{0}' (expected http, https, ws or wss)")]
    UnsupportedScheme(String),

    #[error("Endpoint has no host: {0}")]
    MissingHost(String),

    #[error("Session is closed")]
    SessionClosed,

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidSetting { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, RelayError>;
