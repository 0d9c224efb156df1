//! Session error types

use thiserror::Error;

/// Errors from session setup and configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using the session Error.
pub type Result<T> = std::result::Result<T, Error>;
