//! Error types for pool draws

/// Errors from rotating pool draws.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The pool is empty, or a linear cursor walked past its end; no
    /// further elements will be produced.
    #[error("pool exhausted")]
    Exhausted,
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
