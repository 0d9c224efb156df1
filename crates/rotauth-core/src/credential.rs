//! Credential values tried against accounts
//!
//! A credential is an opaque candidate secret, produced lazily from a pool
//! or fixed to a single value in checker mode. The inner value is zeroized
//! on drop and redacted in Debug/Display so it never leaks into logs.

use std::fmt;

use zeroize::Zeroize;

/// One candidate secret value. Immutable once produced.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    value: String,
}

impl Credential {
    /// Create a credential from a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Expose the inner value (use sparingly).
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential([REDACTED])")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}
