//! Pool error types.

use thiserror::Error;

/// Errors that can occur during pool operations.
///
/// None of these are fatal: per-frame callers log them and carry on as if
/// nothing happened.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No free list is registered under the key
    #[error("no pool registered under key '{key}'")]
    UnknownKey { key: String },

    /// The value built for the key is not of the requested concrete type
    #[error("pool '{key}' produced a {found}, expected a {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A free list is already registered under the key
    #[error("a pool is already registered under key '{key}'")]
    DuplicateKey { key: String },
}

impl PoolError {
    /// The pool key the error refers to.
    pub fn key(&self) -> &str {
        match self {
            PoolError::UnknownKey { key }
            | PoolError::TypeMismatch { key, .. }
            | PoolError::DuplicateKey { key } => key,
        }
    }

    /// Whether the error comes from setup code rather than a per-frame path.
    pub fn is_setup_error(&self) -> bool {
        matches!(self, PoolError::DuplicateKey { .. })
    }
}
