//! Error types for topology store operations.

use thiserror::Error;

/// Errors that can occur in topology operations.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Owner or parent address failed validation
    #[error("Invalid {role} address: {reason}")]
    InvalidAddress {
        /// Which side of the advertisement was malformed ("owner" or "parent")
        role: &'static str,
        /// Human-readable cause
        reason: String,
    },

    /// The table lock was poisoned by a panicking holder
    #[error("Parent table lock poisoned: {0}")]
    LockPoisoned(String),

    /// Errors bubbled up from the core crate
    #[error(transparent)]
    Core(#[from] meshtopo_core::Error),
}

/// Result type for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;
