//! Error types for the Loom runtime.
//!
//! All crates return `LoomResult<T>` from fallible operations.

use thiserror::Error;

/// Unified error type for the Loom runtime.
#[derive(Debug, Error)]
pub enum LoomError {
    /// Mesh or topology data is malformed or degenerate.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A registry key does not refer to a live entry.
    #[error("Unknown {kind} key {key}")]
    UnknownKey { kind: &'static str, key: String },

    /// A cloth actor is already bound to a different solver.
    #[error("Actor is already bound to solver {bound} and cannot be bound to solver {requested}")]
    AlreadyBound { bound: u64, requested: u64 },

    /// `start()` was called while a previous batch has not been waited on.
    #[error("A job batch of {outstanding} unit(s) is still in flight")]
    BatchInFlight { outstanding: usize },

    /// The operation is not permitted while a simulation step is running.
    #[error("Operation `{0}` is not allowed while a step is in progress")]
    Stepping(&'static str),

    /// A runtime invariant was violated by the caller.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for `Result<T, LoomError>`.
pub type LoomResult<T> = Result<T, LoomError>;
