//! Error types for the Talus engine.
//!
//! All crates return `TalusResult<T>` from fallible operations.

use thiserror::Error;

/// Unified error type for the Talus engine.
#[derive(Debug, Error)]
pub enum TalusError {
    /// Particle data is malformed (non-positive radius, unknown species, ...).
    #[error("Invalid particle: {0}")]
    InvalidParticle(String),

    /// Species parameter is out of valid range.
    #[error("Invalid species parameter: {0}")]
    InvalidSpecies(String),

    /// Wall geometry is degenerate.
    #[error("Invalid wall: {0}")]
    InvalidWall(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required output or restart channel could not be used.
    #[error("Persistence failure on '{path}': {message}")]
    Persistence {
        path: String,
        message: String,
    },

    /// A text file could not be parsed.
    #[error("Parse error at token {token}: {message}")]
    Parse {
        token: usize,
        message: String,
    },

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A simulation invariant was violated.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Convenience alias for `Result<T, TalusError>`.
pub type TalusResult<T> = Result<T, TalusError>;
