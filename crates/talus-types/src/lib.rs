//! # talus-types
//!
//! Shared types, identifiers, error types, and physical constants
//! for the Talus granular dynamics engine.
//!
//! This crate has zero domain logic; it defines the vocabulary
//! that all other Talus crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;

pub use error::{TalusError, TalusResult};
pub use ids::{ContactTarget, ParticleId, SpeciesId, WallId};
pub use scalar::Scalar;
