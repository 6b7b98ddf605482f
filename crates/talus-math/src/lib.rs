//! # talus-math
//!
//! Linear algebra primitives for the Talus simulation engine.
//!
//! Provides:
//! - Re-exports of the double-precision `glam` types under short names
//!   (`Vec3`, `Quat`, `Mat3`)
//! - Rotation helpers used by contact history and orientation integration

pub mod rotation;

// Re-export glam's f64 types as the canonical math types for Talus.
pub use glam::{DMat3 as Mat3, DQuat as Quat, DVec3 as Vec3};

pub use rotation::{integrate_orientation, rotate_into_plane};
