//! Scalar type alias for the simulation.
//!
//! DEM contacts are stiff and short-lived: overlaps are typically four or
//! five orders of magnitude smaller than particle positions, so the engine
//! runs in double precision throughout.

/// The floating-point type used throughout the simulation.
pub type Scalar = f64;
