//! Physical constants and simulation defaults.

use crate::Scalar;

/// Gravitational acceleration (m/s²).
pub const GRAVITY: Scalar = 9.81;

/// Default simulation timestep (seconds).
pub const DEFAULT_DT: Scalar = 1.0e-5;

/// Default number of timesteps between two outputs.
pub const DEFAULT_SAVE_COUNT: u64 = 1000;

/// Default number of hash buckets in the spatial grid.
pub const DEFAULT_NUMBER_OF_BUCKETS: usize = 1 << 16;

/// Lower bound on any grid cell size (meters). Guards degenerate
/// zero-radius setups against division by zero.
pub const MIN_CELL_SIZE: Scalar = 1.0e-9;

/// Reserved contact history slots per particle in 3D (kissing number 12, plus one wall).
pub const HISTORY_CAPACITY_3D: usize = 13;

/// Reserved contact history slots per particle in 2D.
pub const HISTORY_CAPACITY_2D: usize = 7;

/// Fraction of the shortest collision time recommended as timestep.
pub const TIMESTEP_COLLISION_FRACTION: Scalar = 1.0 / 50.0;

/// Epsilon for floating-point comparisons.
pub const EPSILON: Scalar = 1.0e-12;
