//! Engine configuration.
//!
//! Parameters that control a run: timestep, duration, gravity, output
//! cadence, dimension and the spatial grid.

use serde::{Deserialize, Serialize};
use talus_contact::GridConfig;
use talus_math::Vec3;
use talus_types::constants::{
    DEFAULT_DT, DEFAULT_SAVE_COUNT, GRAVITY, HISTORY_CAPACITY_2D, HISTORY_CAPACITY_3D,
};
use talus_types::{Scalar, TalusError, TalusResult};

/// Configuration for the time loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Timestep (seconds).
    pub dt: Scalar,

    /// The run stops once simulated time reaches this value.
    pub max_time: Scalar,

    /// Gravitational acceleration in m/s².
    pub gravity: Vec3,

    /// An output frame is written every `save_count` steps.
    pub save_count: u64,

    /// 2 (disks in the xy plane) or 3.
    pub dimension: u8,

    /// Lower corner of the domain, used for output headers.
    pub domain_min: Vec3,

    /// Upper corner of the domain.
    pub domain_max: Vec3,

    /// Hierarchical grid parameters.
    pub grid: GridConfig,

    /// Initial capacity of each particle's history store.
    /// `None` picks a value for the dimension.
    pub history_capacity: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            max_time: 1.0,
            gravity: Vec3::new(0.0, 0.0, -GRAVITY),
            save_count: DEFAULT_SAVE_COUNT,
            dimension: 3,
            domain_min: Vec3::splat(-0.01),
            domain_max: Vec3::splat(0.01),
            grid: GridConfig::default(),
            history_capacity: None,
        }
    }
}

impl EngineConfig {
    /// Short run with frequent output.
    pub fn debug() -> Self {
        Self {
            max_time: 0.01,
            save_count: 10,
            ..Default::default()
        }
    }

    /// Small timestep and a large bucket table.
    pub fn high_resolution() -> Self {
        Self {
            dt: 1.0e-6,
            save_count: 10_000,
            grid: GridConfig {
                number_of_buckets: 1 << 20,
                ..GridConfig::default()
            },
            ..Default::default()
        }
    }

    /// History capacity actually used.
    pub fn effective_history_capacity(&self) -> usize {
        self.history_capacity.unwrap_or(if self.dimension == 2 {
            HISTORY_CAPACITY_2D
        } else {
            HISTORY_CAPACITY_3D
        })
    }

    /// Checks every field; the first problem found is returned.
    pub fn validate(&self) -> TalusResult<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(TalusError::InvalidConfig(format!(
                "timestep must be positive, got {}",
                self.dt
            )));
        }
        if !(self.max_time > 0.0 && self.max_time.is_finite()) {
            return Err(TalusError::InvalidConfig(format!(
                "max_time must be positive, got {}",
                self.max_time
            )));
        }
        if self.save_count == 0 {
            return Err(TalusError::InvalidConfig("save_count must be at least 1".into()));
        }
        if self.dimension != 2 && self.dimension != 3 {
            return Err(TalusError::InvalidConfig(format!(
                "dimension must be 2 or 3, got {}",
                self.dimension
            )));
        }
        if !self.gravity.is_finite() {
            return Err(TalusError::InvalidConfig("gravity must be finite".into()));
        }
        if self.domain_min.cmpgt(self.domain_max).any() {
            return Err(TalusError::InvalidConfig(format!(
                "domain_min {:?} exceeds domain_max {:?}",
                self.domain_min, self.domain_max
            )));
        }
        self.grid.validate()
    }

    // ─── Validated setters ───────────────────────────────────

    /// Sets the timestep. Non-positive values are rejected.
    pub fn set_timestep(&mut self, dt: Scalar) -> bool {
        if !(dt > 0.0 && dt.is_finite()) {
            tracing::warn!(dt, "timestep must be positive; keeping {}", self.dt);
            return false;
        }
        self.dt = dt;
        true
    }

    /// Sets the end time. Non-positive values are rejected.
    pub fn set_max_time(&mut self, max_time: Scalar) -> bool {
        if !(max_time > 0.0 && max_time.is_finite()) {
            tracing::warn!(max_time, "max_time must be positive; keeping {}", self.max_time);
            return false;
        }
        self.max_time = max_time;
        true
    }

    /// Sets the output cadence in steps. Zero is rejected.
    pub fn set_save_count(&mut self, save_count: u64) -> bool {
        if save_count == 0 {
            tracing::warn!("save_count must be at least 1; keeping {}", self.save_count);
            return false;
        }
        self.save_count = save_count;
        true
    }

    /// Sets the output cadence so that `count` frames cover the run.
    pub fn set_number_of_saves(&mut self, count: u64) -> bool {
        if count == 0 {
            tracing::warn!("number of saves must be at least 1; keeping save_count {}", self.save_count);
            return false;
        }
        let steps = (self.max_time / self.dt).ceil().max(1.0) as u64;
        self.set_save_count((steps / count).max(1))
    }

    /// Tilts gravity by `degrees` about the y axis, keeping its magnitude:
    /// `g = |g| (sin a, 0, -cos a)`. Used for chute flows.
    ///
    /// Rejected when gravity is zero or the angle lies outside [-90, 90].
    pub fn set_inclination_angle(&mut self, degrees: Scalar) -> bool {
        let magnitude = self.gravity.length();
        if magnitude == 0.0 {
            tracing::warn!(degrees, "cannot incline zero gravity");
            return false;
        }
        if !(-90.0..=90.0).contains(&degrees) {
            tracing::warn!(degrees, "inclination must lie in [-90, 90] degrees; keeping gravity {:?}", self.gravity);
            return false;
        }
        let angle = degrees.to_radians();
        self.gravity = magnitude * Vec3::new(angle.sin(), 0.0, -angle.cos());
        true
    }

    /// Inclination of gravity from the -z axis, in degrees.
    pub fn inclination_angle(&self) -> Scalar {
        let g = self.gravity;
        if g.length_squared() == 0.0 {
            return 0.0;
        }
        g.x.atan2(-g.z).to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        EngineConfig::default().validate().unwrap();
        EngineConfig::debug().validate().unwrap();
        EngineConfig::high_resolution().validate().unwrap();
    }

    #[test]
    fn rejected_setters_keep_previous_value() {
        let mut config = EngineConfig::default();
        assert!(!config.set_timestep(-1.0));
        assert_eq!(config.dt, DEFAULT_DT);
        assert!(!config.set_save_count(0));
        assert_eq!(config.save_count, DEFAULT_SAVE_COUNT);
        assert!(!config.set_max_time(0.0));
        assert_eq!(config.max_time, 1.0);
    }

    #[test]
    fn inclination_keeps_magnitude() {
        let mut config = EngineConfig::default();
        assert!(config.set_inclination_angle(30.0));
        assert!((config.gravity.length() - GRAVITY).abs() < 1e-12);
        assert!((config.inclination_angle() - 30.0).abs() < 1e-9);
        assert!(!config.set_inclination_angle(120.0));
        config.gravity = Vec3::ZERO;
        assert!(!config.set_inclination_angle(10.0));
    }

    #[test]
    fn number_of_saves_spreads_over_run() {
        let mut config = EngineConfig::default();
        config.dt = 1e-3;
        config.max_time = 1.0;
        assert!(config.set_number_of_saves(10));
        assert_eq!(config.save_count, 100);
    }

    #[test]
    fn history_capacity_follows_dimension() {
        let mut config = EngineConfig::default();
        assert_eq!(config.effective_history_capacity(), HISTORY_CAPACITY_3D);
        config.dimension = 2;
        assert_eq!(config.effective_history_capacity(), HISTORY_CAPACITY_2D);
        config.history_capacity = Some(4);
        assert_eq!(config.effective_history_capacity(), 4);
    }
}
