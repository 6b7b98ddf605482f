//! A named material with density and contact laws.
//!
//! Runtime setters never fail hard: an invalid value is reported with
//! `tracing::warn!`, the previous value is kept and the setter returns
//! `false`, so a simulation keeps running with its last valid
//! configuration.

use serde::{Deserialize, Serialize};
use talus_types::{Scalar, TalusError, TalusResult};

use crate::calibration;
use crate::properties::{ContactParameters, FrictionLaw};

/// Physical properties of a granular material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    /// Human-readable name (e.g., "glass"). Must not contain whitespace.
    pub name: String,
    /// Bulk density (kg/m³ in 3D, kg/m² in 2D).
    pub density: Scalar,
    /// Contact law for two particles of this species.
    pub contact: ContactParameters,
}

impl Species {
    /// Creates a species with the given density and contact parameters.
    pub fn new(name: impl Into<String>, density: Scalar, contact: ContactParameters) -> Self {
        Self {
            name: name.into(),
            density,
            contact,
        }
    }

    /// Checks density, name and every contact coefficient.
    pub fn validate(&self) -> TalusResult<()> {
        if self.name.is_empty() || self.name.chars().any(char::is_whitespace) {
            return Err(TalusError::InvalidSpecies(format!(
                "species name '{}' must be non-empty and contain no whitespace",
                self.name
            )));
        }
        if !(self.density > 0.0 && self.density.is_finite()) {
            return Err(TalusError::InvalidSpecies(format!(
                "species '{}': density must be positive, got {}",
                self.name, self.density
            )));
        }
        self.contact.validate().map_err(|e| {
            TalusError::InvalidSpecies(format!("species '{}': {e}", self.name))
        })
    }

    /// Sets the density. Rejects non-positive values.
    pub fn set_density(&mut self, density: Scalar) -> bool {
        if !(density > 0.0 && density.is_finite()) {
            tracing::warn!(species = %self.name, density, "density must be positive; keeping {}", self.density);
            return false;
        }
        self.density = density;
        true
    }

    /// Sets the normal stiffness. Rejects non-positive values.
    pub fn set_stiffness(&mut self, stiffness: Scalar) -> bool {
        if !(stiffness > 0.0 && stiffness.is_finite()) {
            tracing::warn!(species = %self.name, stiffness, "stiffness must be positive; keeping {}", self.contact.stiffness);
            return false;
        }
        self.contact.stiffness = stiffness;
        true
    }

    /// Sets the normal dissipation. Rejects negative values.
    pub fn set_dissipation(&mut self, dissipation: Scalar) -> bool {
        if !(dissipation >= 0.0 && dissipation.is_finite()) {
            tracing::warn!(species = %self.name, dissipation, "dissipation must be non-negative; keeping {}", self.contact.dissipation);
            return false;
        }
        self.contact.dissipation = dissipation;
        true
    }

    /// Sets static and dynamic sliding friction to `mu`.
    pub fn set_sliding_friction(&mut self, mu: Scalar) -> bool {
        Self::set_friction(&self.name, "sliding", &mut self.contact.sliding, mu)
    }

    /// Sets static and dynamic rolling friction to `mu`.
    pub fn set_rolling_friction(&mut self, mu: Scalar) -> bool {
        Self::set_friction(&self.name, "rolling", &mut self.contact.rolling, mu)
    }

    /// Sets static and dynamic torsion friction to `mu`.
    pub fn set_torsion_friction(&mut self, mu: Scalar) -> bool {
        Self::set_friction(&self.name, "torsion", &mut self.contact.torsion, mu)
    }

    fn set_friction(name: &str, label: &str, law: &mut FrictionLaw, mu: Scalar) -> bool {
        if !(mu >= 0.0 && mu.is_finite()) {
            tracing::warn!(species = %name, mu, "{label} friction must be non-negative; keeping {}", law.friction);
            return false;
        }
        law.friction = mu;
        law.static_friction = mu;
        true
    }

    /// Calibrates the linear normal law so a binary collision between
    /// particles of harmonic mean mass `mass` lasts `collision_time` and
    /// rebounds with `restitution`.
    ///
    /// Requires `collision_time > 0`, `0 < restitution <= 1`, `mass > 0`.
    pub fn set_collision_time_and_restitution(
        &mut self,
        collision_time: Scalar,
        restitution: Scalar,
        mass: Scalar,
    ) -> bool {
        let valid = collision_time > 0.0
            && collision_time.is_finite()
            && restitution > 0.0
            && restitution <= 1.0
            && mass > 0.0
            && mass.is_finite();
        if !valid {
            tracing::warn!(
                species = %self.name,
                collision_time,
                restitution,
                mass,
                "invalid collision time / restitution calibration; keeping stiffness {} and dissipation {}",
                self.contact.stiffness,
                self.contact.dissipation
            );
            return false;
        }
        let (stiffness, dissipation) =
            calibration::stiffness_and_dissipation(collision_time, restitution, mass);
        self.contact.stiffness = stiffness;
        self.contact.dissipation = dissipation;
        true
    }

    /// Collision time for harmonic mean mass `mass` (linear law only).
    pub fn collision_time(&self, mass: Scalar) -> Option<Scalar> {
        calibration::collision_time(self.contact.stiffness, self.contact.dissipation, mass)
    }

    /// Restitution coefficient for harmonic mean mass `mass` (linear law only).
    pub fn restitution(&self, mass: Scalar) -> Scalar {
        calibration::restitution(self.contact.stiffness, self.contact.dissipation, mass)
    }

    /// Mass of a sphere (3D) or disk (2D) of this species.
    pub fn particle_mass(&self, radius: Scalar, dimension: u8) -> Scalar {
        if dimension == 2 {
            std::f64::consts::PI * radius * radius * self.density
        } else {
            4.0 / 3.0 * std::f64::consts::PI * radius.powi(3) * self.density
        }
    }
}
