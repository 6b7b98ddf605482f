//! Contact law coefficients.
//!
//! These parameters map directly to the terms of the soft-sphere
//! contact model:
//!
//! | Term | Law | Fields |
//! |---|---|---|
//! | Normal | spring-dashpot (linear or Hertzian) | `stiffness`, `dissipation` |
//! | Sliding | Cundall–Strack spring + Coulomb limit | `sliding` |
//! | Rolling | spring + Coulomb limit on rolling displacement | `rolling` |
//! | Torsion | spring + Coulomb limit on twist | `torsion` |

use serde::{Deserialize, Serialize};
use talus_types::{Scalar, TalusError, TalusResult};

/// Normal force law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalModel {
    /// `f = k δ - c v_n` with constant stiffness `k` (N/m).
    Linear,
    /// `f = 4/3 E* sqrt(R δ) δ - c v_n`, with `stiffness` read as the
    /// effective elastic modulus `E*` (Pa).
    Hertz,
}

/// Spring–dashpot–Coulomb law shared by the sliding, rolling and
/// torsion degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrictionLaw {
    /// Elastic stiffness of the accumulated displacement spring (N/m).
    pub stiffness: Scalar,
    /// Viscous coefficient on the relative velocity (kg/s).
    pub dissipation: Scalar,
    /// Dynamic Coulomb coefficient, applied once the contact slides.
    pub friction: Scalar,
    /// Static Coulomb coefficient, the threshold at which sliding starts.
    pub static_friction: Scalar,
}

impl FrictionLaw {
    /// A law that produces no force at all.
    pub const NONE: FrictionLaw = FrictionLaw {
        stiffness: 0.0,
        dissipation: 0.0,
        friction: 0.0,
        static_friction: 0.0,
    };

    /// Law with equal static and dynamic friction.
    pub fn new(stiffness: Scalar, dissipation: Scalar, friction: Scalar) -> Self {
        Self {
            stiffness,
            dissipation,
            friction,
            static_friction: friction,
        }
    }

    /// Returns true if this law can never produce a force.
    pub fn is_inactive(&self) -> bool {
        self.static_friction == 0.0 || (self.stiffness == 0.0 && self.dissipation == 0.0)
    }

    fn mean(a: &FrictionLaw, b: &FrictionLaw) -> FrictionLaw {
        FrictionLaw {
            stiffness: 0.5 * (a.stiffness + b.stiffness),
            dissipation: 0.5 * (a.dissipation + b.dissipation),
            friction: 0.5 * (a.friction + b.friction),
            static_friction: 0.5 * (a.static_friction + b.static_friction),
        }
    }

    fn validate(&self, label: &str) -> TalusResult<()> {
        let fields = [
            ("stiffness", self.stiffness),
            ("dissipation", self.dissipation),
            ("friction", self.friction),
            ("static_friction", self.static_friction),
        ];
        for (name, value) in fields {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(TalusError::InvalidSpecies(format!(
                    "{label}.{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if self.friction > self.static_friction {
            return Err(TalusError::InvalidSpecies(format!(
                "{label}: dynamic friction {} exceeds static friction {}",
                self.friction, self.static_friction
            )));
        }
        Ok(())
    }
}

/// Complete set of coefficients for one species pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactParameters {
    /// Normal force law.
    pub normal_model: NormalModel,
    /// Normal stiffness `k` (linear) or effective elastic modulus `E*` (Hertz).
    pub stiffness: Scalar,
    /// Normal viscous coefficient (kg/s).
    pub dissipation: Scalar,
    /// When false, the viscoelastic normal force is clamped at zero so the
    /// dashpot can never pull particles together.
    #[serde(default)]
    pub allow_tension: bool,
    /// Constant adhesive force (N) subtracted from the normal force while
    /// the contact is closed. Zero for cohesionless material.
    #[serde(default)]
    pub cohesion: Scalar,
    /// Tangential (sliding) law.
    pub sliding: FrictionLaw,
    /// Rolling resistance law.
    pub rolling: FrictionLaw,
    /// Torsion resistance law.
    pub torsion: FrictionLaw,
}

impl Default for ContactParameters {
    /// A frictionless linear spring of unit stiffness.
    fn default() -> Self {
        Self {
            normal_model: NormalModel::Linear,
            stiffness: 1.0,
            dissipation: 0.0,
            allow_tension: false,
            cohesion: 0.0,
            sliding: FrictionLaw::NONE,
            rolling: FrictionLaw::NONE,
            torsion: FrictionLaw::NONE,
        }
    }
}

impl ContactParameters {
    /// Parameter set for a contact between two different species:
    /// field-wise arithmetic mean.
    ///
    /// Mixing a linear with a Hertzian species falls back to the linear law.
    pub fn mixed(a: &ContactParameters, b: &ContactParameters) -> ContactParameters {
        let normal_model = if a.normal_model == b.normal_model {
            a.normal_model
        } else {
            tracing::warn!(
                "mixing linear and Hertzian species; the pair uses the linear normal law"
            );
            NormalModel::Linear
        };
        ContactParameters {
            normal_model,
            stiffness: 0.5 * (a.stiffness + b.stiffness),
            dissipation: 0.5 * (a.dissipation + b.dissipation),
            allow_tension: a.allow_tension && b.allow_tension,
            cohesion: 0.5 * (a.cohesion + b.cohesion),
            sliding: FrictionLaw::mean(&a.sliding, &b.sliding),
            rolling: FrictionLaw::mean(&a.rolling, &b.rolling),
            torsion: FrictionLaw::mean(&a.torsion, &b.torsion),
        }
    }

    /// Checks every coefficient is physically admissible.
    pub fn validate(&self) -> TalusResult<()> {
        if !(self.stiffness > 0.0 && self.stiffness.is_finite()) {
            return Err(TalusError::InvalidSpecies(format!(
                "normal stiffness must be positive, got {}",
                self.stiffness
            )));
        }
        if !(self.dissipation >= 0.0 && self.dissipation.is_finite()) {
            return Err(TalusError::InvalidSpecies(format!(
                "normal dissipation must be non-negative, got {}",
                self.dissipation
            )));
        }
        if !(self.cohesion >= 0.0 && self.cohesion.is_finite()) {
            return Err(TalusError::InvalidSpecies(format!(
                "cohesion must be non-negative, got {}",
                self.cohesion
            )));
        }
        self.sliding.validate("sliding")?;
        self.rolling.validate("rolling")?;
        self.torsion.validate("torsion")?;
        Ok(())
    }
}
