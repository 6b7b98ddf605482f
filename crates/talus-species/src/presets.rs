//! Built-in species presets.
//!
//! Coefficients are tuned for millimetre-sized particles: collision times
//! are around 1.6e-4 s for a 1 mm radius, so a timestep of a few
//! microseconds resolves every contact. Tangential and rolling stiffnesses
//! follow the usual 2/7 and 2/5 ratios to the normal stiffness.

use crate::properties::{ContactParameters, FrictionLaw, NormalModel};
use crate::species::Species;

/// Returns every preset.
pub fn all() -> Vec<Species> {
    vec![glass(), sand(), steel(), frictionless()]
}

/// Looks up a preset by name.
pub fn by_name(name: &str) -> Option<Species> {
    all().into_iter().find(|s| s.name == name)
}

fn granular(stiffness: f64, dissipation: f64, mu: f64, mu_roll: f64, mu_tors: f64) -> ContactParameters {
    ContactParameters {
        normal_model: NormalModel::Linear,
        stiffness,
        dissipation,
        allow_tension: false,
        cohesion: 0.0,
        sliding: FrictionLaw::new(2.0 / 7.0 * stiffness, 2.0 / 7.0 * dissipation, mu),
        rolling: FrictionLaw::new(2.0 / 5.0 * stiffness, 2.0 / 5.0 * dissipation, mu_roll),
        torsion: FrictionLaw::new(2.0 / 5.0 * stiffness, 2.0 / 5.0 * dissipation, mu_tors),
    }
}

/// Glass beads: smooth, elastic (e ≈ 0.9 at 1 mm).
fn glass() -> Species {
    Species::new("glass", 2500.0, granular(2000.0, 6.9e-3, 0.3, 0.01, 0.0))
}

/// Quartz sand: rough, dissipative (e ≈ 0.7 at 1 mm).
fn sand() -> Species {
    Species::new("sand", 2650.0, granular(2000.0, 2.4e-2, 0.5, 0.1, 0.05))
}

/// Steel shot: heavy, stiff, very elastic (e ≈ 0.95 at 1 mm).
fn steel() -> Species {
    Species::new("steel", 7850.0, granular(5000.0, 9.4e-3, 0.2, 0.005, 0.0))
}

/// Frictionless reference material for verification runs.
fn frictionless() -> Species {
    Species::new(
        "frictionless",
        2000.0,
        ContactParameters {
            stiffness: 2000.0,
            dissipation: 1.0e-2,
            ..ContactParameters::default()
        },
    )
}
