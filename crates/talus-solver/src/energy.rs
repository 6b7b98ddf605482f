//! Energy bookkeeping.

use serde::{Deserialize, Serialize};
use talus_math::Vec3;
use talus_types::Scalar;

use crate::world::World;

/// Energies and mass distribution of the free particles at one instant.
///
/// Fixed particles are excluded: their motion is prescribed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergySummary {
    pub kinetic: Scalar,
    pub rotational: Scalar,
    /// `-sum(m g . x)`, zero at the origin.
    pub gravitational: Scalar,
    /// Stored in the contact springs during the last force evaluation.
    pub elastic: Scalar,
    pub mass: Scalar,
    pub center_of_mass: Vec3,
}

impl EnergySummary {
    /// Measures `world` under `gravity`. `elastic` is carried over from
    /// the last contact evaluation.
    pub fn measure(world: &World, gravity: Vec3, elastic: Scalar) -> Self {
        let mut summary = Self {
            elastic,
            ..Self::default()
        };
        let mut moment = Vec3::ZERO;
        for particle in world.particles().iter().filter(|p| !p.is_fixed()) {
            summary.kinetic += particle.kinetic_energy();
            summary.rotational += particle.rotational_energy();
            summary.gravitational -= particle.mass() * gravity.dot(particle.position);
            summary.mass += particle.mass();
            moment += particle.position * particle.mass();
        }
        if summary.mass > 0.0 {
            summary.center_of_mass = moment / summary.mass;
        }
        summary
    }

    /// Sum of every energy term.
    pub fn total(&self) -> Scalar {
        self.kinetic + self.rotational + self.gravitational + self.elastic
    }
}
