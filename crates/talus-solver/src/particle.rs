//! Spherical particles.

use talus_contact::{BodyState, ContactHistoryStore};
use talus_math::{Quat, Vec3};
use talus_types::{ParticleId, Scalar, SpeciesId};

/// A soft sphere (3D) or disk (2D).
///
/// Mass and inertia are derived from the radius, the species density and
/// the world dimension when the particle joins a [`World`](crate::World);
/// until then they are zero.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Stable id, assigned by the world.
    pub id: ParticleId,
    pub species: SpeciesId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub orientation: Quat,
    radius: Scalar,
    mass: Scalar,
    inv_mass: Scalar,
    inertia: Scalar,
    inv_inertia: Scalar,
    /// Force accumulated during the current step.
    pub force: Vec3,
    /// Torque accumulated during the current step.
    pub torque: Vec3,
    fixed: bool,
    /// Contacts owned by this particle.
    pub history: ContactHistoryStore,
}

impl Particle {
    /// Creates a particle at rest.
    pub fn new(species: SpeciesId, position: Vec3, radius: Scalar) -> Self {
        Self {
            id: ParticleId(0),
            species,
            position,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            radius,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            fixed: false,
            history: ContactHistoryStore::default(),
        }
    }

    /// Sets the initial velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the initial angular velocity.
    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Makes the particle immovable by contacts: it keeps its velocity.
    pub fn with_fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    #[inline]
    pub fn radius(&self) -> Scalar {
        self.radius
    }

    #[inline]
    pub fn mass(&self) -> Scalar {
        self.mass
    }

    /// Zero for fixed particles.
    #[inline]
    pub fn inv_mass(&self) -> Scalar {
        self.inv_mass
    }

    #[inline]
    pub fn inertia(&self) -> Scalar {
        self.inertia
    }

    /// Zero for fixed particles.
    #[inline]
    pub fn inv_inertia(&self) -> Scalar {
        self.inv_inertia
    }

    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Volume (3D) or area (2D).
    pub fn volume(&self, dimension: u8) -> Scalar {
        if dimension == 2 {
            std::f64::consts::PI * self.radius * self.radius
        } else {
            4.0 / 3.0 * std::f64::consts::PI * self.radius.powi(3)
        }
    }

    /// Kinematic view used by the narrow phase.
    #[inline]
    pub fn body_state(&self) -> BodyState {
        BodyState {
            position: self.position,
            velocity: self.velocity,
            angular_velocity: self.angular_velocity,
            radius: self.radius,
        }
    }

    /// Translational kinetic energy.
    pub fn kinetic_energy(&self) -> Scalar {
        0.5 * self.mass * self.velocity.length_squared()
    }

    /// Rotational kinetic energy.
    pub fn rotational_energy(&self) -> Scalar {
        0.5 * self.inertia * self.angular_velocity.length_squared()
    }

    /// Clears the force and torque accumulators.
    #[inline]
    pub fn reset_force(&mut self) {
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    /// Sets the radius and derives mass and inertia from `density`.
    pub(crate) fn assign_radius(&mut self, radius: Scalar, density: Scalar, dimension: u8) {
        self.radius = radius;
        self.mass = self.volume(dimension) * density;
        let shape_factor = if dimension == 2 { 0.5 } else { 0.4 };
        self.inertia = shape_factor * self.mass * radius * radius;
        self.refresh_inverses();
    }

    /// Pins or releases the particle.
    pub(crate) fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
        self.refresh_inverses();
    }

    fn refresh_inverses(&mut self) {
        let invert = |x: Scalar| if self.fixed || x <= 0.0 { 0.0 } else { 1.0 / x };
        self.inv_mass = invert(self.mass);
        self.inv_inertia = invert(self.inertia);
    }
}
