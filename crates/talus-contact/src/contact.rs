//! Contact data types.
//!
//! `ContactGeometry` is what the narrow phase hands to the force model;
//! `ContactReport` is what survives the step for output (`.fstat` files,
//! inspection).

use serde::{Deserialize, Serialize};
use talus_math::Vec3;
use talus_types::{ContactTarget, ParticleId, Scalar};

/// Geometry and kinematics of a closed contact between participant `a`
/// (the owner) and participant `b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactGeometry {
    /// Overlap of the two surfaces (> 0).
    pub overlap: Scalar,
    /// Unit contact normal, pointing from `b` towards `a`.
    pub normal: Vec3,
    /// Contact point, halfway through the overlap region.
    pub contact_point: Vec3,
    /// Distance from the centre of `a` to the contact point.
    pub arm_a: Scalar,
    /// Distance from the centre of `b` to the contact point (zero for walls).
    pub arm_b: Scalar,
    /// Effective radius `r_a r_b / (r_a + r_b)`, or `r_a` for walls.
    pub effective_radius: Scalar,
    /// Velocity of `a` relative to `b` at the contact point.
    pub relative_velocity: Vec3,
    /// `omega_a - omega_b`.
    pub relative_angular_velocity: Vec3,
}

impl ContactGeometry {
    /// Normal component of the relative velocity (negative while
    /// approaching).
    #[inline]
    pub fn normal_velocity(&self) -> Scalar {
        self.relative_velocity.dot(self.normal)
    }

    /// Tangential part of the relative velocity.
    #[inline]
    pub fn tangential_velocity(&self) -> Vec3 {
        self.relative_velocity - self.normal * self.normal_velocity()
    }
}

/// A resolved contact as seen by its owner, kept for output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactReport {
    /// Particle that owns the history record.
    pub owner: ParticleId,
    /// The other participant.
    pub target: ContactTarget,
    /// Contact point.
    pub contact_point: Vec3,
    /// Unit normal from target to owner.
    pub normal: Vec3,
    /// Overlap.
    pub overlap: Scalar,
    /// Signed normal force on the owner (positive = repulsive).
    pub normal_force: Scalar,
    /// Tangential force on the owner.
    pub tangential_force: Vec3,
}

impl ContactReport {
    /// Returns true for particle-wall contacts.
    pub fn is_wall_contact(&self) -> bool {
        self.target.is_wall()
    }

    /// Total force on the owner.
    pub fn force(&self) -> Vec3 {
        self.normal * self.normal_force + self.tangential_force
    }
}
