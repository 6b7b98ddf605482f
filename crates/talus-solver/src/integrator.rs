//! Explicit time integration.
//!
//! Semi-implicit (symplectic) Euler, the leapfrog form used for DEM:
//! velocities are kicked with the forces of the current step, then
//! positions drift with the new velocities.

use talus_contact::Wall;
use talus_math::integrate_orientation;
use talus_types::Scalar;

use crate::particle::Particle;

/// Advances one particle by `dt` using its accumulated force and torque.
///
/// Fixed particles ignore forces and keep moving with their velocity.
/// In 2D motion is confined to the xy plane and rotation to the z axis.
pub fn integrate_particle(particle: &mut Particle, dt: Scalar, dimension: u8) {
    if !particle.is_fixed() {
        particle.velocity += particle.force * (particle.inv_mass() * dt);
        particle.angular_velocity += particle.torque * (particle.inv_inertia() * dt);
    }
    if dimension == 2 {
        particle.velocity.z = 0.0;
        particle.angular_velocity.x = 0.0;
        particle.angular_velocity.y = 0.0;
    }
    particle.position += particle.velocity * dt;
    particle.orientation = integrate_orientation(particle.orientation, particle.angular_velocity, dt);
}

/// Advances every particle and wall by `dt`.
pub fn integrate(particles: &mut [Particle], walls: &mut [Wall], dt: Scalar, dimension: u8) {
    for particle in particles {
        integrate_particle(particle, dt, dimension);
    }
    for wall in walls {
        wall.advance(dt);
    }
}
