//! Collision time and restitution for the linear spring-dashpot.
//!
//! A binary collision with the linear law obeys
//! `m_r δ'' + c δ' + k δ = 0`, where `m_r = m1 m2 / (m1 + m2)` is the
//! reduced mass. All functions below take `mass` as the harmonic mean
//! `2 m1 m2 / (m1 + m2) = 2 m_r`, which equals the particle mass for two
//! identical particles and twice the particle mass for a particle hitting
//! a wall.

use std::f64::consts::PI;

use talus_types::Scalar;

use crate::properties::ContactParameters;

/// Harmonic mean mass `2 m1 m2 / (m1 + m2)`.
///
/// An infinite mass (wall or fixed particle) yields `2 m1`.
pub fn harmonic_mean_mass(m1: Scalar, m2: Scalar) -> Scalar {
    if m1.is_infinite() {
        return 2.0 * m2;
    }
    if m2.is_infinite() {
        return 2.0 * m1;
    }
    2.0 * m1 * m2 / (m1 + m2)
}

/// Duration of a binary collision under the linear law, or `None` when
/// the contact is critically damped or overdamped (no rebound).
pub fn collision_time(stiffness: Scalar, dissipation: Scalar, mass: Scalar) -> Option<Scalar> {
    let omega_sq = 2.0 * stiffness / mass - (dissipation / mass).powi(2);
    if omega_sq <= 0.0 || !omega_sq.is_finite() {
        return None;
    }
    Some(PI / omega_sq.sqrt())
}

/// Restitution coefficient of a binary collision under the linear law.
///
/// Overdamped contacts have no rebound and report zero.
pub fn restitution(stiffness: Scalar, dissipation: Scalar, mass: Scalar) -> Scalar {
    match collision_time(stiffness, dissipation, mass) {
        Some(tc) => (-dissipation / mass * tc).exp(),
        None => 0.0,
    }
}

/// Stiffness and dissipation that produce the given collision time and
/// restitution coefficient. Inputs are assumed to be validated.
pub fn stiffness_and_dissipation(
    collision_time: Scalar,
    restitution: Scalar,
    mass: Scalar,
) -> (Scalar, Scalar) {
    let dissipation = -mass / collision_time * restitution.ln();
    let stiffness = 0.5 * mass * ((PI / collision_time).powi(2) + (dissipation / mass).powi(2));
    (stiffness, dissipation)
}

/// Collision duration of a Hertzian contact for impact speed `speed`.
///
/// `stiffness` is read as the effective modulus `E*`; `radius` is the
/// effective radius of the pair. Dissipation is neglected.
pub fn hertz_collision_time(
    params: &ContactParameters,
    mass: Scalar,
    radius: Scalar,
    speed: Scalar,
) -> Option<Scalar> {
    if speed <= 0.0 || radius <= 0.0 {
        return None;
    }
    let reduced = 0.5 * mass;
    let modulus = params.stiffness;
    Some(2.868 * (reduced * reduced / (radius * modulus * modulus * speed)).powf(0.2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_round_trip() {
        let mass = 8.377_580_409_572_781e-6;
        let (k, c) = stiffness_and_dissipation(2.5e-3, 0.8, mass);
        let tc = collision_time(k, c, mass).unwrap();
        assert!((tc - 2.5e-3).abs() < 1e-15);
        assert!((restitution(k, c, mass) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn overdamped_has_no_collision_time() {
        assert!(collision_time(1.0, 100.0, 1.0).is_none());
        assert_eq!(restitution(1.0, 100.0, 1.0), 0.0);
    }

    #[test]
    fn harmonic_mean_with_wall() {
        assert_eq!(harmonic_mean_mass(3.0, Scalar::INFINITY), 6.0);
        assert_eq!(harmonic_mean_mass(2.0, 2.0), 2.0);
    }
}
