//! Soft-sphere contact force model.
//!
//! One pure function evaluates a closed contact. The only state it touches
//! is the contact's history record:
//!
//! 1. **Normal**: linear or Hertzian spring plus a dashpot on the normal
//!    relative velocity. Clamped at zero unless tension is allowed, then
//!    reduced by a constant cohesion.
//! 2. **Sliding**: Cundall–Strack spring. The stored displacement is first
//!    rotated into the current tangent plane, then advanced by `v_t dt`.
//!    Past the static Coulomb limit the force is set to the dynamic limit
//!    and the spring is rewritten to the displacement that reproduces it.
//! 3. **Rolling / torsion**: same spring-dashpot-Coulomb pattern, driven by
//!    `R (omega_a - omega_b) × n` and `R ((omega_a - omega_b) · n) n`.
//!
//! All forces are the forces on `a`. The caller applies `-force` to `b`.

use talus_math::{rotate_into_plane, Vec3};
use talus_species::{ContactParameters, FrictionLaw, NormalModel};
use talus_types::Scalar;

use crate::contact::ContactGeometry;
use crate::history::ContactHistoryRecord;

/// Result of evaluating one contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactForce {
    /// Force on `a`. `b` receives `-force`.
    pub force: Vec3,
    /// Torque on `a`.
    pub torque_a: Vec3,
    /// Torque on `b`.
    pub torque_b: Vec3,
    /// Signed normal force along the contact normal (positive = repulsive).
    pub normal_force: Scalar,
    /// Tangential (sliding) force on `a`.
    pub tangential_force: Vec3,
    /// Energy stored in the normal, sliding, rolling and torsion springs.
    pub elastic_energy: Scalar,
}

/// How a spring is carried along when the contact normal turns.
#[derive(Clone, Copy)]
enum Frame {
    /// Spring lies in the tangent plane (sliding, rolling).
    Tangent,
    /// Spring lies along the normal (torsion).
    Normal,
}

/// Outcome of one spring update.
struct SpringForce {
    force: Vec3,
    sliding: bool,
    energy: Scalar,
}

impl SpringForce {
    const NONE: SpringForce = SpringForce {
        force: Vec3::ZERO,
        sliding: false,
        energy: 0.0,
    };
}

/// Evaluates the contact force on `a` and updates `record` in place.
///
/// `geometry.overlap` must be positive; the narrow phase only reports
/// closed contacts.
pub fn compute_contact_force(
    geometry: &ContactGeometry,
    params: &ContactParameters,
    record: &mut ContactHistoryRecord,
    dt: Scalar,
) -> ContactForce {
    debug_assert!(geometry.overlap > 0.0, "contact force requested for an open contact");
    let n = geometry.normal;
    let overlap = geometry.overlap;

    // ── Normal ──
    let (elastic, normal_energy) = match params.normal_model {
        NormalModel::Linear => (
            params.stiffness * overlap,
            0.5 * params.stiffness * overlap * overlap,
        ),
        NormalModel::Hertz => {
            let k = 4.0 / 3.0 * params.stiffness * (geometry.effective_radius * overlap).sqrt();
            (k * overlap, 0.4 * k * overlap * overlap)
        }
    };
    let mut normal_force = elastic - params.dissipation * geometry.normal_velocity();
    if !params.allow_tension {
        normal_force = normal_force.max(0.0);
    }
    normal_force -= params.cohesion;
    let limit = normal_force.abs();

    // ── Sliding ──
    let sliding = spring_step(
        &params.sliding,
        &mut record.tangential,
        geometry.tangential_velocity(),
        n,
        limit,
        dt,
        Frame::Tangent,
    );
    record.sliding = sliding.sliding;
    record.sliding_force = sliding.force;

    let mut torque_a = -geometry.arm_a * n.cross(sliding.force);
    let mut torque_b = -geometry.arm_b * n.cross(sliding.force);

    // ── Rolling ──
    let radius = geometry.effective_radius;
    let spin = geometry.relative_angular_velocity;
    let rolling = spring_step(
        &params.rolling,
        &mut record.rolling,
        radius * spin.cross(n),
        n,
        limit,
        dt,
        Frame::Tangent,
    );
    record.rolling_sliding = rolling.sliding;
    let rolling_torque = radius * n.cross(rolling.force);
    torque_a += rolling_torque;
    torque_b -= rolling_torque;

    // ── Torsion ──
    let torsion = spring_step(
        &params.torsion,
        &mut record.torsion,
        radius * spin.dot(n) * n,
        n,
        limit,
        dt,
        Frame::Normal,
    );
    record.torsion_sliding = torsion.sliding;
    let torsion_torque = radius * torsion.force;
    torque_a += torsion_torque;
    torque_b -= torsion_torque;

    ContactForce {
        force: normal_force * n + sliding.force,
        torque_a,
        torque_b,
        normal_force,
        tangential_force: sliding.force,
        elastic_energy: normal_energy + sliding.energy + rolling.energy + torsion.energy,
    }
}

/// Advances one spring-dashpot-Coulomb element.
fn spring_step(
    law: &FrictionLaw,
    spring: &mut Vec3,
    velocity: Vec3,
    normal: Vec3,
    normal_force: Scalar,
    dt: Scalar,
    frame: Frame,
) -> SpringForce {
    if law.is_inactive() {
        *spring = Vec3::ZERO;
        return SpringForce::NONE;
    }

    *spring = match frame {
        Frame::Tangent => rotate_into_plane(*spring, normal),
        Frame::Normal => {
            let along = spring.dot(normal);
            normal * along.signum() * spring.length()
        }
    };
    *spring += velocity * dt;

    let mut force = -law.stiffness * *spring - law.dissipation * velocity;
    let static_limit = law.static_friction * normal_force;
    let sliding = force.length_squared() > static_limit * static_limit;
    if sliding {
        let magnitude = force.length();
        force *= law.friction * normal_force / magnitude;
        *spring = if law.stiffness > 0.0 {
            -(force + law.dissipation * velocity) / law.stiffness
        } else {
            Vec3::ZERO
        };
    }

    SpringForce {
        force,
        sliding,
        energy: 0.5 * law.stiffness * spring.length_squared(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talus_types::{ContactTarget, WallId};

    fn head_on(overlap: Scalar, approach: Scalar) -> ContactGeometry {
        ContactGeometry {
            overlap,
            normal: Vec3::Z,
            contact_point: Vec3::ZERO,
            arm_a: 1.0,
            arm_b: 0.0,
            effective_radius: 1.0,
            relative_velocity: Vec3::new(0.0, 0.0, -approach),
            relative_angular_velocity: Vec3::ZERO,
        }
    }

    fn record() -> ContactHistoryRecord {
        ContactHistoryRecord::new(ContactTarget::Wall(WallId(0)), 0.0)
    }

    #[test]
    fn linear_normal_force() {
        let params = ContactParameters {
            stiffness: 100.0,
            dissipation: 2.0,
            ..ContactParameters::default()
        };
        let f = compute_contact_force(&head_on(0.01, 0.5), &params, &mut record(), 1e-3);
        assert!((f.normal_force - (1.0 + 1.0)).abs() < 1e-12);
        assert!((f.elastic_energy - 0.5 * 100.0 * 1e-4).abs() < 1e-15);
    }

    #[test]
    fn separating_dashpot_is_clamped() {
        let params = ContactParameters {
            stiffness: 100.0,
            dissipation: 10.0,
            ..ContactParameters::default()
        };
        let f = compute_contact_force(&head_on(0.001, -1.0), &params, &mut record(), 1e-3);
        assert_eq!(f.normal_force, 0.0);
        assert_eq!(f.force, Vec3::ZERO);

        let tensile = ContactParameters {
            allow_tension: true,
            ..params
        };
        let f = compute_contact_force(&head_on(0.001, -1.0), &tensile, &mut record(), 1e-3);
        assert!(f.normal_force < 0.0);
    }

    #[test]
    fn hertz_scales_with_overlap_to_three_halves() {
        let params = ContactParameters {
            normal_model: NormalModel::Hertz,
            stiffness: 1e6,
            ..ContactParameters::default()
        };
        let f1 = compute_contact_force(&head_on(1e-4, 0.0), &params, &mut record(), 1e-3);
        let f2 = compute_contact_force(&head_on(4e-4, 0.0), &params, &mut record(), 1e-3);
        assert!((f2.normal_force / f1.normal_force - 8.0).abs() < 1e-9);
    }

    #[test]
    fn torsion_spring_turns_with_normal() {
        let mut spring = Vec3::new(0.0, 0.0, -2.0);
        let law = FrictionLaw::new(1.0, 0.0, 10.0);
        spring_step(&law, &mut spring, Vec3::ZERO, Vec3::X, 100.0, 1e-3, Frame::Normal);
        assert!(spring.cross(Vec3::X).length() < 1e-15);
        assert!((spring.length() - 2.0).abs() < 1e-15);
    }

    #[test]
    fn sliding_spring_saturates_at_coulomb_limit() {
        let params = ContactParameters {
            stiffness: 100.0,
            sliding: FrictionLaw::new(10.0, 0.0, 0.5),
            ..ContactParameters::default()
        };
        let mut geometry = head_on(0.01, 0.0);
        geometry.relative_velocity = Vec3::new(1.0, 0.0, 0.0);
        let mut rec = record();
        // Normal force 1 N, so the limit is 0.5 N, reached after 50 steps.
        let f = compute_contact_force(&geometry, &params, &mut rec, 1e-3);
        assert!(!rec.sliding);
        assert!((f.tangential_force.x + 0.01).abs() < 1e-12);
        for _ in 0..100 {
            compute_contact_force(&geometry, &params, &mut rec, 1e-3);
        }
        assert!(rec.sliding);
        assert!((rec.sliding_force.length() - 0.5).abs() < 1e-12);
        assert!((rec.tangential.x - 0.05).abs() < 1e-12);
    }
}
