//! Rotation helpers.
//!
//! Two operations the DEM loop needs every step:
//! - advancing a particle's orientation quaternion by its angular velocity
//! - carrying an accumulated contact spring along when the contact
//!   normal rotates between steps

use glam::{DQuat, DVec3};

/// Advance `orientation` by angular velocity `omega` over `dt`.
///
/// Uses the exact rotation for the (constant) angular velocity over the
/// step, so the result stays a unit quaternion without drift.
pub fn integrate_orientation(orientation: DQuat, omega: DVec3, dt: f64) -> DQuat {
    let angle = omega.length() * dt;
    if angle <= 0.0 || !angle.is_finite() {
        return orientation;
    }
    let delta = DQuat::from_axis_angle(omega.normalize(), angle);
    (delta * orientation).normalize()
}

/// Rotate `v` into the plane orthogonal to the unit vector `normal`,
/// preserving its length.
///
/// A spring that was tangential to last step's normal gets its normal
/// component removed and is then rescaled to its previous magnitude, so
/// rigid rotation of the contact neither creates nor destroys stored
/// elastic energy.
pub fn rotate_into_plane(v: DVec3, normal: DVec3) -> DVec3 {
    let length_sq = v.length_squared();
    if length_sq == 0.0 {
        return v;
    }
    let projected = v - normal * v.dot(normal);
    let projected_sq = projected.length_squared();
    if projected_sq <= length_sq * 1e-24 {
        // Spring aligned with the new normal: no meaningful tangential direction.
        return DVec3::ZERO;
    }
    projected * (length_sq / projected_sq).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_angular_velocity_keeps_orientation() {
        let q = DQuat::from_rotation_z(0.3);
        assert_eq!(integrate_orientation(q, DVec3::ZERO, 0.1), q);
    }

    #[test]
    fn quarter_turn_about_z() {
        let q = integrate_orientation(
            DQuat::IDENTITY,
            DVec3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2),
            1.0,
        );
        let x = q * DVec3::X;
        assert!((x - DVec3::Y).length() < 1e-12);
    }

    #[test]
    fn rotate_into_plane_preserves_length() {
        let v = DVec3::new(1.0, 0.0, 0.2);
        let out = rotate_into_plane(v, DVec3::Z);
        assert!(out.z.abs() < 1e-15);
        assert!((out.length() - v.length()).abs() < 1e-12);
    }

    #[test]
    fn rotate_parallel_vector_vanishes() {
        let out = rotate_into_plane(DVec3::new(0.0, 0.0, 3.0), DVec3::Z);
        assert_eq!(out, DVec3::ZERO);
    }
}
