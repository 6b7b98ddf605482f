//! Narrow phase: exact contact tests.
//!
//! Turns a broad phase candidate into a [`ContactGeometry`] when the two
//! surfaces actually overlap, or `None` otherwise.

use talus_math::Vec3;
use talus_types::Scalar;

use crate::contact::ContactGeometry;
use crate::wall::Wall;

/// Kinematic state of a sphere, as needed by the narrow phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub radius: Scalar,
}

/// Contact between spheres `a` and `b`, if their centres are closer than
/// the sum of their radii.
pub fn particle_pair_geometry(a: &BodyState, b: &BodyState) -> Option<ContactGeometry> {
    let branch = a.position - b.position;
    let radius_sum = a.radius + b.radius;
    let distance_sq = branch.length_squared();
    if distance_sq >= radius_sum * radius_sum {
        return None;
    }
    let distance = distance_sq.sqrt();
    // Coincident centres have no defined normal; pick one deterministically.
    let normal = if distance > 0.0 {
        branch / distance
    } else {
        Vec3::Z
    };
    let overlap = radius_sum - distance;
    let arm_a = a.radius - 0.5 * overlap;
    let arm_b = b.radius - 0.5 * overlap;
    let contact_point = a.position - normal * arm_a;

    let velocity_a = a.velocity + a.angular_velocity.cross(-normal * arm_a);
    let velocity_b = b.velocity + b.angular_velocity.cross(normal * arm_b);

    Some(ContactGeometry {
        overlap,
        normal,
        contact_point,
        arm_a,
        arm_b,
        effective_radius: a.radius * b.radius / radius_sum,
        relative_velocity: velocity_a - velocity_b,
        relative_angular_velocity: a.angular_velocity - b.angular_velocity,
    })
}

/// Contact between sphere `a` and `wall`, if the sphere crosses the wall
/// surface.
pub fn particle_wall_geometry(a: &BodyState, wall: &Wall) -> Option<ContactGeometry> {
    let (distance, normal) = wall.distance_and_normal(a.position, a.radius)?;
    let overlap = a.radius - distance;
    if overlap <= 0.0 {
        return None;
    }
    let arm_a = distance.max(0.0);
    let contact_point = a.position - normal * distance;
    let velocity_a = a.velocity + a.angular_velocity.cross(-normal * arm_a);

    Some(ContactGeometry {
        overlap,
        normal,
        contact_point,
        arm_a,
        arm_b: 0.0,
        effective_radius: a.radius,
        relative_velocity: velocity_a - wall.velocity_at(contact_point),
        relative_angular_velocity: a.angular_velocity - wall.angular_velocity(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use talus_types::SpeciesId;

    fn body(x: Scalar, vx: Scalar, radius: Scalar) -> BodyState {
        BodyState {
            position: Vec3::new(x, 0.0, 0.0),
            velocity: Vec3::new(vx, 0.0, 0.0),
            angular_velocity: Vec3::ZERO,
            radius,
        }
    }

    #[test]
    fn touching_spheres_do_not_overlap() {
        assert!(particle_pair_geometry(&body(0.0, 0.0, 0.5), &body(1.0, 0.0, 0.5)).is_none());
    }

    #[test]
    fn pair_geometry_normal_points_from_b_to_a() {
        let g = particle_pair_geometry(&body(0.0, 1.0, 0.5), &body(0.9, -1.0, 0.5)).unwrap();
        assert!((g.overlap - 0.1).abs() < 1e-12);
        assert_eq!(g.normal, -Vec3::X);
        assert!((g.contact_point.x - 0.45).abs() < 1e-12);
        // Approaching: negative normal velocity.
        assert!((g.normal_velocity() + 2.0).abs() < 1e-12);
        assert!((g.effective_radius - 0.25).abs() < 1e-15);
    }

    #[test]
    fn spinning_sphere_on_floor_has_slip_velocity() {
        let floor = Wall::plane(SpeciesId(0), Vec3::Z, Vec3::ZERO);
        let a = BodyState {
            position: Vec3::new(0.0, 0.0, 0.9),
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::new(0.0, 1.0, 0.0),
            radius: 1.0,
        };
        let g = particle_wall_geometry(&a, &floor).unwrap();
        // omega × (-0.9 z) = (-0.9, 0, 0)
        assert!((g.tangential_velocity() - Vec3::new(-0.9, 0.0, 0.0)).length() < 1e-12);
        assert_eq!(g.arm_b, 0.0);
    }
}
