//! Rigid walls.
//!
//! A closed set of shapes, each answering one question: how far is a
//! sphere's centre from the wall surface, and in which direction. The
//! answer is only reported when the sphere actually touches the wall
//! (`distance < radius`).
//!
//! Walls may translate with a constant velocity; helix blades also spin
//! about their axis. Neither changes the shape, so `advance` only moves
//! offsets, origins and the blade phase.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use talus_math::Vec3;
use talus_types::{Scalar, SpeciesId, TalusError, TalusResult, WallId};

/// Tolerance on unit vectors supplied by the user.
const UNIT_TOLERANCE: Scalar = 1e-6;

/// One face of a convex solid: the solid lies where `normal · x <= offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HalfSpace {
    /// Outward unit normal.
    pub normal: Vec3,
    /// Signed distance of the face from the origin along `normal`.
    pub offset: Scalar,
}

impl HalfSpace {
    #[inline]
    fn signed_distance(&self, x: Vec3) -> Scalar {
        self.normal.dot(x) - self.offset
    }

    #[inline]
    fn project(&self, x: Vec3) -> Vec3 {
        let d = self.signed_distance(x);
        if d > 0.0 {
            x - self.normal * d
        } else {
            x
        }
    }
}

/// A screw blade winding around an axis, as used in screw conveyors.
///
/// The blade surface is the helicoid `z = pitch (theta - angle) / 2π`
/// (mod `pitch`) in the frame of the axis, between radius 0 and `radius`
/// and axial position 0 and `length`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HelixBlade {
    /// Start of the axis.
    pub origin: Vec3,
    /// Unit axis direction.
    pub axis: Vec3,
    /// Axial extent of the blade.
    pub length: Scalar,
    /// Outer radius of the blade.
    pub radius: Scalar,
    /// Axial advance per full turn.
    pub pitch: Scalar,
    /// Blade thickness.
    pub thickness: Scalar,
    /// Current rotation phase (rad).
    pub angle: Scalar,
    /// Spin rate about `axis` (rad/s).
    pub angular_velocity: Scalar,
}

impl HelixBlade {
    /// Right-handed basis `(e1, e2)` perpendicular to the axis; the blade
    /// phase is measured from `e1` towards `e2`.
    fn basis(&self) -> (Vec3, Vec3) {
        let e1 = self.axis.any_orthonormal_vector();
        (e1, self.axis.cross(e1))
    }

    fn distance_and_normal(&self, position: Vec3, radius: Scalar) -> Option<(Scalar, Vec3)> {
        let rel = position - self.origin;
        let z = rel.dot(self.axis);
        if z < -radius || z > self.length + radius {
            return None;
        }
        let radial = rel - self.axis * z;
        let r = radial.length();
        if r > self.radius + radius {
            return None;
        }

        let (e1, e2) = self.basis();
        let theta = radial.dot(e2).atan2(radial.dot(e1));
        let lead = self.pitch / TAU;
        let mut dz = z - lead * (theta - self.angle);
        dz -= self.pitch * (dz / self.pitch).round();

        // Blade surface point below/above the centre must lie on the blade.
        let z_surface = z - dz;
        if z_surface < 0.0 || z_surface > self.length {
            return None;
        }

        let r_eff = r.max(1e-12 * self.radius.max(1.0));
        let radial_dir = if r > 0.0 { radial / r } else { e1 };
        let tangential_dir = self.axis.cross(radial_dir);
        // Gradient of z - lead * theta, normalized.
        let gradient = self.axis - tangential_dir * (lead / r_eff);
        let slope = gradient.length();
        let side = if dz >= 0.0 { 1.0 } else { -1.0 };
        let sheet_normal = gradient / slope * side;
        let sheet_distance = dz.abs() / slope - 0.5 * self.thickness;

        let (distance, normal) = if r > self.radius {
            // Beyond the blade edge: distance to the rim.
            let excess = r - self.radius;
            let across = sheet_distance.max(0.0);
            let distance = (excess * excess + across * across).sqrt();
            let direction = radial_dir * excess + sheet_normal * across;
            let normal = direction.try_normalize().unwrap_or(radial_dir);
            (distance, normal)
        } else {
            (sheet_distance, sheet_normal)
        };

        (distance < radius).then_some((distance, normal))
    }
}

/// Closed set of wall geometries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WallShape {
    /// Infinite plane; particles live where `normal · x >= offset`.
    Plane { normal: Vec3, offset: Scalar },
    /// Finite convex solid; particles live outside.
    Polygon { faces: Vec<HalfSpace> },
    /// Infinite cylinder; particles live inside.
    Cylinder {
        axis_origin: Vec3,
        axis: Vec3,
        radius: Scalar,
    },
    /// Rotating screw blade.
    Helix(HelixBlade),
}

/// A rigid wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    /// Position in the wall list.
    pub id: WallId,
    /// Material of the wall surface.
    pub species: SpeciesId,
    /// Geometry.
    pub shape: WallShape,
    /// Translation velocity.
    #[serde(default)]
    pub velocity: Vec3,
    /// Force accumulated from contacts this step.
    #[serde(skip)]
    pub force: Vec3,
    /// Torque about the origin accumulated from contacts this step.
    #[serde(skip)]
    pub torque: Vec3,
}

impl Wall {
    /// Creates a static wall. The id is assigned when the wall joins a world.
    pub fn new(species: SpeciesId, shape: WallShape) -> Self {
        Self {
            id: WallId(0),
            species,
            shape,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
        }
    }

    /// Plane through `point` with particles on the side `normal` points to.
    pub fn plane(species: SpeciesId, normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self::new(
            species,
            WallShape::Plane {
                normal,
                offset: normal.dot(point),
            },
        )
    }

    /// Solid axis-aligned box between `min` and `max`.
    pub fn cuboid(species: SpeciesId, min: Vec3, max: Vec3) -> Self {
        let faces = vec![
            HalfSpace { normal: Vec3::X, offset: max.x },
            HalfSpace { normal: -Vec3::X, offset: -min.x },
            HalfSpace { normal: Vec3::Y, offset: max.y },
            HalfSpace { normal: -Vec3::Y, offset: -min.y },
            HalfSpace { normal: Vec3::Z, offset: max.z },
            HalfSpace { normal: -Vec3::Z, offset: -min.z },
        ];
        Self::new(species, WallShape::Polygon { faces })
    }

    /// Cylinder of `radius` around the line through `origin` along `axis`.
    pub fn cylinder(species: SpeciesId, origin: Vec3, axis: Vec3, radius: Scalar) -> Self {
        Self::new(
            species,
            WallShape::Cylinder {
                axis_origin: origin,
                axis: axis.normalize_or_zero(),
                radius,
            },
        )
    }

    /// Screw blade; see [`HelixBlade`].
    pub fn helix(species: SpeciesId, blade: HelixBlade) -> Self {
        Self::new(species, WallShape::Helix(blade))
    }

    /// Sets the translation velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Checks the geometry is well formed.
    pub fn validate(&self) -> TalusResult<()> {
        let fail = |msg: String| Err(TalusError::InvalidWall(format!("wall {}: {msg}", self.id.0)));
        let unit = |v: Vec3| (v.length() - 1.0).abs() <= UNIT_TOLERANCE;
        if !self.velocity.is_finite() {
            return fail("velocity must be finite".into());
        }
        match &self.shape {
            WallShape::Plane { normal, offset } => {
                if !unit(*normal) {
                    return fail(format!("plane normal {normal} is not a unit vector"));
                }
                if !offset.is_finite() {
                    return fail("plane offset must be finite".into());
                }
            }
            WallShape::Polygon { faces } => {
                if faces.is_empty() {
                    return fail("polygon needs at least one face".into());
                }
                if let Some(face) = faces.iter().find(|f| !unit(f.normal)) {
                    return fail(format!("polygon face normal {} is not a unit vector", face.normal));
                }
            }
            WallShape::Cylinder { axis, radius, .. } => {
                if !unit(*axis) {
                    return fail(format!("cylinder axis {axis} is not a unit vector"));
                }
                if !(*radius > 0.0 && radius.is_finite()) {
                    return fail(format!("cylinder radius must be positive, got {radius}"));
                }
            }
            WallShape::Helix(blade) => {
                if !unit(blade.axis) {
                    return fail(format!("helix axis {} is not a unit vector", blade.axis));
                }
                let positive = [
                    ("length", blade.length),
                    ("radius", blade.radius),
                    ("pitch", blade.pitch),
                ];
                for (name, value) in positive {
                    if !(value > 0.0 && value.is_finite()) {
                        return fail(format!("helix {name} must be positive, got {value}"));
                    }
                }
                if !(blade.thickness >= 0.0 && blade.thickness < blade.pitch) {
                    return fail(format!(
                        "helix thickness must be in [0, pitch), got {}",
                        blade.thickness
                    ));
                }
            }
        }
        Ok(())
    }

    /// Distance from `position` to the wall surface and the unit normal
    /// from the surface towards `position`, if a sphere of `radius` at
    /// `position` touches the wall.
    pub fn distance_and_normal(&self, position: Vec3, radius: Scalar) -> Option<(Scalar, Vec3)> {
        match &self.shape {
            WallShape::Plane { normal, offset } => {
                let distance = normal.dot(position) - offset;
                (distance < radius).then_some((distance, *normal))
            }
            WallShape::Polygon { faces } => polygon_distance(faces, position, radius),
            WallShape::Cylinder {
                axis_origin,
                axis,
                radius: wall_radius,
            } => {
                let rel = position - *axis_origin;
                let radial = rel - *axis * rel.dot(*axis);
                let r = radial.length();
                let distance = wall_radius - r;
                if distance >= radius {
                    return None;
                }
                let outward = if r > 0.0 {
                    radial / r
                } else {
                    axis.any_orthonormal_vector()
                };
                Some((distance, -outward))
            }
            WallShape::Helix(blade) => blade.distance_and_normal(position, radius),
        }
    }

    /// Velocity of the wall surface at `point`.
    pub fn velocity_at(&self, point: Vec3) -> Vec3 {
        match &self.shape {
            WallShape::Helix(blade) => {
                self.velocity + (blade.axis * blade.angular_velocity).cross(point - blade.origin)
            }
            _ => self.velocity,
        }
    }

    /// Angular velocity of the wall.
    pub fn angular_velocity(&self) -> Vec3 {
        match &self.shape {
            WallShape::Helix(blade) => blade.axis * blade.angular_velocity,
            _ => Vec3::ZERO,
        }
    }

    /// Moves the wall by one step of its prescribed motion.
    pub fn advance(&mut self, dt: Scalar) {
        let shift = self.velocity * dt;
        match &mut self.shape {
            WallShape::Plane { normal, offset } => *offset += normal.dot(shift),
            WallShape::Polygon { faces } => {
                for face in faces {
                    face.offset += face.normal.dot(shift);
                }
            }
            WallShape::Cylinder { axis_origin, .. } => *axis_origin += shift,
            WallShape::Helix(blade) => {
                blade.origin += shift;
                blade.angle = (blade.angle + blade.angular_velocity * dt).rem_euclid(TAU);
            }
        }
    }

    /// Clears the force and torque accumulators.
    pub fn reset_force(&mut self) {
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    /// Short name of the shape, for logs and file headers.
    pub fn kind(&self) -> &'static str {
        match self.shape {
            WallShape::Plane { .. } => "plane",
            WallShape::Polygon { .. } => "polygon",
            WallShape::Cylinder { .. } => "cylinder",
            WallShape::Helix(_) => "helix",
        }
    }
}

/// Distance from `x` to the surface of a convex solid, from outside.
///
/// When a single face is violated and its foot point lies on the solid,
/// that face is the answer. Otherwise (edges, corners) the closest point is
/// found by Dykstra's alternating projections onto the faces.
fn polygon_distance(faces: &[HalfSpace], x: Vec3, radius: Scalar) -> Option<(Scalar, Vec3)> {
    let (face_idx, max_d) = faces
        .iter()
        .enumerate()
        .map(|(i, f)| (i, f.signed_distance(x)))
        .fold((0, Scalar::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
    if max_d >= radius {
        return None;
    }
    if max_d <= 0.0 {
        // Centre inside the solid: push out through the nearest face.
        return Some((max_d, faces[face_idx].normal));
    }

    let face = &faces[face_idx];
    let foot = x - face.normal * max_d;
    let tolerance = 1e-12 * (1.0 + x.length());
    if faces.iter().all(|f| f.signed_distance(foot) <= tolerance) {
        return Some((max_d, face.normal));
    }

    let closest = dykstra_projection(faces, x);
    let offset = x - closest;
    let distance = offset.length();
    if distance >= radius {
        return None;
    }
    let normal = offset.try_normalize().unwrap_or(face.normal);
    Some((distance, normal))
}

fn dykstra_projection(faces: &[HalfSpace], x: Vec3) -> Vec3 {
    const MAX_SWEEPS: usize = 200;
    let mut point = x;
    let mut increments = vec![Vec3::ZERO; faces.len()];
    for _ in 0..MAX_SWEEPS {
        let previous = point;
        for (face, inc) in faces.iter().zip(increments.iter_mut()) {
            let shifted = point + *inc;
            point = face.project(shifted);
            *inc = shifted - point;
        }
        if (point - previous).length_squared() < 1e-30 {
            break;
        }
    }
    point
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_reports_only_touching_spheres() {
        let wall = Wall::plane(SpeciesId(0), Vec3::Z, Vec3::ZERO);
        assert!(wall.distance_and_normal(Vec3::new(0.0, 0.0, 2.0), 1.0).is_none());
        let (d, n) = wall.distance_and_normal(Vec3::new(3.0, 1.0, 0.5), 1.0).unwrap();
        assert!((d - 0.5).abs() < 1e-15);
        assert_eq!(n, Vec3::Z);
    }

    #[test]
    fn cuboid_edge_distance() {
        let wall = Wall::cuboid(SpeciesId(0), Vec3::ZERO, Vec3::ONE);
        // Diagonally off the edge x = 1, y = 1.
        let p = Vec3::new(1.3, 1.4, 0.5);
        let (d, n) = wall.distance_and_normal(p, 1.0).unwrap();
        assert!((d - 0.5).abs() < 1e-9);
        assert!((n - Vec3::new(0.6, 0.8, 0.0)).length() < 1e-6);
    }

    #[test]
    fn cylinder_normal_points_inwards() {
        let wall = Wall::cylinder(SpeciesId(0), Vec3::ZERO, Vec3::Z, 1.0);
        let (d, n) = wall.distance_and_normal(Vec3::new(0.95, 0.0, 7.0), 0.1).unwrap();
        assert!((d - 0.05).abs() < 1e-12);
        assert!((n + Vec3::X).length() < 1e-12);
    }

    #[test]
    fn helix_blade_below_sphere() {
        let blade = HelixBlade {
            origin: Vec3::ZERO,
            axis: Vec3::Z,
            length: 1.0,
            radius: 0.1,
            pitch: 0.1,
            thickness: 0.0,
            angle: 0.0,
            angular_velocity: 0.0,
        };
        let wall = Wall::helix(SpeciesId(0), blade);
        let (e1, _) = blade.basis();
        // Far from the axis the blade is nearly flat; 5 mm above the sheet.
        let p = e1 * 0.09 + Vec3::Z * 0.505;
        let (d, n) = wall.distance_and_normal(p, 0.01).unwrap();
        let lead = 0.1 / TAU;
        let expected = 0.005 / (1.0 + (lead / 0.09).powi(2)).sqrt();
        assert!((d - expected).abs() < 1e-12);
        assert!(n.z > 0.0);
    }

    #[test]
    fn advance_moves_offset_and_phase() {
        let mut wall = Wall::plane(SpeciesId(0), Vec3::Z, Vec3::ZERO).with_velocity(Vec3::Z);
        wall.advance(0.5);
        match wall.shape {
            WallShape::Plane { offset, .. } => assert!((offset - 0.5).abs() < 1e-15),
            _ => unreachable!(),
        }
    }
}
