//! Boundaries that insert or delete particles before each step.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use talus_math::Vec3;
use talus_types::{Scalar, SpeciesId, TalusError, TalusResult};

use crate::context::RunContext;
use crate::particle::Particle;
use crate::world::World;

/// What a boundary did during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundaryReport {
    pub inserted: u32,
    pub failed_attempts: u32,
    pub removed: u32,
}

impl BoundaryReport {
    /// Returns true if the boundary changed nothing.
    pub fn is_idle(&self) -> bool {
        self.inserted == 0 && self.removed == 0
    }
}

/// Trait for insertion and deletion boundaries.
pub trait Boundary: Send {
    /// Runs once per step, after forces are reset and before contacts are
    /// evaluated.
    fn check_before_step(
        &mut self,
        world: &mut World,
        context: &RunContext,
    ) -> TalusResult<BoundaryReport>;

    /// Returns a human-readable name for this boundary.
    fn name(&self) -> &str;
}

// ─── Insertion ───────────────────────────────────────────────

/// Inserts particles at random positions inside an axis-aligned box.
///
/// Every step, candidates are drawn until `max_failed_attempts`
/// consecutive candidates overlap something, or the particle cap is hit.
#[derive(Debug, Clone)]
pub struct CuboidInsertionBoundary {
    min: Vec3,
    max: Vec3,
    radius_min: Scalar,
    radius_max: Scalar,
    velocity_min: Vec3,
    velocity_max: Vec3,
    species: SpeciesId,
    max_failed_attempts: u32,
    max_particles: Option<usize>,
    inserted_total: usize,
    rng: ChaCha8Rng,
}

impl CuboidInsertionBoundary {
    /// Creates an insertion box for particles of `species` with radii drawn
    /// uniformly from `[radius_min, radius_max]`. Particles start at rest.
    pub fn new(
        min: Vec3,
        max: Vec3,
        radius_min: Scalar,
        radius_max: Scalar,
        species: SpeciesId,
        seed: u64,
    ) -> TalusResult<Self> {
        if min.cmpgt(max).any() || !(min.is_finite() && max.is_finite()) {
            return Err(TalusError::InvalidConfig(format!(
                "insertion box min {min:?} must not exceed max {max:?}"
            )));
        }
        if !(radius_min > 0.0 && radius_min <= radius_max && radius_max.is_finite()) {
            return Err(TalusError::InvalidConfig(format!(
                "insertion radii must satisfy 0 < {radius_min} <= {radius_max}"
            )));
        }
        Ok(Self {
            min,
            max,
            radius_min,
            radius_max,
            velocity_min: Vec3::ZERO,
            velocity_max: Vec3::ZERO,
            species,
            max_failed_attempts: 100,
            max_particles: None,
            inserted_total: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Draws initial velocities uniformly from the box `[min, max]`.
    pub fn with_velocity_range(mut self, min: Vec3, max: Vec3) -> TalusResult<Self> {
        if min.cmpgt(max).any() {
            return Err(TalusError::InvalidConfig(format!(
                "velocity range min {min:?} must not exceed max {max:?}"
            )));
        }
        self.velocity_min = min;
        self.velocity_max = max;
        Ok(self)
    }

    /// Consecutive failures that end insertion for the current step.
    pub fn with_max_failed_attempts(mut self, attempts: u32) -> Self {
        self.max_failed_attempts = attempts.max(1);
        self
    }

    /// Stops inserting once this boundary has created `count` particles.
    pub fn with_max_particles(mut self, count: usize) -> Self {
        self.max_particles = Some(count);
        self
    }

    /// Particles created so far.
    pub fn inserted_total(&self) -> usize {
        self.inserted_total
    }

    fn is_exhausted(&self) -> bool {
        self.max_particles
            .is_some_and(|cap| self.inserted_total >= cap)
    }

    fn sample(rng: &mut ChaCha8Rng, lo: Scalar, hi: Scalar) -> Scalar {
        if hi > lo {
            rng.gen_range(lo..=hi)
        } else {
            lo
        }
    }

    fn sample_vec(rng: &mut ChaCha8Rng, lo: Vec3, hi: Vec3) -> Vec3 {
        Vec3::new(
            Self::sample(rng, lo.x, hi.x),
            Self::sample(rng, lo.y, hi.y),
            Self::sample(rng, lo.z, hi.z),
        )
    }

    /// Draws a candidate particle whose sphere lies inside the box where
    /// the box is wide enough.
    fn candidate(&mut self, dimension: u8) -> Particle {
        let radius = Self::sample(&mut self.rng, self.radius_min, self.radius_max);
        let margin = Vec3::splat(radius);
        let lo = (self.min + margin).min(self.max - margin);
        let hi = (self.max - margin).max(self.min + margin);
        let centre = 0.5 * (self.min + self.max);
        let axis = |lo: Scalar, hi: Scalar, c: Scalar| if lo <= hi { (lo, hi) } else { (c, c) };
        let (x0, x1) = axis(lo.x, hi.x, centre.x);
        let (y0, y1) = axis(lo.y, hi.y, centre.y);
        let (z0, z1) = axis(lo.z, hi.z, centre.z);
        let mut position = Self::sample_vec(
            &mut self.rng,
            Vec3::new(x0, y0, z0),
            Vec3::new(x1, y1, z1),
        );
        if dimension == 2 {
            position.z = 0.0;
        }
        let velocity = Self::sample_vec(&mut self.rng, self.velocity_min, self.velocity_max);
        Particle::new(self.species, position, radius).with_velocity(velocity)
    }
}

impl Boundary for CuboidInsertionBoundary {
    fn check_before_step(
        &mut self,
        world: &mut World,
        context: &RunContext,
    ) -> TalusResult<BoundaryReport> {
        let mut report = BoundaryReport::default();
        let mut consecutive_failures = 0;
        while !self.is_exhausted() && consecutive_failures < self.max_failed_attempts {
            let candidate = self.candidate(world.dimension());
            if world.overlaps_anything(candidate.position, candidate.radius()) {
                consecutive_failures += 1;
                report.failed_attempts += 1;
                continue;
            }
            consecutive_failures = 0;
            world.add_particle(candidate)?;
            self.inserted_total += 1;
            report.inserted += 1;
        }
        if report.inserted > 0 {
            tracing::debug!(
                step = context.step,
                inserted = report.inserted,
                failed = report.failed_attempts,
                total = self.inserted_total,
                "cuboid insertion"
            );
        }
        Ok(report)
    }

    fn name(&self) -> &str {
        "cuboid_insertion"
    }
}

// ─── Deletion ────────────────────────────────────────────────

/// Deletes every particle whose centre lies beyond a plane:
/// `normal . x > offset`.
#[derive(Debug, Clone)]
pub struct PlaneDeletionBoundary {
    normal: Vec3,
    offset: Scalar,
    removed_total: usize,
}

impl PlaneDeletionBoundary {
    /// `normal` need not be unit length; it is normalized together with
    /// `offset`.
    pub fn new(normal: Vec3, offset: Scalar) -> TalusResult<Self> {
        let length = normal.length();
        if !(length > 0.0 && length.is_finite() && offset.is_finite()) {
            return Err(TalusError::InvalidConfig(format!(
                "deletion plane needs a non-zero normal, got {normal:?}"
            )));
        }
        Ok(Self {
            normal: normal / length,
            offset: offset / length,
            removed_total: 0,
        })
    }

    /// Plane through `point`, deleting on the side `normal` points to.
    pub fn through_point(normal: Vec3, point: Vec3) -> TalusResult<Self> {
        Self::new(normal, normal.dot(point))
    }

    /// Particles removed so far.
    pub fn removed_total(&self) -> usize {
        self.removed_total
    }
}

impl Boundary for PlaneDeletionBoundary {
    fn check_before_step(
        &mut self,
        world: &mut World,
        context: &RunContext,
    ) -> TalusResult<BoundaryReport> {
        let mut report = BoundaryReport::default();
        let mut index = 0;
        while index < world.particle_count() {
            if self.normal.dot(world.particles()[index].position) > self.offset {
                // The last particle moves into `index`; test it next.
                world.remove_particle(index);
                report.removed += 1;
            } else {
                index += 1;
            }
        }
        if report.removed > 0 {
            self.removed_total += report.removed as usize;
            tracing::debug!(step = context.step, removed = report.removed, "plane deletion");
        }
        Ok(report)
    }

    fn name(&self) -> &str {
        "plane_deletion"
    }
}
