//! Input validation.
//!
//! Validates a [`SimulationInput`] before an engine is built, catching
//! data-level errors early with clear diagnostics.

use talus_math::Vec3;
use talus_types::constants::TIMESTEP_COLLISION_FRACTION;
use talus_types::{Scalar, TalusError, TalusResult};

use crate::contract::{lookup, SimulationInput, WallGeometry};

/// Tolerance on the length of normals and axes.
const UNIT_TOLERANCE: Scalar = 1e-6;

/// Findings of a successful validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Problems that do not stop a run.
    pub warnings: Vec<String>,
    /// Shortest binary collision time over the species pairs in use.
    pub shortest_collision_time: Option<Scalar>,
    /// Initial particles.
    pub particles: usize,
    /// Walls.
    pub walls: usize,
}

impl ValidationReport {
    /// Largest timestep that resolves every collision in 50 steps.
    pub fn suggested_timestep(&self) -> Option<Scalar> {
        self.shortest_collision_time
            .map(|tc| tc * TIMESTEP_COLLISION_FRACTION)
    }
}

fn is_unit(v: Vec3) -> bool {
    (v.length() - 1.0).abs() <= UNIT_TOLERANCE
}

fn positive(value: Scalar) -> bool {
    value > 0.0 && value.is_finite()
}

/// Validates a complete simulation input.
///
/// Checks:
/// - engine configuration (timestep, duration, dimension, grid)
/// - every species resolves and every reference names a known species
/// - wall normals and axes are unit vectors
/// - particle and insertion radii are positive
/// - the timestep is shorter than the shortest collision time
pub fn validate_input(input: &SimulationInput) -> TalusResult<ValidationReport> {
    input.config.validate()?;
    if input.name.is_empty() || input.name.chars().any(char::is_whitespace) {
        return Err(TalusError::InvalidConfig(format!(
            "run name '{}' must be non-empty and contain no whitespace",
            input.name
        )));
    }
    if input.species.is_empty() {
        return Err(TalusError::InvalidSpecies("at least one species is required".into()));
    }
    let table = input.species_table()?;
    let mut report = ValidationReport {
        particles: input.particles.len(),
        walls: input.walls.len(),
        ..Default::default()
    };

    let mut wall_species = Vec::with_capacity(input.walls.len());
    for (i, wall) in input.walls.iter().enumerate() {
        let id = lookup(&table, &wall.species)?;
        let fail = |msg: String| Err(TalusError::InvalidWall(format!("wall {i}: {msg}")));
        match &wall.geometry {
            WallGeometry::Plane { normal, .. } if !is_unit(*normal) => {
                return fail(format!("normal {normal} is not a unit vector"));
            }
            WallGeometry::Cylinder { axis, .. } if !is_unit(*axis) => {
                return fail(format!("axis {axis} is not a unit vector"));
            }
            WallGeometry::Helix(blade) if !is_unit(blade.axis) => {
                return fail(format!("axis {} is not a unit vector", blade.axis));
            }
            WallGeometry::Cuboid { min, max } if min.cmpgt(*max).any() => {
                return fail(format!("min {min} exceeds max {max}"));
            }
            _ => {}
        }
        wall.to_wall(id).validate()?;
        wall_species.push(id);
    }

    // Lightest (mass, radius) per species and the fastest expected speed.
    let mut lightest: Vec<Option<(Scalar, Scalar)>> = vec![None; table.len()];
    let mut max_speed: Scalar = 0.0;
    let dimension = input.config.dimension;
    let mut note = |id: talus_types::SpeciesId, radius: Scalar| {
        if let Some(species) = table.get(id) {
            let mass = species.particle_mass(radius, dimension);
            let slot = &mut lightest[id.index()];
            if slot.map_or(true, |(m, _)| mass < m) {
                *slot = Some((mass, radius));
            }
        }
    };

    for (i, p) in input.particles.iter().enumerate() {
        let id = lookup(&table, &p.species)?;
        if !positive(p.radius) {
            return Err(TalusError::InvalidParticle(format!(
                "particle {i}: radius must be positive, got {}",
                p.radius
            )));
        }
        if !(p.position.is_finite() && p.velocity.is_finite()) {
            return Err(TalusError::InvalidParticle(format!(
                "particle {i}: position and velocity must be finite"
            )));
        }
        if !p.fixed {
            note(id, p.radius);
            max_speed = max_speed.max(p.velocity.length());
        }
    }

    for (i, ins) in input.insertion.iter().enumerate() {
        let id = lookup(&table, &ins.species)?;
        if !positive(ins.radius_min) || ins.radius_max < ins.radius_min {
            return Err(TalusError::InvalidConfig(format!(
                "insertion {i}: radius range [{}, {}] is invalid",
                ins.radius_min, ins.radius_max
            )));
        }
        if ins.min.cmpgt(ins.max).any() {
            return Err(TalusError::InvalidConfig(format!(
                "insertion {i}: min {} exceeds max {}",
                ins.min, ins.max
            )));
        }
        note(id, ins.radius_min);
        max_speed = max_speed
            .max(ins.velocity_min.length())
            .max(ins.velocity_max.length());
    }

    for (i, del) in input.deletion.iter().enumerate() {
        if !is_unit(del.normal) {
            return Err(TalusError::InvalidConfig(format!(
                "deletion {i}: normal {} is not a unit vector",
                del.normal
            )));
        }
    }

    if input.particles.is_empty() && input.insertion.is_empty() {
        report
            .warnings
            .push("no particles and no insertion boundary: the run is empty".into());
    }

    let dt = input.config.dt;
    report.shortest_collision_time =
        table.shortest_collision_time(&lightest, &wall_species, 2.0 * max_speed);
    if let Some(tc) = report.shortest_collision_time {
        if dt >= tc {
            return Err(TalusError::InvalidConfig(format!(
                "timestep {dt} is not shorter than the shortest collision time {tc}"
            )));
        }
        let suggested = tc * TIMESTEP_COLLISION_FRACTION;
        if dt > suggested {
            report.warnings.push(format!(
                "timestep {dt} exceeds 1/50 of the shortest collision time ({suggested})"
            ));
        }
    }
    Ok(report)
}
