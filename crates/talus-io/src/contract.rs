//! Scenario input contract.
//!
//! A [`SimulationInput`] describes a complete run: engine configuration,
//! species, walls, initial particles, insertion and deletion boundaries and
//! the output channels. It deserializes from TOML (the CLI format) or JSON.
//!
//! ```toml
//! name = "hopper"
//!
//! [config]
//! dt = 2e-6
//! max_time = 0.05
//!
//! [[species]]
//! preset = "glass"
//!
//! [[walls]]
//! species = "glass"
//! type = "plane"
//! normal = [0.0, 0.0, 1.0]
//! point = [0.0, 0.0, 0.0]
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use talus_contact::{HelixBlade, Wall};
use talus_math::Vec3;
use talus_solver::{
    CuboidInsertionBoundary, Engine, EngineConfig, Particle, PlaneDeletionBoundary,
};
use talus_species::{presets, ContactParameters, Species, SpeciesTable};
use talus_types::{Scalar, SpeciesId, TalusError, TalusResult};

use crate::data_file::DataFileWriter;
use crate::energy_file::EnergyFileWriter;
use crate::fstat::FStatWriter;
use crate::restart::RestartWriter;
use crate::snapshot::SnapshotWriter;
use crate::validator::validate_input;

/// Complete input specification for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    /// Run name, used as the stem of every output file.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub config: EngineConfig,
    pub species: Vec<SpeciesSpec>,
    /// Explicit parameters for pairs of different species.
    #[serde(default)]
    pub mixed: Vec<MixedSpec>,
    #[serde(default)]
    pub walls: Vec<WallSpec>,
    #[serde(default)]
    pub particles: Vec<ParticleSpec>,
    #[serde(default)]
    pub insertion: Vec<InsertionSpec>,
    #[serde(default)]
    pub deletion: Vec<DeletionSpec>,
    #[serde(default)]
    pub output: OutputSpec,
}

fn default_name() -> String {
    "talus".to_string()
}

/// One species, either a built-in preset, a preset recalibrated to a
/// collision time and restitution, or a fully specified material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeciesSpec {
    Preset {
        /// Name of the preset (`glass`, `sand`, `steel`, `frictionless`).
        preset: String,
        /// Registers the preset under another name.
        #[serde(default)]
        name: Option<String>,
    },
    Calibrated {
        name: String,
        density: Scalar,
        collision_time: Scalar,
        restitution: Scalar,
        /// Radius of the particles the calibration targets.
        radius: Scalar,
        #[serde(default)]
        sliding_friction: Scalar,
    },
    Custom(Species),
}

impl SpeciesSpec {
    /// Resolves this entry to a species for a run in `dimension`.
    pub fn resolve(&self, dimension: u8) -> TalusResult<Species> {
        match self {
            SpeciesSpec::Preset { preset, name } => {
                let mut species = presets::by_name(preset).ok_or_else(|| {
                    TalusError::InvalidSpecies(format!("unknown preset '{preset}'"))
                })?;
                if let Some(name) = name {
                    species.name = name.clone();
                }
                Ok(species)
            }
            SpeciesSpec::Calibrated {
                name,
                density,
                collision_time,
                restitution,
                radius,
                sliding_friction,
            } => {
                let mut species = Species::new(name.clone(), *density, ContactParameters::default());
                let mass = species.particle_mass(*radius, dimension);
                if !species.set_collision_time_and_restitution(*collision_time, *restitution, mass) {
                    return Err(TalusError::InvalidSpecies(format!(
                        "species '{name}': cannot calibrate to collision time {collision_time} and restitution {restitution}"
                    )));
                }
                if *sliding_friction > 0.0 && !species.set_sliding_friction(*sliding_friction) {
                    return Err(TalusError::InvalidSpecies(format!(
                        "species '{name}': invalid sliding friction {sliding_friction}"
                    )));
                }
                Ok(species)
            }
            SpeciesSpec::Custom(species) => Ok(species.clone()),
        }
    }
}

/// Explicit parameters between species `a` and `b`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixedSpec {
    pub a: String,
    pub b: String,
    pub contact: ContactParameters,
}

/// Geometry of a wall as written in an input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WallGeometry {
    /// Plane through `point`; particles live on the side `normal` points to.
    Plane { normal: Vec3, point: Vec3 },
    /// Solid box; particles live outside.
    Cuboid { min: Vec3, max: Vec3 },
    /// Cylinder; particles live inside.
    Cylinder { origin: Vec3, axis: Vec3, radius: Scalar },
    Helix(HelixBlade),
}

/// A wall of a named species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallSpec {
    pub species: String,
    #[serde(flatten)]
    pub geometry: WallGeometry,
    #[serde(default)]
    pub velocity: Vec3,
}

impl WallSpec {
    /// Builds the wall for species `id`.
    pub fn to_wall(&self, id: SpeciesId) -> Wall {
        let wall = match &self.geometry {
            WallGeometry::Plane { normal, point } => Wall::plane(id, *normal, *point),
            WallGeometry::Cuboid { min, max } => Wall::cuboid(id, *min, *max),
            WallGeometry::Cylinder {
                origin,
                axis,
                radius,
            } => Wall::cylinder(id, *origin, *axis, *radius),
            WallGeometry::Helix(blade) => Wall::helix(id, *blade),
        };
        wall.with_velocity(self.velocity)
    }
}

/// An initial particle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleSpec {
    pub species: String,
    pub position: Vec3,
    pub radius: Scalar,
    #[serde(default)]
    pub velocity: Vec3,
    #[serde(default)]
    pub angular_velocity: Vec3,
    #[serde(default)]
    pub fixed: bool,
}

/// Random insertion into an axis-aligned box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertionSpec {
    pub species: String,
    pub min: Vec3,
    pub max: Vec3,
    pub radius_min: Scalar,
    pub radius_max: Scalar,
    #[serde(default)]
    pub velocity_min: Vec3,
    #[serde(default)]
    pub velocity_max: Vec3,
    #[serde(default = "default_failed_attempts")]
    pub max_failed_attempts: u32,
    #[serde(default)]
    pub max_particles: Option<usize>,
    #[serde(default)]
    pub seed: u64,
}

fn default_failed_attempts() -> u32 {
    100
}

/// Removes particles with `normal · x > offset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionSpec {
    pub normal: Vec3,
    pub offset: Scalar,
}

/// Output channels of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSpec {
    /// Directory receiving every output file.
    pub directory: PathBuf,
    /// `.data` particle frames.
    pub data: bool,
    /// `.ene` energy time series.
    pub energy: bool,
    /// `.fstat` contact statistics.
    pub fstat: bool,
    /// `.restart` state, overwritten every frame.
    pub restart: bool,
    /// Binary snapshot per frame.
    pub snapshot: bool,
    /// Significant digits of the text formats.
    pub precision: usize,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            data: true,
            energy: true,
            fstat: false,
            restart: true,
            snapshot: false,
            precision: 6,
        }
    }
}

impl SimulationInput {
    /// Parses a TOML input file.
    pub fn from_toml(source: &str) -> TalusResult<Self> {
        toml::from_str(source).map_err(|e| TalusError::Serialization(e.to_string()))
    }

    /// Parses a JSON input document.
    pub fn from_json(source: &str) -> TalusResult<Self> {
        serde_json::from_str(source).map_err(|e| TalusError::Serialization(e.to_string()))
    }

    /// Serializes to TOML.
    pub fn to_toml(&self) -> TalusResult<String> {
        toml::to_string_pretty(self).map_err(|e| TalusError::Serialization(e.to_string()))
    }

    /// Resolves every species entry and the explicit mixed pairs.
    pub fn species_table(&self) -> TalusResult<SpeciesTable> {
        let mut table = SpeciesTable::new();
        for spec in &self.species {
            table.add(spec.resolve(self.config.dimension)?)?;
        }
        for mixed in &self.mixed {
            let a = lookup(&table, &mixed.a)?;
            let b = lookup(&table, &mixed.b)?;
            table.set_mixed(a, b, mixed.contact)?;
        }
        Ok(table)
    }
}

/// Id of the species called `name`.
pub(crate) fn lookup(table: &SpeciesTable, name: &str) -> TalusResult<SpeciesId> {
    table
        .by_name(name)
        .ok_or_else(|| TalusError::InvalidSpecies(format!("unknown species '{name}'")))
}

/// Validates `input` and assembles a ready engine with its walls,
/// particles, boundaries and output writers.
pub fn build_engine(input: &SimulationInput) -> TalusResult<Engine> {
    let report = validate_input(input)?;
    for warning in &report.warnings {
        tracing::warn!("{warning}");
    }

    let table = input.species_table()?;
    let mut engine = Engine::new(input.config.clone(), table)?.with_name(input.name.clone());

    let world = engine.world_mut();
    for spec in &input.walls {
        let id = lookup(world.species(), &spec.species)?;
        world.add_wall(spec.to_wall(id))?;
    }
    for spec in &input.particles {
        let id = lookup(world.species(), &spec.species)?;
        let particle = Particle::new(id, spec.position, spec.radius)
            .with_velocity(spec.velocity)
            .with_angular_velocity(spec.angular_velocity)
            .with_fixed(spec.fixed);
        world.add_particle(particle)?;
    }

    for spec in &input.insertion {
        let id = lookup(engine.world().species(), &spec.species)?;
        let mut boundary = CuboidInsertionBoundary::new(
            spec.min,
            spec.max,
            spec.radius_min,
            spec.radius_max,
            id,
            spec.seed,
        )?
        .with_velocity_range(spec.velocity_min, spec.velocity_max)?
        .with_max_failed_attempts(spec.max_failed_attempts);
        if let Some(cap) = spec.max_particles {
            boundary = boundary.with_max_particles(cap);
        }
        engine.add_boundary(Box::new(boundary));
    }
    for spec in &input.deletion {
        engine.add_boundary(Box::new(PlaneDeletionBoundary::new(spec.normal, spec.offset)?));
    }

    let out = &input.output;
    if out.data {
        engine.add_output(Box::new(DataFileWriter::new(&out.directory).with_precision(out.precision)));
    }
    if out.energy {
        engine.add_output(Box::new(EnergyFileWriter::new(&out.directory).with_precision(out.precision)));
    }
    if out.fstat {
        engine.add_output(Box::new(FStatWriter::new(&out.directory).with_precision(out.precision)));
    }
    if out.restart {
        engine.add_output(Box::new(RestartWriter::new(&out.directory)));
    }
    if out.snapshot {
        engine.add_output(Box::new(SnapshotWriter::new(&out.directory)));
    }
    Ok(engine)
}
