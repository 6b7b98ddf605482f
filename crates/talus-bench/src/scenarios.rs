//! Benchmark scenarios: species, walls, particles and boundaries for each
//! test case.
//!
//! Four canonical scenarios for regression testing:
//! 1. **Binary collision**: two calibrated beads collide head on; the
//!    measured restitution must match the calibration
//! 2. **Box settling**: a polydisperse lattice settles in a walled box
//! 3. **Cylinder pour**: particles are inserted into a cylinder and
//!    deleted once they leave through the bottom
//! 4. **Screw conveyor**: a rotating helix blade inside a cylinder

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use talus_contact::{HelixBlade, Wall};
use talus_math::Vec3;
use talus_solver::{
    Boundary, CuboidInsertionBoundary, Engine, EngineConfig, Particle, PlaneDeletionBoundary,
};
use talus_species::{presets, ContactParameters, Species, SpeciesTable};
use talus_types::{Scalar, TalusError, TalusResult};

/// Which benchmark scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    BinaryCollision,
    BoxSettling,
    CylinderPour,
    ScrewConveyor,
}

impl ScenarioKind {
    /// Returns all scenario kinds.
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::BinaryCollision,
            ScenarioKind::BoxSettling,
            ScenarioKind::CylinderPour,
            ScenarioKind::ScrewConveyor,
        ]
    }

    /// Returns a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::BinaryCollision => "binary_collision",
            ScenarioKind::BoxSettling => "box_settling",
            ScenarioKind::CylinderPour => "cylinder_pour",
            ScenarioKind::ScrewConveyor => "screw_conveyor",
        }
    }

    /// Looks a scenario up by [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<ScenarioKind> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// Radius of the binary collision beads.
pub const COLLISION_RADIUS: Scalar = 0.001;
/// Calibrated collision time of the binary collision beads.
pub const COLLISION_TIME: Scalar = 2.5e-3;
/// Calibrated restitution of the binary collision beads.
pub const COLLISION_RESTITUTION: Scalar = 0.8;

/// A fully specified benchmark scenario.
pub struct Scenario {
    pub kind: ScenarioKind,
    pub config: EngineConfig,
    pub species: SpeciesTable,
    pub walls: Vec<Wall>,
    pub particles: Vec<Particle>,
    pub boundaries: Vec<Box<dyn Boundary>>,
    /// Number of timesteps to simulate.
    pub timesteps: u64,
}

impl Scenario {
    /// Two beads calibrated to `COLLISION_TIME` and `COLLISION_RESTITUTION`
    /// approach each other at 0.05 m/s each, without gravity.
    ///
    /// They start 1e-5 apart so the measured restitution covers the whole
    /// contact.
    pub fn binary_collision() -> TalusResult<Self> {
        let mut beads = Species::new(
            "beads",
            2000.0,
            ContactParameters {
                allow_tension: true,
                ..ContactParameters::default()
            },
        );
        let mass = beads.particle_mass(COLLISION_RADIUS, 3);
        if !beads.set_collision_time_and_restitution(COLLISION_TIME, COLLISION_RESTITUTION, mass) {
            return Err(TalusError::InvalidSpecies("bead calibration failed".into()));
        }
        let mut species = SpeciesTable::new();
        let id = species.add(beads)?;

        let r = COLLISION_RADIUS;
        let gap = 0.5e-5;
        let particles = vec![
            Particle::new(id, Vec3::new(-r - gap, 0.0, 0.0), r).with_velocity(Vec3::new(0.05, 0.0, 0.0)),
            Particle::new(id, Vec3::new(r + gap, 0.0, 0.0), r).with_velocity(Vec3::new(-0.05, 0.0, 0.0)),
        ];
        Ok(Self {
            kind: ScenarioKind::BinaryCollision,
            config: EngineConfig {
                dt: COLLISION_TIME / 50.0,
                gravity: Vec3::ZERO,
                ..EngineConfig::default()
            },
            species,
            walls: Vec::new(),
            particles,
            boundaries: Vec::new(),
            timesteps: 200,
        })
    }

    /// A jittered 6×6×6 lattice of sand grains with radii in
    /// [0.8, 1.0] mm dropped into a 14 mm box.
    pub fn box_settling() -> TalusResult<Self> {
        let mut species = SpeciesTable::new();
        let sand = species.add(preset("sand")?)?;
        let size = 0.014;
        let walls = vec![
            Wall::plane(sand, Vec3::Z, Vec3::ZERO),
            Wall::plane(sand, Vec3::X, Vec3::ZERO),
            Wall::plane(sand, -Vec3::X, Vec3::new(size, 0.0, 0.0)),
            Wall::plane(sand, Vec3::Y, Vec3::ZERO),
            Wall::plane(sand, -Vec3::Y, Vec3::new(0.0, size, 0.0)),
        ];

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let spacing = 0.0022;
        let mut particles = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                for k in 0..6 {
                    let jitter = Vec3::new(
                        rng.gen_range(-0.5e-4..0.5e-4),
                        rng.gen_range(-0.5e-4..0.5e-4),
                        0.0,
                    );
                    let position = Vec3::new(
                        0.0012 + spacing * i as Scalar,
                        0.0012 + spacing * j as Scalar,
                        0.0012 + spacing * k as Scalar,
                    ) + jitter;
                    let radius = rng.gen_range(0.0008..0.001);
                    particles.push(Particle::new(sand, position, radius));
                }
            }
        }
        Ok(Self {
            kind: ScenarioKind::BoxSettling,
            config: EngineConfig {
                dt: 2.0e-6,
                ..EngineConfig::default()
            },
            species,
            walls,
            particles,
            boundaries: Vec::new(),
            timesteps: 2000,
        })
    }

    /// Glass beads inserted at 0.5 m/s downwards into a 5 mm cylinder with
    /// an open bottom; particles below z = 0 are deleted.
    pub fn cylinder_pour() -> TalusResult<Self> {
        let mut species = SpeciesTable::new();
        let glass = species.add(preset("glass")?)?;
        let walls = vec![Wall::cylinder(glass, Vec3::ZERO, Vec3::Z, 0.005)];
        let insertion = CuboidInsertionBoundary::new(
            Vec3::new(-0.003, -0.003, 0.001),
            Vec3::new(0.003, 0.003, 0.01),
            0.0005,
            0.0007,
            glass,
            7,
        )?
        .with_velocity_range(Vec3::new(0.0, 0.0, -0.5), Vec3::new(0.0, 0.0, -0.5))?
        .with_max_failed_attempts(20)
        .with_max_particles(200);
        let deletion = PlaneDeletionBoundary::new(-Vec3::Z, 0.0)?;
        Ok(Self {
            kind: ScenarioKind::CylinderPour,
            config: EngineConfig {
                dt: 1.0e-6,
                ..EngineConfig::default()
            },
            species,
            walls,
            particles: Vec::new(),
            boundaries: vec![Box::new(insertion), Box::new(deletion)],
            timesteps: 5000,
        })
    }

    /// Steel shot fed into a horizontal trough (cylinder along x) turned
    /// by a helix blade at 20 rad/s.
    pub fn screw_conveyor() -> TalusResult<Self> {
        let mut species = SpeciesTable::new();
        let steel = species.add(preset("steel")?)?;
        let walls = vec![
            Wall::cylinder(steel, Vec3::ZERO, Vec3::X, 0.006),
            Wall::helix(
                steel,
                HelixBlade {
                    origin: Vec3::ZERO,
                    axis: Vec3::X,
                    length: 0.04,
                    radius: 0.0055,
                    pitch: 0.008,
                    thickness: 0.001,
                    angle: 0.0,
                    angular_velocity: 20.0,
                },
            ),
        ];
        let insertion = CuboidInsertionBoundary::new(
            Vec3::new(0.004, -0.004, -0.004),
            Vec3::new(0.016, 0.004, 0.004),
            0.0006,
            0.0008,
            steel,
            11,
        )?
        .with_max_failed_attempts(50)
        .with_max_particles(60);
        Ok(Self {
            kind: ScenarioKind::ScrewConveyor,
            config: EngineConfig {
                dt: 1.0e-6,
                ..EngineConfig::default()
            },
            species,
            walls,
            particles: Vec::new(),
            boundaries: vec![Box::new(insertion)],
            timesteps: 5000,
        })
    }

    /// Create a scenario by kind.
    pub fn from_kind(kind: ScenarioKind) -> TalusResult<Self> {
        match kind {
            ScenarioKind::BinaryCollision => Self::binary_collision(),
            ScenarioKind::BoxSettling => Self::box_settling(),
            ScenarioKind::CylinderPour => Self::cylinder_pour(),
            ScenarioKind::ScrewConveyor => Self::screw_conveyor(),
        }
    }

    /// Overrides the number of timesteps.
    pub fn with_timesteps(mut self, timesteps: u64) -> Self {
        self.timesteps = timesteps;
        self
    }

    /// Assembles an engine whose `max_time` covers exactly `timesteps`.
    pub fn into_engine(self) -> TalusResult<Engine> {
        let mut config = self.config;
        config.max_time = config.dt * self.timesteps as Scalar;
        config.save_count = self.timesteps.max(1);
        let mut engine = Engine::new(config, self.species)?.with_name(self.kind.name());
        let world = engine.world_mut();
        for wall in self.walls {
            world.add_wall(wall)?;
        }
        for particle in self.particles {
            world.add_particle(particle)?;
        }
        for boundary in self.boundaries {
            engine.add_boundary(boundary);
        }
        Ok(engine)
    }
}

fn preset(name: &str) -> TalusResult<Species> {
    presets::by_name(name)
        .ok_or_else(|| TalusError::InvalidSpecies(format!("unknown preset '{name}'")))
}
