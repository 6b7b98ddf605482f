//! Integration tests for talus-io.

use std::fs;
use std::path::PathBuf;

use talus_contact::{HelixBlade, Wall};
use talus_io::contract::{SimulationInput, SpeciesSpec, WallGeometry};
use talus_io::restart::{parse_restart, write_restart_to};
use talus_io::snapshot::SNAPSHOT_VERSION;
use talus_io::{
    build_engine, read_data_frames, read_energy_file, read_fstat, read_restart, validate_input,
    DataFileWriter, EnergyFileWriter, FStatWriter, StateSnapshot,
};
use talus_math::Vec3;
use talus_solver::{Engine, EngineConfig, Particle};
use talus_species::{presets, SpeciesTable};
use talus_types::{ContactTarget, ParticleId, Scalar, SpeciesId, TalusError};

/// Fresh directory under the system temp dir, unique per test.
fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("talus-io-{tag}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Three sand grains resting on a glass floor inside a cylinder, with a
/// cuboid obstacle and a slowly turning screw blade far away.
fn pile_engine() -> Engine {
    let mut table = SpeciesTable::new();
    let sand = table.add(presets::by_name("sand").unwrap()).unwrap();
    let glass = table.add(presets::by_name("glass").unwrap()).unwrap();
    let mut mixed = *table.pair(sand, glass);
    mixed.sliding.friction = 0.2;
    mixed.sliding.static_friction = 0.25;
    table.set_mixed(sand, glass, mixed).unwrap();

    let config = EngineConfig {
        dt: 2.0e-6,
        max_time: 1.0,
        save_count: 1_000_000,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config, table).unwrap().with_name("pile");
    let world = engine.world_mut();
    world.add_wall(Wall::plane(glass, Vec3::Z, Vec3::ZERO)).unwrap();
    world
        .add_wall(Wall::cylinder(glass, Vec3::ZERO, Vec3::Z, 0.01))
        .unwrap();
    world
        .add_wall(Wall::cuboid(glass, Vec3::new(0.05, 0.05, 0.0), Vec3::new(0.06, 0.06, 0.01)))
        .unwrap();
    world
        .add_wall(Wall::helix(
            glass,
            HelixBlade {
                origin: Vec3::new(0.1, 0.0, 0.0),
                axis: Vec3::Z,
                length: 0.02,
                radius: 0.005,
                pitch: 0.004,
                thickness: 0.0005,
                angle: 0.0,
                angular_velocity: 3.0,
            },
        ))
        .unwrap();

    let r = 0.001;
    world
        .add_particle(Particle::new(sand, Vec3::new(0.0, 0.0, 0.99 * r), r))
        .unwrap();
    world
        .add_particle(Particle::new(sand, Vec3::new(1.99 * r, 0.0, 0.99 * r), r))
        .unwrap();
    world
        .add_particle(
            Particle::new(sand, Vec3::new(r, 0.0, 2.72 * r), r)
                .with_velocity(Vec3::new(0.01, 0.0, 0.0))
                .with_angular_velocity(Vec3::new(0.0, 5.0, 0.0)),
        )
        .unwrap();
    engine
}

fn step_n(engine: &mut Engine, n: usize) {
    for _ in 0..n {
        engine.step().unwrap();
    }
}

fn restart_text(engine: &Engine) -> String {
    let mut buffer = Vec::new();
    write_restart_to(&mut buffer, engine.config(), engine.context(), engine.world()).unwrap();
    String::from_utf8(buffer).unwrap()
}

// ─── Restart Tests ───────────────────────────────────────────

#[test]
fn restart_round_trip_is_exact() {
    let mut engine = pile_engine();
    step_n(&mut engine, 50);
    assert!(engine.world().particles().iter().any(|p| !p.history.is_empty()));

    let text = restart_text(&engine);
    let state = parse_restart(&text).unwrap();

    assert_eq!(state.config, *engine.config());
    assert_eq!(state.context, *engine.context());
    assert_eq!(state.world.next_particle_id(), engine.world().next_particle_id());

    let species = state.world.species();
    assert_eq!(species.names(), engine.world().species().names());
    assert_eq!(
        species.pair(SpeciesId(0), SpeciesId(1)),
        engine.world().species().pair(SpeciesId(0), SpeciesId(1))
    );

    for (restored, original) in state.world.walls().iter().zip(engine.world().walls()) {
        assert_eq!(restored.id, original.id);
        assert_eq!(restored.species, original.species);
        assert_eq!(restored.shape, original.shape);
        assert_eq!(restored.velocity, original.velocity);
    }

    assert_eq!(state.world.particle_count(), engine.world().particle_count());
    for (restored, original) in state.world.particles().iter().zip(engine.world().particles()) {
        assert_eq!(restored.id, original.id);
        assert_eq!(restored.position, original.position);
        assert_eq!(restored.velocity, original.velocity);
        assert_eq!(restored.angular_velocity, original.angular_velocity);
        assert_eq!(restored.orientation, original.orientation);
        assert_eq!(restored.mass(), original.mass());
        let a: Vec<_> = restored.history.iter().copied().collect();
        let b: Vec<_> = original.history.iter().copied().collect();
        assert_eq!(a, b);
    }

    // Writing the restored state reproduces the file byte for byte.
    let engine = state.into_engine().unwrap();
    assert_eq!(restart_text(&engine), text);
}

#[test]
fn resumed_run_matches_continuous_run() {
    let mut continuous = pile_engine();
    step_n(&mut continuous, 100);
    let text = restart_text(&continuous);

    let mut resumed = parse_restart(&text).unwrap().into_engine().unwrap();
    step_n(&mut continuous, 100);
    step_n(&mut resumed, 100);

    assert_eq!(resumed.context().step, continuous.context().step);
    for (a, b) in resumed.world().particles().iter().zip(continuous.world().particles()) {
        assert_eq!(a.id, b.id);
        assert!((a.position - b.position).length() < 1e-12, "{} vs {}", a.position, b.position);
        assert!((a.velocity - b.velocity).length() < 1e-9);
    }
    let tangential = |e: &Engine| {
        e.contact_view(ParticleId(0), ContactTarget::Particle(ParticleId(2)))
            .map(|r| r.tangential)
    };
    let (a, b) = (tangential(&resumed), tangential(&continuous));
    assert_eq!(a.is_some(), b.is_some());
    if let (Some(a), Some(b)) = (a, b) {
        assert!((a - b).length() < 1e-12);
    }
}

#[test]
fn malformed_restart_reports_token() {
    let engine = pile_engine();
    let text = restart_text(&engine).replacen("max_time 1", "max_time one", 1);
    match parse_restart(&text) {
        Err(TalusError::Parse { token, message }) => {
            assert!(token > 0);
            assert!(message.contains("max_time"), "{message}");
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
    assert!(matches!(
        parse_restart("talus_restart 99"),
        Err(TalusError::Parse { .. })
    ));
}

#[test]
fn restart_rejects_names_with_whitespace() {
    let engine = pile_engine().with_name("two words");
    let mut buffer = Vec::new();
    let result = write_restart_to(&mut buffer, engine.config(), engine.context(), engine.world());
    assert!(result.is_err());
}

#[test]
fn missing_restart_file_is_a_persistence_error() {
    let path = scratch_dir("missing").join("nope.restart");
    assert!(matches!(read_restart(&path), Err(TalusError::Persistence { .. })));
}

// ─── Result File Tests ───────────────────────────────────────

#[test]
fn data_file_frames_read_back() {
    let dir = scratch_dir("data");
    let mut engine = pile_engine();
    assert!(engine.set_save_count(20));
    assert!(engine.set_max_time(100.0 * 2.0e-6));
    engine.add_output(Box::new(DataFileWriter::new(&dir).with_precision(12)));
    let summary = engine.run().unwrap();
    assert_eq!(summary.saves, 6);

    let frames = read_data_frames(&dir.join("pile.data")).unwrap();
    assert_eq!(frames.len(), 6);
    assert_eq!(frames[0].time, 0.0);
    let last = frames.last().unwrap();
    assert!((last.time - engine.time()).abs() < 1e-15);
    assert_eq!(last.domain_min, engine.config().domain_min);
    for (read, p) in last.particles.iter().zip(engine.world().particles()) {
        assert!((read.position - p.position).length() <= 1e-11 * p.position.length().max(1e-3));
        assert_eq!(read.radius, p.radius());
        assert_eq!(read.species, p.species);
    }
}

#[test]
fn energy_file_has_one_row_per_frame() {
    let dir = scratch_dir("energy");
    let mut engine = pile_engine();
    assert!(engine.set_save_count(25));
    assert!(engine.set_max_time(100.0 * 2.0e-6));
    engine.add_output(Box::new(EnergyFileWriter::new(&dir)));
    engine.run().unwrap();

    let rows = read_energy_file(&dir.join("pile.ene")).unwrap();
    assert_eq!(rows.len(), 5);
    assert!(rows.windows(2).all(|w| w[1].time > w[0].time));
    let expected = engine.energy_summary();
    let last = rows.last().unwrap();
    assert!((last.energy.gravitational - expected.gravitational).abs() <= 1e-5 * expected.gravitational.abs());
    assert!((last.center_of_mass() - expected.center_of_mass).length() < 1e-8);
}

#[test]
fn fstat_lists_particle_and_wall_contacts() {
    let dir = scratch_dir("fstat");
    let mut engine = pile_engine();
    assert!(engine.set_save_count(10));
    assert!(engine.set_max_time(10.0 * 2.0e-6));
    engine.add_output(Box::new(FStatWriter::new(&dir)));
    engine.run().unwrap();

    let records = read_fstat(&dir.join("pile.fstat")).unwrap();
    assert!(records.iter().any(|r| matches!(r.report.target, ContactTarget::Particle(_))));
    assert!(records
        .iter()
        .any(|r| r.report.target == ContactTarget::Wall(talus_types::WallId(0))));
    for r in &records {
        assert!(r.report.overlap > 0.0);
        assert!((r.report.normal.length() - 1.0).abs() < 1e-5);
        if let ContactTarget::Particle(target) = r.report.target {
            assert!(r.report.owner < target);
        }
    }
}

#[test]
fn snapshot_round_trip_and_version_check() {
    let mut engine = pile_engine();
    step_n(&mut engine, 10);
    let snapshot = StateSnapshot::from_world(engine.context(), engine.world());
    assert_eq!(snapshot.particle_count(), 3);

    let bytes = snapshot.to_bytes().unwrap();
    let recovered = StateSnapshot::from_bytes(&bytes).unwrap();
    assert_eq!(recovered, snapshot);

    let summary = recovered.summary();
    assert_eq!(summary.particles, 3);
    assert_eq!(summary.max_radius, 0.001);
    let expected = engine.kinetic_energy();
    assert!((summary.kinetic_energy - expected).abs() <= 1e-12 * expected.max(1e-30));

    let future = StateSnapshot {
        version: SNAPSHOT_VERSION + 1,
        ..snapshot
    };
    assert!(StateSnapshot::from_bytes(&future.to_bytes().unwrap()).is_err());
}

// ─── Contract Tests ──────────────────────────────────────────

fn scenario_toml(directory: &std::path::Path) -> String {
    format!(
        r#"
name = "hopper"

[config]
dt = 1e-6
max_time = 1e-4
save_count = 25

[[species]]
preset = "glass"

[[species]]
name = "beads"
density = 2000.0
collision_time = 1e-4
restitution = 0.8
radius = 0.0005

[[walls]]
species = "glass"
type = "plane"
normal = [0.0, 0.0, 1.0]
point = [0.0, 0.0, 0.0]

[[walls]]
species = "glass"
type = "cylinder"
origin = [0.0, 0.0, 0.0]
axis = [0.0, 0.0, 1.0]
radius = 0.01

[[particles]]
species = "glass"
position = [0.0, 0.0, 0.001]
radius = 0.001

[[insertion]]
species = "beads"
min = [-0.004, -0.004, 0.003]
max = [0.004, 0.004, 0.008]
radius_min = 0.0004
radius_max = 0.0005
max_particles = 20
seed = 7

[[deletion]]
normal = [0.0, 0.0, -1.0]
offset = 0.0

[output]
directory = "{}"
fstat = true
snapshot = true
"#,
        directory.display()
    )
}

#[test]
fn toml_input_parses_with_defaults() {
    let input = SimulationInput::from_toml(&scenario_toml(std::path::Path::new("out"))).unwrap();
    assert_eq!(input.name, "hopper");
    assert_eq!(input.config.dimension, 3);
    assert!(matches!(input.species[0], SpeciesSpec::Preset { .. }));
    assert!(matches!(input.species[1], SpeciesSpec::Calibrated { .. }));
    assert!(matches!(input.walls[1].geometry, WallGeometry::Cylinder { .. }));
    assert_eq!(input.insertion[0].max_failed_attempts, 100);
    assert!(input.output.data && input.output.restart);
    assert_eq!(input.output.precision, 6);

    let table = input.species_table().unwrap();
    let beads = table.by_name("beads").unwrap();
    let species = table.get(beads).unwrap();
    let mass = species.particle_mass(0.0005, 3);
    let tc = species.collision_time(mass).unwrap();
    assert!((tc - 1e-4).abs() < 1e-12);
    assert!((species.restitution(mass) - 0.8).abs() < 1e-9);

    let again = SimulationInput::from_toml(&input.to_toml().unwrap()).unwrap();
    assert_eq!(again.walls.len(), 2);
    assert_eq!(again.config, input.config);
}

#[test]
fn built_engine_runs_and_writes_every_channel() {
    let dir = scratch_dir("scenario");
    let input = SimulationInput::from_toml(&scenario_toml(&dir)).unwrap();
    let mut engine = build_engine(&input).unwrap();
    let summary = engine.run().unwrap();

    assert_eq!(summary.steps, 100);
    assert_eq!(summary.saves, 5);
    assert_eq!(summary.particles, 21);
    for file in ["hopper.data", "hopper.ene", "hopper.fstat", "hopper.restart"] {
        assert!(dir.join(file).is_file(), "{file} missing");
    }
    for index in 0..5 {
        assert!(dir.join(format!("hopper_{index:05}.snap")).is_file());
    }

    let state = read_restart(&dir.join("hopper.restart")).unwrap();
    assert_eq!(state.context.step, 100);
    assert_eq!(state.context.save_index, 5);
    assert_eq!(state.world.particle_count(), 21);
}

// ─── Validator Tests ─────────────────────────────────────────

fn valid_input() -> SimulationInput {
    SimulationInput::from_toml(&scenario_toml(std::path::Path::new("out"))).unwrap()
}

#[test]
fn valid_input_passes() {
    let report = validate_input(&valid_input()).unwrap();
    assert_eq!(report.particles, 1);
    assert_eq!(report.walls, 2);
    let tc = report.shortest_collision_time.unwrap();
    assert!(tc < 1e-4, "lighter inserted beads collide faster, got {tc}");
    assert!(report.suggested_timestep().unwrap() < tc);
}

#[test]
fn negative_dt_rejected() {
    let mut input = valid_input();
    input.config.dt = -1e-6;
    assert!(matches!(validate_input(&input), Err(TalusError::InvalidConfig(_))));
}

#[test]
fn zero_radius_rejected() {
    let mut input = valid_input();
    input.particles[0].radius = 0.0;
    assert!(matches!(validate_input(&input), Err(TalusError::InvalidParticle(_))));
}

#[test]
fn unknown_species_rejected() {
    let mut input = valid_input();
    input.particles[0].species = "granite".into();
    assert!(matches!(validate_input(&input), Err(TalusError::InvalidSpecies(_))));
}

#[test]
fn non_unit_wall_normal_rejected() {
    let mut input = valid_input();
    input.walls[0].geometry = WallGeometry::Plane {
        normal: Vec3::new(0.0, 0.0, 2.0),
        point: Vec3::ZERO,
    };
    assert!(matches!(validate_input(&input), Err(TalusError::InvalidWall(_))));
}

#[test]
fn zero_buckets_rejected() {
    let mut input = valid_input();
    input.config.grid.number_of_buckets = 0;
    assert!(validate_input(&input).is_err());
}

#[test]
fn timestep_beyond_collision_time_rejected() {
    let mut input = valid_input();
    input.config.dt = 1e-3;
    input.config.max_time = 1.0;
    assert!(matches!(validate_input(&input), Err(TalusError::InvalidConfig(_))));
}

#[test]
fn coarse_timestep_warns() {
    let mut input = valid_input();
    let tc = validate_input(&input).unwrap().shortest_collision_time.unwrap();
    input.config.dt = tc / 10.0;
    let report = validate_input(&input).unwrap();
    assert!(report.warnings.iter().any(|w| w.contains("1/50")));
}

#[test]
fn unknown_preset_rejected() {
    let mut input = valid_input();
    input.species[0] = SpeciesSpec::Preset {
        preset: "unobtainium".into(),
        name: None,
    };
    assert!(validate_input(&input).is_err());
}

#[test]
fn empty_run_warns() {
    let mut input = valid_input();
    input.particles.clear();
    input.insertion.clear();
    let report = validate_input(&input).unwrap();
    assert!(!report.warnings.is_empty());
    assert_eq!(report.shortest_collision_time, None::<Scalar>);
}
