//! Integration tests for talus-solver.

use std::sync::{Arc, Mutex};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use talus_contact::{AllPairs, Wall};
use talus_math::Vec3;
use talus_solver::{
    Boundary, CuboidInsertionBoundary, Engine, EngineConfig, FrameRecorder, Particle,
    PlaneDeletionBoundary, RunContext, ScenarioHooks, World,
};
use talus_species::{presets, ContactParameters, Species, SpeciesTable};
use talus_telemetry::{EventBus, EventKind, VecSink};
use talus_types::{ContactTarget, ParticleId, Scalar, SpeciesId, TalusResult};

const RADIUS: Scalar = 0.001;
const COLLISION_TIME: Scalar = 2.5e-3;
const RESTITUTION: Scalar = 0.8;

/// One species calibrated to `COLLISION_TIME` and `RESTITUTION` for two
/// particles of `RADIUS`.
fn calibrated_table(allow_tension: bool) -> SpeciesTable {
    let mut species = Species::new(
        "beads",
        2000.0,
        ContactParameters {
            allow_tension,
            ..ContactParameters::default()
        },
    );
    let mass = species.particle_mass(RADIUS, 3);
    assert!(species.set_collision_time_and_restitution(COLLISION_TIME, RESTITUTION, mass));
    let mut table = SpeciesTable::new();
    table.add(species).unwrap();
    table
}

fn zero_gravity_config() -> EngineConfig {
    EngineConfig {
        gravity: Vec3::ZERO,
        dt: COLLISION_TIME / 50.0,
        ..EngineConfig::default()
    }
}

fn sand_world(dimension: u8) -> World {
    let mut table = SpeciesTable::new();
    table.add(presets::by_name("sand").unwrap()).unwrap();
    let config = EngineConfig {
        dimension,
        ..EngineConfig::default()
    };
    World::from_config(&config, table).unwrap()
}

fn random_cluster(world: &mut World, count: usize, extent: Scalar, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for _ in 0..count {
        let position = Vec3::new(
            rng.gen_range(0.0..extent),
            rng.gen_range(0.0..extent),
            rng.gen_range(0.0..extent),
        );
        let velocity = Vec3::new(
            rng.gen_range(-0.1..0.1),
            rng.gen_range(-0.1..0.1),
            rng.gen_range(-0.1..0.1),
        );
        let spin = Vec3::new(
            rng.gen_range(-50.0..50.0),
            rng.gen_range(-50.0..50.0),
            rng.gen_range(-50.0..50.0),
        );
        let radius = rng.gen_range(0.5 * RADIUS..RADIUS);
        let particle = Particle::new(SpeciesId(0), position, radius)
            .with_velocity(velocity)
            .with_angular_velocity(spin);
        world.add_particle(particle).unwrap();
    }
}

/// Runs a head-on collision of two equal particles and returns the
/// measured restitution coefficient.
fn binary_collision(allow_tension: bool) -> Scalar {
    let mut engine = Engine::new(zero_gravity_config(), calibrated_table(allow_tension)).unwrap();
    let gap = 0.5e-5;
    let left = Particle::new(SpeciesId(0), Vec3::new(-RADIUS - gap, 0.0, 0.0), RADIUS)
        .with_velocity(Vec3::new(0.05, 0.0, 0.0));
    let right = Particle::new(SpeciesId(0), Vec3::new(RADIUS + gap, 0.0, 0.0), RADIUS)
        .with_velocity(Vec3::new(-0.05, 0.0, 0.0));
    engine.world_mut().add_particle(left).unwrap();
    engine.world_mut().add_particle(right).unwrap();

    for _ in 0..200 {
        engine.step().unwrap();
    }
    let particles = engine.world().particles();
    let separating = particles[1].velocity.x - particles[0].velocity.x;
    separating / 0.1
}

// ─── Particle & World Tests ──────────────────────────────────

#[test]
fn mass_and_inertia_follow_dimension() {
    let world = {
        let mut w = sand_world(3);
        w.add_particle(Particle::new(SpeciesId(0), Vec3::ZERO, RADIUS)).unwrap();
        w
    };
    let p = &world.particles()[0];
    let expected = 4.0 / 3.0 * std::f64::consts::PI * RADIUS.powi(3) * 2650.0;
    assert!((p.mass() - expected).abs() < 1e-18);
    assert!((p.inertia() - 0.4 * expected * RADIUS * RADIUS).abs() < 1e-24);

    let mut flat = sand_world(2);
    flat.add_particle(Particle::new(SpeciesId(0), Vec3::new(0.0, 0.0, 0.5), RADIUS))
        .unwrap();
    let disk = &flat.particles()[0];
    let expected = std::f64::consts::PI * RADIUS * RADIUS * 2650.0;
    assert!((disk.mass() - expected).abs() < 1e-15);
    assert!((disk.inertia() - 0.5 * expected * RADIUS * RADIUS).abs() < 1e-21);
    assert_eq!(disk.position.z, 0.0); // projected into the plane
}

#[test]
fn add_particle_rejects_bad_input() {
    let mut world = sand_world(3);
    assert!(world.add_particle(Particle::new(SpeciesId(0), Vec3::ZERO, 0.0)).is_err());
    assert!(world.add_particle(Particle::new(SpeciesId(7), Vec3::ZERO, RADIUS)).is_err());
    assert!(world
        .add_particle(Particle::new(SpeciesId(0), Vec3::splat(Scalar::NAN), RADIUS))
        .is_err());
    assert_eq!(world.particle_count(), 0);
    assert_eq!(world.next_particle_id(), ParticleId(0));
}

#[test]
fn set_radius_rejects_non_positive() {
    let mut world = sand_world(3);
    world.add_particle(Particle::new(SpeciesId(0), Vec3::ZERO, RADIUS)).unwrap();
    let mass = world.particles()[0].mass();
    assert!(!world.set_radius(0, -1.0));
    assert_eq!(world.particles()[0].radius(), RADIUS);
    assert_eq!(world.particles()[0].mass(), mass);

    assert!(world.set_radius(0, 2.0 * RADIUS));
    assert!((world.particles()[0].mass() - 8.0 * mass).abs() < 1e-15);
}

#[test]
fn swap_removal_keeps_ids_and_grid_in_sync() {
    let mut world = sand_world(3);
    random_cluster(&mut world, 40, 0.01, 3);
    let removed = world.remove_particle(5).unwrap();
    assert_eq!(removed.id, ParticleId(5));
    assert_eq!(world.particle_count(), 39);
    assert!(world.index_of(ParticleId(5)).is_none());
    for (i, p) in world.particles().iter().enumerate() {
        assert_eq!(world.index_of(p.id), Some(i));
    }
    assert_eq!(world.broad_phase().len(), 39);

    // Ids are never reused.
    let id = world
        .add_particle(Particle::new(SpeciesId(0), Vec3::splat(0.05), RADIUS))
        .unwrap();
    assert_eq!(id, ParticleId(40));
}

#[test]
fn grid_matches_all_pairs_contacts() {
    let mut grid_world = sand_world(3);
    random_cluster(&mut grid_world, 60, 0.008, 11);
    let mut brute_world = sand_world(3).with_broad_phase(Box::new(AllPairs::new()));
    random_cluster(&mut brute_world, 60, 0.008, 11);

    let a = grid_world.compute_contact_forces(0.0, 1e-6, None);
    let b = brute_world.compute_contact_forces(0.0, 1e-6, None);
    assert_eq!(a.particle_contacts, b.particle_contacts);
    assert!(a.candidate_pairs <= b.candidate_pairs);
    for (p, q) in grid_world.particles().iter().zip(brute_world.particles()) {
        assert!((p.force - q.force).length() <= 1e-12 * (1.0 + q.force.length()));
    }
}

// ─── Contact Force Tests ─────────────────────────────────────

#[test]
fn newtons_third_law_over_a_cluster() {
    let mut world = sand_world(3);
    random_cluster(&mut world, 30, 0.006, 42);
    let dt = 1e-6;
    world.compute_contact_forces(0.0, dt, None);
    // A second evaluation loads the tangential springs.
    world.reset_forces();
    let stats = world.compute_contact_forces(dt, dt, None);
    assert!(stats.particle_contacts > 0);

    let mut total_force = Vec3::ZERO;
    let mut total_moment = Vec3::ZERO;
    let mut scale: Scalar = 0.0;
    for p in world.particles() {
        total_force += p.force;
        total_moment += p.position.cross(p.force) + p.torque;
        scale = scale.max(p.force.length());
    }
    assert!(total_force.length() <= 1e-9 * scale, "net force {total_force:?}");
    assert!(total_moment.length() <= 1e-9 * scale, "net moment {total_moment:?}");
}

#[test]
fn history_lives_on_lower_id() {
    let mut engine = Engine::new(zero_gravity_config(), calibrated_table(false)).unwrap();
    let world = engine.world_mut();
    let a = world
        .add_particle(Particle::new(SpeciesId(0), Vec3::new(0.0, 0.0, 0.0), RADIUS))
        .unwrap();
    let b = world
        .add_particle(Particle::new(SpeciesId(0), Vec3::new(1.9 * RADIUS, 0.0, 0.0), RADIUS))
        .unwrap();
    engine.step().unwrap();

    let world = engine.world();
    assert_eq!(world.particle_by_id(a).unwrap().history.len(), 1);
    assert!(world.particle_by_id(b).unwrap().history.is_empty());
    assert!(engine.contact_view(a, ContactTarget::Particle(b)).is_some());
    let reverse = engine.contact_view(b, ContactTarget::Particle(a)).unwrap();
    assert_eq!(reverse.target, ContactTarget::Particle(a));
}

#[test]
fn history_is_pruned_after_separation() {
    let mut engine = Engine::new(zero_gravity_config(), calibrated_table(false)).unwrap();
    let world = engine.world_mut();
    let a = world
        .add_particle(
            Particle::new(SpeciesId(0), Vec3::new(-RADIUS - 0.5e-5, 0.0, 0.0), RADIUS)
                .with_velocity(Vec3::new(0.05, 0.0, 0.0)),
        )
        .unwrap();
    let b = world
        .add_particle(
            Particle::new(SpeciesId(0), Vec3::new(RADIUS + 0.5e-5, 0.0, 0.0), RADIUS)
                .with_velocity(Vec3::new(-0.05, 0.0, 0.0)),
        )
        .unwrap();

    let mut seen_contact = false;
    for _ in 0..200 {
        engine.step().unwrap();
        seen_contact |= engine.contact_view(a, ContactTarget::Particle(b)).is_some();
    }
    assert!(seen_contact);
    assert_eq!(engine.last_stats().particle_contacts, 0);
    assert!(engine.contact_view(a, ContactTarget::Particle(b)).is_none());
    assert!(engine.world().particles().iter().all(|p| p.history.is_empty()));
}

// ─── Engine Tests ────────────────────────────────────────────

#[test]
fn restitution_with_tension_allowed() {
    let e = binary_collision(true);
    assert!((e - RESTITUTION).abs() < 0.01 * RESTITUTION, "measured e = {e}");
}

#[test]
fn restitution_with_clamped_normal_force() {
    let e = binary_collision(false);
    assert!((e - RESTITUTION).abs() < 0.02 * RESTITUTION, "measured e = {e}");
}

#[test]
fn suggested_timestep_matches_calibration() {
    let mut engine = Engine::new(zero_gravity_config(), calibrated_table(true)).unwrap();
    assert!(engine.suggested_timestep().is_none());
    engine
        .world_mut()
        .add_particle(Particle::new(SpeciesId(0), Vec3::ZERO, RADIUS))
        .unwrap();
    let dt = engine.suggested_timestep().unwrap();
    assert!((dt - COLLISION_TIME / 50.0).abs() < 1e-9 * dt);
}

#[test]
fn run_stops_at_max_time() {
    let config = EngineConfig {
        dt: 1e-3,
        max_time: 0.01,
        save_count: 4,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config, calibrated_table(false)).unwrap();
    let recorder = FrameRecorder::new();
    engine.add_output(Box::new(recorder.clone()));
    let summary = engine.run().unwrap();

    assert_eq!(summary.steps, 10);
    // Frames at steps 0, 4, 8 and a closing frame at 10.
    let steps: Vec<u64> = recorder.frames().iter().map(|f| f.step).collect();
    assert_eq!(steps, vec![0, 4, 8, 10]);
    assert_eq!(summary.saves, 4);
    assert!(recorder.is_finalized());
}

#[test]
fn particle_settles_on_floor() {
    let config = EngineConfig {
        dt: COLLISION_TIME / 50.0,
        max_time: 0.2,
        save_count: 1000,
        ..EngineConfig::default()
    };
    let table = calibrated_table(false);
    let stiffness = table.pair(SpeciesId(0), SpeciesId(0)).stiffness;
    let mut engine = Engine::new(config, table).unwrap();
    let world = engine.world_mut();
    world
        .add_wall(Wall::plane(SpeciesId(0), Vec3::Z, Vec3::ZERO))
        .unwrap();
    world
        .add_particle(Particle::new(SpeciesId(0), Vec3::new(0.0, 0.0, RADIUS), RADIUS))
        .unwrap();
    engine.run().unwrap();

    let p = &engine.world().particles()[0];
    let expected_overlap = p.mass() * talus_types::constants::GRAVITY / stiffness;
    let overlap = RADIUS - p.position.z;
    assert!((overlap - expected_overlap).abs() < 1e-6, "overlap {overlap}");
    assert!(p.velocity.length() < 1e-4);
    assert!(engine.world().walls()[0].force.z < 0.0);
}

#[test]
fn two_dimensional_run_stays_planar() {
    let mut config = EngineConfig {
        dimension: 2,
        max_time: 0.01,
        gravity: Vec3::new(0.0, -9.81, 0.0),
        ..EngineConfig::default()
    };
    assert!(config.set_timestep(2e-6));
    let mut table = SpeciesTable::new();
    table.add(presets::by_name("glass").unwrap()).unwrap();
    let mut engine = Engine::new(config, table).unwrap();
    let world = engine.world_mut();
    world
        .add_wall(Wall::plane(SpeciesId(0), Vec3::Y, Vec3::ZERO))
        .unwrap();
    for i in 0..5 {
        let x = i as Scalar * 2.5 * RADIUS;
        world
            .add_particle(
                Particle::new(SpeciesId(0), Vec3::new(x, 1.5 * RADIUS, 0.0), RADIUS)
                    .with_angular_velocity(Vec3::new(3.0, 3.0, 3.0)),
            )
            .unwrap();
    }
    engine.run().unwrap();
    for p in engine.world().particles() {
        assert_eq!(p.position.z, 0.0);
        assert_eq!(p.angular_velocity.x, 0.0);
        assert_eq!(p.angular_velocity.y, 0.0);
        assert!(p.position.y < 1.5 * RADIUS);
    }
}

#[test]
fn fixed_particles_move_with_their_velocity() {
    let mut engine = Engine::new(EngineConfig::debug(), calibrated_table(false)).unwrap();
    let world = engine.world_mut();
    world
        .add_particle(
            Particle::new(SpeciesId(0), Vec3::ZERO, RADIUS)
                .with_velocity(Vec3::new(0.01, 0.0, 0.0))
                .with_fixed(true),
        )
        .unwrap();
    for _ in 0..100 {
        engine.step().unwrap();
    }
    let p = &engine.world().particles()[0];
    assert_eq!(p.velocity, Vec3::new(0.01, 0.0, 0.0));
    assert!((p.position.x - 100.0 * engine.config().dt * 0.01).abs() < 1e-15);
    assert_eq!(p.position.z, 0.0);
}

// ─── Boundary Tests ──────────────────────────────────────────

#[test]
fn insertion_fills_without_overlap() {
    let mut world = sand_world(3);
    let mut insertion = CuboidInsertionBoundary::new(
        Vec3::ZERO,
        Vec3::splat(0.01),
        0.8 * RADIUS,
        RADIUS,
        SpeciesId(0),
        7,
    )
    .unwrap()
    .with_max_particles(50)
    .with_max_failed_attempts(20);
    let report = insertion
        .check_before_step(&mut world, &RunContext::default())
        .unwrap();
    assert_eq!(report.inserted as usize, world.particle_count());
    assert!(world.particle_count() <= 50);

    let particles = world.particles();
    for i in 0..particles.len() {
        for j in (i + 1)..particles.len() {
            let reach = particles[i].radius() + particles[j].radius();
            assert!(particles[i].position.distance(particles[j].position) >= reach);
        }
        let r = Vec3::splat(particles[i].radius());
        assert!(particles[i].position.cmpge(r).all());
        assert!(particles[i].position.cmple(Vec3::splat(0.01) - r).all());
    }
}

#[test]
fn insertion_is_reproducible_from_seed() {
    let positions = |seed: u64| {
        let mut world = sand_world(3);
        let mut insertion = CuboidInsertionBoundary::new(
            Vec3::ZERO,
            Vec3::splat(0.005),
            RADIUS,
            RADIUS,
            SpeciesId(0),
            seed,
        )
        .unwrap()
        .with_max_particles(10);
        insertion
            .check_before_step(&mut world, &RunContext::default())
            .unwrap();
        world.particles().iter().map(|p| p.position).collect::<Vec<_>>()
    };
    assert_eq!(positions(1), positions(1));
    assert_ne!(positions(1), positions(2));
}

#[test]
fn insertion_respects_cap_across_steps() {
    let config = EngineConfig {
        dt: 1e-5,
        max_time: 5e-5,
        ..EngineConfig::default()
    };
    let mut table = SpeciesTable::new();
    table.add(presets::by_name("sand").unwrap()).unwrap();
    let mut engine = Engine::new(config, table).unwrap();
    engine.add_boundary(Box::new(
        CuboidInsertionBoundary::new(Vec3::ZERO, Vec3::splat(0.02), RADIUS, RADIUS, SpeciesId(0), 3)
            .unwrap()
            .with_max_particles(12),
    ));
    let sink = VecSink::new();
    engine.attach_bus(EventBus::new().with_sink(Box::new(sink.clone())));
    engine.run().unwrap();

    assert_eq!(engine.world().particle_count(), 12);
    let inserted: u32 = sink
        .events()
        .iter()
        .filter_map(|e| match e.kind {
            EventKind::Insertion { inserted, .. } => Some(inserted),
            _ => None,
        })
        .sum();
    assert_eq!(inserted, 12);
}

#[test]
fn plane_deletion_removes_falling_particles() {
    let config = EngineConfig {
        dt: 1e-4,
        max_time: 0.1,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config, calibrated_table(false)).unwrap();
    for i in 0..10 {
        let z = i as Scalar * 0.01;
        engine
            .world_mut()
            .add_particle(Particle::new(SpeciesId(0), Vec3::new(0.0, 0.0, z), RADIUS))
            .unwrap();
    }
    let deletion = PlaneDeletionBoundary::through_point(-Vec3::Z, Vec3::new(0.0, 0.0, -0.02)).unwrap();
    engine.add_boundary(Box::new(deletion));
    engine.run().unwrap();

    // Free fall over 0.1 s covers 4.9 cm: the lowest particles are gone.
    let world = engine.world();
    assert!(world.particle_count() < 10);
    assert!(world.particles().iter().all(|p| p.position.z > -0.03));
    for (i, p) in world.particles().iter().enumerate() {
        assert_eq!(world.index_of(p.id), Some(i));
    }
}

// ─── Hooks & Telemetry Tests ─────────────────────────────────

#[derive(Default)]
struct CountingHooks {
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl ScenarioHooks for CountingHooks {
    fn setup_initial_conditions(&mut self, world: &mut World, _: &RunContext) -> TalusResult<()> {
        self.calls.lock().unwrap().push("setup");
        world.add_particle(Particle::new(SpeciesId(0), Vec3::ZERO, RADIUS))?;
        Ok(())
    }

    fn before_step(&mut self, _: &mut World, _: &RunContext) {
        self.calls.lock().unwrap().push("before");
    }

    fn after_step(&mut self, _: &mut World, _: &RunContext) {
        self.calls.lock().unwrap().push("after");
    }

    fn on_finish(&mut self, _: &World, _: &RunContext) {
        self.calls.lock().unwrap().push("finish");
    }

    fn name(&self) -> &str {
        "counting"
    }
}

#[test]
fn hooks_run_in_order() {
    let config = EngineConfig {
        dt: 1e-3,
        max_time: 2e-3,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config, calibrated_table(false)).unwrap();
    let hooks = CountingHooks::default();
    let calls = Arc::clone(&hooks.calls);
    engine.set_hooks(Box::new(hooks));
    engine.run().unwrap();

    assert_eq!(engine.world().particle_count(), 1);
    assert_eq!(
        *calls.lock().unwrap(),
        vec!["setup", "before", "after", "before", "after", "finish"]
    );
}

#[test]
fn engine_emits_events_per_step() {
    let config = EngineConfig {
        dt: 1e-4,
        max_time: 1e-3,
        save_count: 5,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config, calibrated_table(false)).unwrap();
    engine
        .world_mut()
        .add_particle(Particle::new(SpeciesId(0), Vec3::ZERO, RADIUS))
        .unwrap();
    let sink = VecSink::new();
    engine.attach_bus(EventBus::new().with_sink(Box::new(sink.clone())));
    engine.run().unwrap();

    let events = sink.events();
    let count = |f: fn(&EventKind) -> bool| events.iter().filter(|e| f(&e.kind)).count();
    assert_eq!(count(|k| matches!(k, EventKind::TimestepBegin { .. })), 10);
    assert_eq!(count(|k| matches!(k, EventKind::TimestepEnd { .. })), 10);
    assert_eq!(count(|k| matches!(k, EventKind::ContactDetection { .. })), 10);
    // Frames at steps 0, 5 and 10.
    assert_eq!(count(|k| matches!(k, EventKind::Output { .. })), 3);
    assert_eq!(count(|k| matches!(k, EventKind::Energy { .. })), 2);
}

#[test]
fn gravity_drives_energy_exchange() {
    let config = EngineConfig {
        dt: 1e-4,
        max_time: 0.05,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config, calibrated_table(false)).unwrap();
    engine
        .world_mut()
        .add_particle(Particle::new(SpeciesId(0), Vec3::ZERO, RADIUS))
        .unwrap();
    let before = engine.energy_summary();
    engine.run().unwrap();
    let after = engine.energy_summary();
    assert!(after.kinetic > 0.0);
    assert!(after.gravitational < before.gravitational);
    // Symplectic Euler conserves energy to first order in dt.
    assert!((after.total() - before.total()).abs() < 1e-2 * after.kinetic);
    assert_eq!(engine.rotational_energy(), 0.0);
}

#[test]
fn engine_setters_reject_invalid_values() {
    let config = EngineConfig {
        dt: 1e-3,
        max_time: 0.01,
        save_count: 5,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config, calibrated_table(false)).unwrap();
    assert!(!engine.set_save_count(0));
    assert!(!engine.set_timestep(0.0));
    assert!(!engine.set_max_time(-1.0));
    assert!(!engine.set_inclination_angle(95.0));
    assert_eq!(engine.config().save_count, 5);
    assert_eq!(engine.config().dt, 1e-3);

    assert!(engine.set_save_count(2));
    let recorder = FrameRecorder::new();
    engine.add_output(Box::new(recorder.clone()));
    let summary = engine.run().unwrap();
    assert_eq!(summary.steps, 10);
    assert_eq!(recorder.frames().len(), 6);
}

// ─── Config Tests ────────────────────────────────────────────

#[test]
fn config_toml_round_trip() {
    let mut config = EngineConfig::high_resolution();
    assert!(config.set_inclination_angle(25.0));
    config.dimension = 2;
    config.history_capacity = Some(5);
    let text = toml::to_string(&config).unwrap();
    let recovered: EngineConfig = toml::from_str(&text).unwrap();
    assert_eq!(recovered, config);
}

#[test]
fn config_fields_default_when_missing() {
    let config: EngineConfig = toml::from_str("dt = 1e-5\nsave_count = 7\n").unwrap();
    assert_eq!(config.dt, 1e-5);
    assert_eq!(config.save_count, 7);
    assert_eq!(config.grid, EngineConfig::default().grid);
    config.validate().unwrap();

    let zero: EngineConfig = toml::from_str("save_count = 0").unwrap();
    assert!(zero.validate().is_err());
}

#[test]
fn config_json_round_trip() {
    let config = EngineConfig::debug();
    let json = serde_json::to_string(&config).unwrap();
    let recovered: EngineConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, config);
}
