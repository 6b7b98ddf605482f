//! The time loop.
//!
//! Each step runs a fixed sequence of phases:
//! 1. reset forces on particles and walls
//! 2. insertion and deletion boundaries
//! 3. gravity, stale history sweep, broad + narrow phase, contact forces
//! 4. integration (particles and walls)
//! 5. broad phase maintenance
//! 6. advance time, write output every `save_count` steps, emit telemetry

use std::time::Instant;

use serde::{Deserialize, Serialize};
use talus_contact::{ContactHistoryRecord, ContactReport};
use talus_species::SpeciesTable;
use talus_telemetry::{EventBus, EventKind, SimulationEvent};
use talus_types::constants::TIMESTEP_COLLISION_FRACTION;
use talus_types::{ContactTarget, ParticleId, Scalar, TalusResult};

use crate::boundary::Boundary;
use crate::config::EngineConfig;
use crate::context::RunContext;
use crate::energy::EnergySummary;
use crate::hooks::{NoHooks, ScenarioHooks};
use crate::output::{OutputFrame, OutputSink};
use crate::world::{ContactStats, World};

/// Outcome of [`Engine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Steps taken by this call.
    pub steps: u64,
    /// Simulation time at the end.
    pub time: Scalar,
    /// Output frames written over the whole run.
    pub saves: u64,
    /// Particles alive at the end.
    pub particles: usize,
    /// Wall-clock seconds spent in this call.
    pub wall_time: Scalar,
}

/// A DEM simulation: world, configuration, and the pluggable parts that
/// customize a run.
pub struct Engine {
    config: EngineConfig,
    world: World,
    context: RunContext,
    boundaries: Vec<Box<dyn Boundary>>,
    outputs: Vec<Box<dyn OutputSink>>,
    hooks: Box<dyn ScenarioHooks>,
    bus: Option<EventBus>,
    last_stats: ContactStats,
    reports: Vec<ContactReport>,
    is_setup: bool,
    resumed: bool,
}

impl Engine {
    /// Creates an engine with an empty world.
    pub fn new(config: EngineConfig, species: SpeciesTable) -> TalusResult<Self> {
        config.validate()?;
        let world = World::from_config(&config, species)?;
        Ok(Self::assemble(config, world, RunContext::default(), false))
    }

    /// Rebuilds an engine from saved state. `setup` will neither call
    /// `setup_initial_conditions` nor write an initial frame.
    pub fn resume(config: EngineConfig, world: World, context: RunContext) -> TalusResult<Self> {
        config.validate()?;
        Ok(Self::assemble(config, world, context, true))
    }

    fn assemble(config: EngineConfig, world: World, context: RunContext, resumed: bool) -> Self {
        Self {
            config,
            world,
            context,
            boundaries: Vec::new(),
            outputs: Vec::new(),
            hooks: Box::new(NoHooks),
            bus: None,
            last_stats: ContactStats::default(),
            reports: Vec::new(),
            is_setup: false,
            resumed,
        }
    }

    // ─── Composition ─────────────────────────────────────────

    /// Sets the run name used by output sinks.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.context.name = name.into();
        self
    }

    pub fn add_boundary(&mut self, boundary: Box<dyn Boundary>) {
        self.boundaries.push(boundary);
    }

    pub fn add_output(&mut self, sink: Box<dyn OutputSink>) {
        self.outputs.push(sink);
    }

    pub fn set_hooks(&mut self, hooks: Box<dyn ScenarioHooks>) {
        self.hooks = hooks;
    }

    /// Attaches an event bus. Without one, no events are produced.
    pub fn attach_bus(&mut self, bus: EventBus) {
        self.bus = Some(bus);
    }

    /// Detaches and returns the event bus.
    pub fn take_bus(&mut self) -> Option<EventBus> {
        self.bus.take()
    }

    // ─── Accessors ───────────────────────────────────────────

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // The world is built from `dimension`, `grid` and `history_capacity`,
    // so only the time-loop parameters can change after construction.

    /// See [`EngineConfig::set_timestep`].
    pub fn set_timestep(&mut self, dt: Scalar) -> bool {
        self.config.set_timestep(dt)
    }

    /// See [`EngineConfig::set_max_time`].
    pub fn set_max_time(&mut self, max_time: Scalar) -> bool {
        self.config.set_max_time(max_time)
    }

    /// See [`EngineConfig::set_save_count`].
    pub fn set_save_count(&mut self, save_count: u64) -> bool {
        self.config.set_save_count(save_count)
    }

    /// See [`EngineConfig::set_number_of_saves`].
    pub fn set_number_of_saves(&mut self, count: u64) -> bool {
        self.config.set_number_of_saves(count)
    }

    /// See [`EngineConfig::set_inclination_angle`].
    pub fn set_inclination_angle(&mut self, degrees: Scalar) -> bool {
        self.config.set_inclination_angle(degrees)
    }

    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[inline]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[inline]
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    #[inline]
    pub fn time(&self) -> Scalar {
        self.context.time
    }

    /// Statistics of the last force evaluation.
    #[inline]
    pub fn last_stats(&self) -> &ContactStats {
        &self.last_stats
    }

    /// Contact reports of the last output step, if any sink asked for them.
    #[inline]
    pub fn last_reports(&self) -> &[ContactReport] {
        &self.reports
    }

    /// The history of contact `a`-`b` seen from `a`.
    pub fn contact_view(&self, a: ParticleId, b: ContactTarget) -> Option<ContactHistoryRecord> {
        self.world.contact_view(a, b)
    }

    // ─── Energy ──────────────────────────────────────────────

    pub fn energy_summary(&self) -> EnergySummary {
        EnergySummary::measure(&self.world, self.config.gravity, self.last_stats.elastic_energy)
    }

    pub fn kinetic_energy(&self) -> Scalar {
        self.energy_summary().kinetic
    }

    pub fn rotational_energy(&self) -> Scalar {
        self.energy_summary().rotational
    }

    pub fn gravitational_energy(&self) -> Scalar {
        self.energy_summary().gravitational
    }

    /// Energy stored in contact springs during the last step.
    pub fn elastic_energy(&self) -> Scalar {
        self.last_stats.elastic_energy
    }

    /// A stable timestep for the current particles and walls: the shortest
    /// binary collision time over every species pair in use, times 1/50.
    ///
    /// Linear pairs use the lightest particle of each species; Hertz pairs
    /// need a nonzero particle speed. `None` when no pair yields a time.
    pub fn suggested_timestep(&self) -> Option<Scalar> {
        let species = self.world.species();
        let mut lightest: Vec<Option<(Scalar, Scalar)>> = vec![None; species.len()];
        let mut max_speed: Scalar = 0.0;
        for particle in self.world.particles().iter().filter(|p| !p.is_fixed()) {
            let slot = &mut lightest[particle.species.index()];
            if slot.map_or(true, |(mass, _)| particle.mass() < mass) {
                *slot = Some((particle.mass(), particle.radius()));
            }
            max_speed = max_speed.max(particle.velocity.length());
        }

        let walls: Vec<_> = self.world.walls().iter().map(|w| w.species).collect();
        species
            .shortest_collision_time(&lightest, &walls, 2.0 * max_speed)
            .map(|tc| tc * TIMESTEP_COLLISION_FRACTION)
    }

    // ─── Time loop ───────────────────────────────────────────

    /// Returns true once simulated time has reached `max_time`.
    ///
    /// Time accumulates `dt` once per step, so the comparison tolerates a
    /// rounding error far below one step.
    pub fn is_finished(&self) -> bool {
        self.context.time >= self.config.max_time - 1e-6 * self.config.dt
    }

    /// Places the initial conditions and writes frame 0. Idempotent.
    pub fn setup(&mut self) -> TalusResult<()> {
        if self.is_setup {
            return Ok(());
        }
        if !self.resumed {
            self.hooks
                .setup_initial_conditions(&mut self.world, &self.context)?;
        }
        self.world.rebuild_grid();
        if let Some(suggested) = self.suggested_timestep() {
            if self.config.dt > suggested {
                tracing::warn!(
                    dt = self.config.dt,
                    suggested,
                    "timestep exceeds 1/50 of the shortest collision time"
                );
            }
        }
        tracing::info!(
            name = %self.context.name,
            scenario = self.hooks.name(),
            particles = self.world.particle_count(),
            walls = self.world.walls().len(),
            dt = self.config.dt,
            max_time = self.config.max_time,
            resumed = self.resumed,
            "starting run"
        );
        self.is_setup = true;
        if !self.resumed {
            self.write_output()?;
        }
        Ok(())
    }

    /// Advances the simulation by one timestep.
    pub fn step(&mut self) -> TalusResult<()> {
        self.setup()?;
        let started = Instant::now();
        let dt = self.config.dt;
        let step = self.context.step;
        emit(self.bus.as_ref(), step, EventKind::TimestepBegin {
            sim_time: self.context.time,
        });
        self.hooks.before_step(&mut self.world, &self.context);

        // 1. Reset
        self.world.reset_forces();

        // 2. Boundaries
        for boundary in &mut self.boundaries {
            let report = boundary.check_before_step(&mut self.world, &self.context)?;
            if report.inserted > 0 {
                emit(self.bus.as_ref(), step, EventKind::Insertion {
                    inserted: report.inserted,
                    failed_attempts: report.failed_attempts,
                });
            }
            if report.removed > 0 {
                emit(self.bus.as_ref(), step, EventKind::Deletion {
                    removed: report.removed,
                });
            }
        }

        // 3. Forces
        let output_due = (step + 1) % self.config.save_count == 0;
        let collect = output_due && self.outputs.iter().any(|s| s.wants_contacts());
        self.reports.clear();
        self.world.apply_gravity(self.config.gravity);
        self.last_stats = self.world.compute_contact_forces(
            self.context.time,
            dt,
            collect.then_some(&mut self.reports),
        );

        // 4. Integration
        self.world.integrate(dt);

        // 5. Grid maintenance
        self.world.update_grid();

        // 6. Time, output, telemetry
        self.context.time += dt;
        self.context.step += 1;
        self.hooks.after_step(&mut self.world, &self.context);

        if output_due {
            self.write_output()?;
        }
        if self.bus.as_ref().is_some_and(EventBus::is_enabled) {
            let stats = self.last_stats;
            emit(self.bus.as_ref(), step, EventKind::ContactDetection {
                contact_count: stats.particle_contacts as u32,
                wall_contact_count: stats.wall_contacts as u32,
                candidate_pairs: stats.candidate_pairs as u32,
                max_overlap: stats.max_overlap,
            });
            if output_due {
                let energy = self.energy_summary();
                emit(self.bus.as_ref(), step, EventKind::Energy {
                    kinetic: energy.kinetic,
                    rotational: energy.rotational,
                    potential: energy.gravitational,
                    elastic: energy.elastic,
                });
            }
            emit(self.bus.as_ref(), step, EventKind::TimestepEnd {
                wall_time: started.elapsed().as_secs_f64(),
            });
        }
        if let Some(bus) = &mut self.bus {
            bus.flush();
        }
        Ok(())
    }

    /// Steps until `max_time`, then finalizes every sink.
    pub fn run(&mut self) -> TalusResult<RunSummary> {
        self.setup()?;
        let started = Instant::now();
        let first_step = self.context.step;
        while !self.is_finished() {
            self.step()?;
        }
        self.finish()?;
        let summary = RunSummary {
            steps: self.context.step - first_step,
            time: self.context.time,
            saves: self.context.save_index,
            particles: self.world.particle_count(),
            wall_time: started.elapsed().as_secs_f64(),
        };
        tracing::info!(
            name = %self.context.name,
            steps = summary.steps,
            time = summary.time,
            saves = summary.saves,
            particles = summary.particles,
            wall_time = summary.wall_time,
            "run finished"
        );
        Ok(summary)
    }

    /// Writes a closing frame if the last step was not an output step and
    /// finalizes sinks, hooks and the bus.
    pub fn finish(&mut self) -> TalusResult<()> {
        if self.context.step % self.config.save_count != 0 {
            self.write_output()?;
        }
        for sink in &mut self.outputs {
            sink.finalize()?;
        }
        self.hooks.on_finish(&self.world, &self.context);
        if let Some(bus) = &mut self.bus {
            bus.finalize();
        }
        Ok(())
    }

    fn write_output(&mut self) -> TalusResult<()> {
        let frame = OutputFrame {
            context: &self.context,
            config: &self.config,
            world: &self.world,
            energy: EnergySummary::measure(
                &self.world,
                self.config.gravity,
                self.last_stats.elastic_energy,
            ),
            contacts: &self.reports,
        };
        for sink in &mut self.outputs {
            sink.write(&frame)?;
        }
        emit(self.bus.as_ref(), self.context.step, EventKind::Output {
            save_index: self.context.save_index,
            sim_time: self.context.time,
            particles: self.world.particle_count() as u32,
        });
        self.context.save_index += 1;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("context", &self.context)
            .field("world", &self.world)
            .field("boundaries", &self.boundaries.iter().map(|b| b.name()).collect::<Vec<_>>())
            .field("outputs", &self.outputs.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("hooks", &self.hooks.name())
            .finish()
    }
}

fn emit(bus: Option<&EventBus>, timestep: u64, kind: EventKind) {
    if let Some(bus) = bus {
        bus.emit(SimulationEvent::new(timestep, kind));
    }
}

