//! Benchmark runner: executes scenarios and collects metrics.

use std::time::Instant;

use talus_math::Vec3;
use talus_solver::Engine;
use talus_telemetry::{EventBus, EventKind, VecSink};
use talus_types::{Scalar, TalusResult};

use crate::metrics::BenchmarkMetrics;
use crate::scenarios::{Scenario, ScenarioKind};

/// Runs benchmark scenarios and collects metrics.
pub struct BenchmarkRunner;

/// Relative velocity of particles 0 and 1 along the line joining them.
fn approach_speed(engine: &Engine) -> Option<Scalar> {
    let [a, b] = engine.world().particles() else {
        return None;
    };
    let normal = (b.position - a.position).normalize_or_zero();
    (normal != Vec3::ZERO).then(|| (a.velocity - b.velocity).dot(normal))
}

impl BenchmarkRunner {
    /// Run a single scenario.
    ///
    /// Returns metrics for the completed run.
    pub fn run(scenario: Scenario) -> TalusResult<BenchmarkMetrics> {
        let kind = scenario.kind;
        let timesteps = scenario.timesteps;
        let mut engine = scenario.into_engine()?;

        let sink = VecSink::new();
        let events = sink.buffer();
        engine.attach_bus(EventBus::new().with_sink(Box::new(sink)));
        engine.setup()?;

        let initial_approach = match kind {
            ScenarioKind::BinaryCollision => approach_speed(&engine),
            _ => None,
        };

        let mut step_times: Vec<f64> = Vec::with_capacity(timesteps as usize);
        let mut contact_total: usize = 0;
        let mut max_contacts: usize = 0;
        let mut max_overlap: Scalar = 0.0;

        let total_start = Instant::now();
        for _ in 0..timesteps {
            let started = Instant::now();
            engine.step()?;
            step_times.push(started.elapsed().as_secs_f64());
            let stats = engine.last_stats();
            contact_total += stats.contact_count();
            max_contacts = max_contacts.max(stats.contact_count());
            max_overlap = max_overlap.max(stats.max_overlap);
        }
        let total_wall_time = total_start.elapsed().as_secs_f64();
        engine.finish()?;

        let (mut inserted, mut removed) = (0u64, 0u64);
        if let Ok(events) = events.lock() {
            for event in events.iter() {
                match event.kind {
                    EventKind::Insertion { inserted: n, .. } => inserted += u64::from(n),
                    EventKind::Deletion { removed: n } => removed += u64::from(n),
                    _ => {}
                }
            }
        }

        // e = separation speed / approach speed along the line of centres.
        let restitution = initial_approach
            .zip(approach_speed(&engine))
            .filter(|(before, _)| *before > 0.0)
            .map(|(before, after)| -after / before);

        let avg_step = if step_times.is_empty() {
            0.0
        } else {
            step_times.iter().sum::<f64>() / step_times.len() as f64
        };
        let min_step = step_times.iter().copied().fold(f64::MAX, f64::min);
        let max_step = step_times.iter().copied().fold(0.0, f64::max);
        let mean_contacts = if timesteps > 0 {
            contact_total as f64 / timesteps as f64
        } else {
            0.0
        };

        Ok(BenchmarkMetrics {
            scenario: kind.name().to_string(),
            particles: engine.world().particle_count(),
            timesteps,
            total_wall_time,
            avg_step_time: avg_step,
            min_step_time: if step_times.is_empty() { 0.0 } else { min_step },
            max_step_time: max_step,
            final_kinetic_energy: engine.kinetic_energy() + engine.rotational_energy(),
            mean_contacts,
            max_contacts,
            max_overlap,
            inserted,
            removed,
            restitution,
        })
    }

    /// Run every scenario, optionally overriding their step counts.
    pub fn run_all(timesteps: Option<u64>) -> TalusResult<Vec<BenchmarkMetrics>> {
        let mut results = Vec::new();
        for &kind in ScenarioKind::all() {
            let mut scenario = Scenario::from_kind(kind)?;
            if let Some(steps) = timesteps {
                scenario = scenario.with_timesteps(steps);
            }
            results.push(Self::run(scenario)?);
        }
        Ok(results)
    }
}
