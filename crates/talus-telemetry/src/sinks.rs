//! Pluggable event sinks.

use std::sync::{Arc, Mutex};

use tracing::Level;

use crate::events::{EventKind, SimulationEvent};

/// Trait for event consumers.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &SimulationEvent);

    /// Called when the simulation ends.
    fn finalize(&mut self) {}

    /// Returns a human-readable name for this sink.
    fn name(&self) -> &str;
}

/// Collects events into a buffer shared with the code that created the
/// sink, so tests can inspect what the engine emitted after handing the
/// sink to the bus.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    events: Arc<Mutex<Vec<SimulationEvent>>>,
}

impl VecSink {
    /// Creates an empty vec sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the shared buffer.
    pub fn buffer(&self) -> Arc<Mutex<Vec<SimulationEvent>>> {
        Arc::clone(&self.events)
    }

    /// Copies the collected events out.
    pub fn events(&self) -> Vec<SimulationEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SimulationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// Forwards every event to `tracing` at a fixed level.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    level: Level,
}

impl TracingSink {
    /// Creates a new tracing sink at the given log level.
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

macro_rules! emit_at {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::error!($($arg)+)
        } else if level == Level::WARN {
            tracing::warn!($($arg)+)
        } else if level == Level::INFO {
            tracing::info!($($arg)+)
        } else if level == Level::DEBUG {
            tracing::debug!($($arg)+)
        } else {
            tracing::trace!($($arg)+)
        }
    }};
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SimulationEvent) {
        emit_at!(self.level, timestep = event.timestep, event = ?event.kind, "simulation_event");
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}

/// Prints one progress line per output frame to stdout.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    last_energy: Option<(f64, f64)>,
    inserted: u64,
    removed: u64,
    frames: u64,
    last_step: u64,
}

impl ConsoleSink {
    /// Creates a console sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for ConsoleSink {
    fn handle(&mut self, event: &SimulationEvent) {
        self.last_step = event.timestep;
        match &event.kind {
            EventKind::Energy {
                kinetic,
                rotational,
                ..
            } => self.last_energy = Some((*kinetic, *rotational)),
            EventKind::Insertion { inserted, .. } => self.inserted += u64::from(*inserted),
            EventKind::Deletion { removed } => self.removed += u64::from(*removed),
            EventKind::Output {
                save_index,
                sim_time,
                particles,
            } => {
                self.frames += 1;
                match self.last_energy {
                    Some((kinetic, rotational)) => println!(
                        "  frame {save_index:>5}  t = {sim_time:.6e} s  N = {particles:<7} E_kin = {kinetic:.4e} J  E_rot = {rotational:.4e} J"
                    ),
                    None => println!(
                        "  frame {save_index:>5}  t = {sim_time:.6e} s  N = {particles}"
                    ),
                }
            }
            _ => {}
        }
    }

    fn finalize(&mut self) {
        println!(
            "  {} steps, {} frames, {} particles inserted, {} removed",
            self.last_step, self.frames, self.inserted, self.removed
        );
    }

    fn name(&self) -> &str {
        "console_sink"
    }
}
