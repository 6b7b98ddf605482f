//! Simulation event types.
//!
//! Events are lightweight value types emitted by the engine at fixed points
//! of each timestep. They carry just enough data to follow a run without
//! touching its state.

use serde::{Deserialize, Serialize};

/// A simulation event emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Number of completed timesteps when the event was emitted.
    pub timestep: u64,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Timestep started.
    TimestepBegin {
        /// Simulation time at the start of the step (seconds).
        sim_time: f64,
    },

    /// Timestep completed.
    TimestepEnd {
        /// Wall-clock time spent in the step (seconds).
        wall_time: f64,
    },

    /// Contact detection and force evaluation completed.
    ContactDetection {
        /// Particle-particle contacts.
        contact_count: u32,
        /// Particle-wall contacts.
        wall_contact_count: u32,
        /// Broad phase candidate pairs examined.
        candidate_pairs: u32,
        /// Largest overlap this step (meters).
        max_overlap: f64,
    },

    /// Energy snapshot.
    Energy {
        /// Translational kinetic energy.
        kinetic: f64,
        /// Rotational kinetic energy.
        rotational: f64,
        /// Gravitational potential energy.
        potential: f64,
        /// Elastic energy stored in contacts.
        elastic: f64,
    },

    /// Insertion boundary activity.
    Insertion {
        /// Particles added this step.
        inserted: u32,
        /// Rejected placement attempts this step.
        failed_attempts: u32,
    },

    /// Particles removed by a deletion boundary.
    Deletion {
        /// Particles removed this step.
        removed: u32,
    },

    /// Output frame written.
    Output {
        /// Index of the frame.
        save_index: u64,
        /// Simulation time of the frame.
        sim_time: f64,
        /// Particle count at the frame.
        particles: u32,
    },

    /// Custom event for extensibility.
    Custom {
        /// Arbitrary label.
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl SimulationEvent {
    /// Creates a new event for the given timestep.
    pub fn new(timestep: u64, kind: EventKind) -> Self {
        Self { timestep, kind }
    }
}
