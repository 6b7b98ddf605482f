//! # talus-telemetry
//!
//! Event bus for simulation telemetry. The engine emits structured events
//! (step timing, contact counts, energies, insertions, outputs) that are
//! consumed by pluggable sinks: an in-memory buffer for tests, `tracing`
//! for logs, and a console printer for the CLI.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SimulationEvent};
pub use sinks::{ConsoleSink, EventSink, TracingSink, VecSink};
