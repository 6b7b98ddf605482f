//! # talus-solver
//!
//! Particles, the simulation world and the DEM time loop.
//!
//! ## Key Types
//!
//! - [`Particle`]: soft sphere with its contact history
//! - [`World`]: particles, walls, species and broad phase, kept in sync
//! - [`EngineConfig`]: timestep, duration, gravity, output cadence, grid
//! - [`Engine`]: the step loop, with boundaries, hooks and output sinks
//! - [`Boundary`]: insertion / deletion before each step
//! - [`ScenarioHooks`]: scenario callbacks with no-op defaults
//! - [`OutputSink`]: frame consumer, implemented by the `talus-io` writers

pub mod boundary;
pub mod config;
pub mod context;
pub mod energy;
pub mod engine;
pub mod hooks;
pub mod integrator;
pub mod output;
pub mod particle;
pub mod world;

pub use boundary::{Boundary, BoundaryReport, CuboidInsertionBoundary, PlaneDeletionBoundary};
pub use config::EngineConfig;
pub use context::RunContext;
pub use energy::EnergySummary;
pub use engine::{Engine, RunSummary};
pub use hooks::{NoHooks, ScenarioHooks};
pub use output::{FrameRecord, FrameRecorder, OutputFrame, OutputSink};
pub use particle::Particle;
pub use world::{ContactStats, World};
