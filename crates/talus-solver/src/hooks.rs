//! Scenario hooks.
//!
//! A scenario customizes a run by implementing [`ScenarioHooks`] instead
//! of wrapping the engine. All methods have default no-op
//! implementations, so a scenario only overrides what it needs.

use talus_types::TalusResult;

use crate::context::RunContext;
use crate::world::World;

/// Callbacks invoked by the engine at fixed points of a run.
pub trait ScenarioHooks: Send {
    /// Places the initial particles and walls. Called once by `setup`.
    fn setup_initial_conditions(
        &mut self,
        world: &mut World,
        context: &RunContext,
    ) -> TalusResult<()> {
        let _ = (world, context);
        Ok(())
    }

    /// Called at the start of every step, before forces are reset.
    fn before_step(&mut self, world: &mut World, context: &RunContext) {
        let _ = (world, context);
    }

    /// Called at the end of every step, after time has advanced.
    fn after_step(&mut self, world: &mut World, context: &RunContext) {
        let _ = (world, context);
    }

    /// Called once when the run ends.
    fn on_finish(&mut self, world: &World, context: &RunContext) {
        let _ = (world, context);
    }

    /// Returns a human-readable name for this scenario.
    fn name(&self) -> &str;
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl ScenarioHooks for NoHooks {
    fn name(&self) -> &str {
        "none"
    }
}
