//! Output sink interface.
//!
//! The engine hands an [`OutputFrame`] to every registered sink every
//! `save_count` steps. File formats live in `talus-io`; this module only
//! defines the contract plus an in-memory recorder.

use std::sync::{Arc, Mutex};

use talus_contact::ContactReport;
use talus_types::{Scalar, TalusResult};

use crate::config::EngineConfig;
use crate::context::RunContext;
use crate::energy::EnergySummary;
use crate::world::World;

/// Everything a sink may write for one frame.
#[derive(Debug, Clone, Copy)]
pub struct OutputFrame<'a> {
    pub context: &'a RunContext,
    pub config: &'a EngineConfig,
    pub world: &'a World,
    pub energy: EnergySummary,
    /// Contacts of the step that produced this frame. Empty unless some
    /// sink [wants contacts](OutputSink::wants_contacts).
    pub contacts: &'a [ContactReport],
}

/// Trait for frame consumers.
pub trait OutputSink: Send {
    /// Writes one frame. Errors abort the run.
    fn write(&mut self, frame: &OutputFrame<'_>) -> TalusResult<()>;

    /// Called once when the run ends.
    fn finalize(&mut self) -> TalusResult<()> {
        Ok(())
    }

    /// Returns true if this sink needs per-contact reports.
    fn wants_contacts(&self) -> bool {
        false
    }

    /// Returns a human-readable name for this sink.
    fn name(&self) -> &str;
}

/// Compact record of one frame kept by [`FrameRecorder`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub save_index: u64,
    pub step: u64,
    pub time: Scalar,
    pub particles: usize,
    pub contacts: usize,
    pub energy: EnergySummary,
}

/// Keeps a [`FrameRecord`] per frame in a buffer shared with its creator.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    frames: Arc<Mutex<Vec<FrameRecord>>>,
    with_contacts: bool,
    finalized: Arc<Mutex<bool>>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also requests contact reports.
    pub fn with_contacts(mut self) -> Self {
        self.with_contacts = true;
        self
    }

    /// Copies the recorded frames out.
    pub fn frames(&self) -> Vec<FrameRecord> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }

    /// Returns true once the engine finalized the sink.
    pub fn is_finalized(&self) -> bool {
        self.finalized.lock().map(|f| *f).unwrap_or(false)
    }
}

impl OutputSink for FrameRecorder {
    fn write(&mut self, frame: &OutputFrame<'_>) -> TalusResult<()> {
        if let Ok(mut frames) = self.frames.lock() {
            frames.push(FrameRecord {
                save_index: frame.context.save_index,
                step: frame.context.step,
                time: frame.context.time,
                particles: frame.world.particle_count(),
                contacts: frame.contacts.len(),
                energy: frame.energy,
            });
        }
        Ok(())
    }

    fn finalize(&mut self) -> TalusResult<()> {
        if let Ok(mut finalized) = self.finalized.lock() {
            *finalized = true;
        }
        Ok(())
    }

    fn wants_contacts(&self) -> bool {
        self.with_contacts
    }

    fn name(&self) -> &str {
        "frame_recorder"
    }
}
