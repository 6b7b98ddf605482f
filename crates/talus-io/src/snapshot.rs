//! Binary particle snapshots.
//!
//! Snapshots capture the particle state of one frame in a compact
//! `bincode` encoding, for inspection and diff-based debugging. Unlike
//! restart files they carry no walls, species table or contact history.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use talus_math::Vec3;
use talus_solver::{OutputFrame, OutputSink, RunContext, World};
use talus_types::{Scalar, TalusError, TalusResult};

use crate::text;

/// Bumped whenever the layout of [`StateSnapshot`] changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Particle state of one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub version: u32,
    pub name: String,
    pub step: u64,
    pub time: Scalar,
    pub dimension: u8,
    pub ids: Vec<u32>,
    pub species: Vec<u16>,
    pub radii: Vec<Scalar>,
    pub masses: Vec<Scalar>,
    /// Flat: `[x0, y0, z0, x1, ...]`.
    pub positions: Vec<Scalar>,
    /// Flat, like `positions`.
    pub velocities: Vec<Scalar>,
    /// Flat, like `positions`.
    pub angular_velocities: Vec<Scalar>,
    /// Flat: `[w0, x0, y0, z0, w1, ...]`.
    pub orientations: Vec<Scalar>,
    pub fixed: Vec<bool>,
}

/// Aggregates printed by `talus inspect`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotSummary {
    pub particles: usize,
    pub fixed: usize,
    pub kinetic_energy: Scalar,
    pub min_radius: Scalar,
    pub max_radius: Scalar,
    pub bounding_box: Option<(Vec3, Vec3)>,
}

fn push3(out: &mut Vec<Scalar>, v: Vec3) {
    out.extend_from_slice(&[v.x, v.y, v.z]);
}

impl StateSnapshot {
    /// Captures the particles of `world`.
    pub fn from_world(context: &RunContext, world: &World) -> Self {
        let n = world.particle_count();
        let mut snapshot = Self {
            version: SNAPSHOT_VERSION,
            name: context.name.clone(),
            step: context.step,
            time: context.time,
            dimension: world.dimension(),
            ids: Vec::with_capacity(n),
            species: Vec::with_capacity(n),
            radii: Vec::with_capacity(n),
            masses: Vec::with_capacity(n),
            positions: Vec::with_capacity(3 * n),
            velocities: Vec::with_capacity(3 * n),
            angular_velocities: Vec::with_capacity(3 * n),
            orientations: Vec::with_capacity(4 * n),
            fixed: Vec::with_capacity(n),
        };
        for p in world.particles() {
            snapshot.ids.push(p.id.0);
            snapshot.species.push(p.species.0);
            snapshot.radii.push(p.radius());
            snapshot.masses.push(p.mass());
            push3(&mut snapshot.positions, p.position);
            push3(&mut snapshot.velocities, p.velocity);
            push3(&mut snapshot.angular_velocities, p.angular_velocity);
            let q = p.orientation;
            snapshot.orientations.extend_from_slice(&[q.w, q.x, q.y, q.z]);
            snapshot.fixed.push(p.is_fixed());
        }
        snapshot
    }

    pub fn particle_count(&self) -> usize {
        self.ids.len()
    }

    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[3 * i..3 * i + 3])
    }

    pub fn velocity(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.velocities[3 * i..3 * i + 3])
    }

    /// Serializes to compact binary format.
    pub fn to_bytes(&self) -> TalusResult<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| TalusError::Serialization(format!("snapshot serialization failed: {e}")))
    }

    /// Deserializes from binary format, rejecting other layout versions.
    pub fn from_bytes(data: &[u8]) -> TalusResult<Self> {
        let snapshot: Self = bincode::deserialize(data).map_err(|e| {
            TalusError::Serialization(format!("snapshot deserialization failed: {e}"))
        })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(TalusError::Serialization(format!(
                "snapshot version {} is not supported (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        let n = snapshot.ids.len();
        let consistent = snapshot.species.len() == n
            && snapshot.radii.len() == n
            && snapshot.masses.len() == n
            && snapshot.positions.len() == 3 * n
            && snapshot.velocities.len() == 3 * n
            && snapshot.angular_velocities.len() == 3 * n
            && snapshot.orientations.len() == 4 * n
            && snapshot.fixed.len() == n;
        if !consistent {
            return Err(TalusError::Serialization(
                "snapshot arrays disagree on the particle count".into(),
            ));
        }
        Ok(snapshot)
    }

    pub fn write_file(&self, path: &Path) -> TalusResult<()> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| text::persistence(path, e))?;
        }
        std::fs::write(path, bytes).map_err(|e| text::persistence(path, e))
    }

    pub fn read_file(path: &Path) -> TalusResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| text::persistence(path, e))?;
        Self::from_bytes(&bytes)
    }

    pub fn summary(&self) -> SnapshotSummary {
        let mut summary = SnapshotSummary {
            particles: self.particle_count(),
            fixed: self.fixed.iter().filter(|&&f| f).count(),
            kinetic_energy: 0.0,
            min_radius: self.radii.iter().copied().fold(Scalar::INFINITY, Scalar::min),
            max_radius: self.radii.iter().copied().fold(0.0, Scalar::max),
            bounding_box: None,
        };
        for i in 0..self.particle_count() {
            let (x, r) = (self.position(i), Vec3::splat(self.radii[i]));
            summary.bounding_box = Some(match summary.bounding_box {
                Some((lo, hi)) => (lo.min(x - r), hi.max(x + r)),
                None => (x - r, x + r),
            });
            if !self.fixed[i] {
                summary.kinetic_energy += 0.5 * self.masses[i] * self.velocity(i).length_squared();
            }
        }
        summary
    }
}

/// Writes `<directory>/<run name>_<save index>.snap` at every frame.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    directory: PathBuf,
    written: Vec<PathBuf>,
}

impl SnapshotWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            written: Vec::new(),
        }
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl OutputSink for SnapshotWriter {
    fn write(&mut self, frame: &OutputFrame<'_>) -> TalusResult<()> {
        let path = self.directory.join(format!(
            "{}_{:05}.snap",
            frame.context.name, frame.context.save_index
        ));
        StateSnapshot::from_world(frame.context, frame.world).write_file(&path)?;
        self.written.push(path);
        Ok(())
    }

    fn name(&self) -> &str {
        "snapshot"
    }
}
