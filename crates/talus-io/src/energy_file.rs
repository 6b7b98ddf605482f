//! Energy time series (`.ene`).
//!
//! A header line followed by one row per output frame:
//! `time gravitational translational rotational elastic com_x com_y com_z`.

use std::io::Write;
use std::path::{Path, PathBuf};

use talus_math::Vec3;
use talus_solver::{EnergySummary, OutputFrame, OutputSink};
use talus_types::{Scalar, TalusResult};

use crate::data_file::DEFAULT_PRECISION;
use crate::text::{self, sig, FrameFile, Tokens};

const HEADER: &str = "time gravitational translational rotational elastic com_x com_y com_z";

/// Appends one row per frame to `<directory>/<run name>.ene`.
#[derive(Debug)]
pub struct EnergyFileWriter {
    file: FrameFile,
    precision: usize,
}

impl EnergyFileWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            file: FrameFile::new(directory.into(), "ene"),
            precision: DEFAULT_PRECISION,
        }
    }

    pub fn with_precision(mut self, digits: usize) -> Self {
        self.precision = digits.max(1);
        self
    }
}

impl OutputSink for EnergyFileWriter {
    fn write(&mut self, frame: &OutputFrame<'_>) -> TalusResult<()> {
        let header = !self.file.is_open();
        let s = |x: Scalar| sig(x, self.precision);
        let e = &frame.energy;
        let row = format!(
            "{} {} {} {} {} {} {} {}",
            s(frame.context.time),
            s(e.gravitational),
            s(e.kinetic),
            s(e.rotational),
            s(e.elastic),
            s(e.center_of_mass.x),
            s(e.center_of_mass.y),
            s(e.center_of_mass.z),
        );
        self.file.append(&frame.context.name, |out| {
            if header {
                writeln!(out, "{HEADER}")?;
            }
            writeln!(out, "{row}")
        })
    }

    fn finalize(&mut self) -> TalusResult<()> {
        self.file.flush()
    }

    fn name(&self) -> &str {
        "energy"
    }
}

/// One row of an energy file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyRow {
    pub time: Scalar,
    pub energy: EnergySummary,
}

/// Reads an energy file back. The `mass` of each summary is not stored
/// and reads as zero.
pub fn read_energy_file(path: &Path) -> TalusResult<Vec<EnergyRow>> {
    let source = text::read_text(path)?;
    let body = source
        .strip_prefix(HEADER)
        .ok_or_else(|| text::persistence(path, "missing energy file header"))?;
    let mut t = Tokens::new(body);
    let mut rows = Vec::new();
    while !t.is_exhausted() {
        let time = t.scalar("time")?;
        let energy = EnergySummary {
            gravitational: t.scalar("gravitational energy")?,
            kinetic: t.scalar("translational energy")?,
            rotational: t.scalar("rotational energy")?,
            elastic: t.scalar("elastic energy")?,
            center_of_mass: t.vec3("centre of mass")?,
            mass: 0.0,
        };
        rows.push(EnergyRow { time, energy });
    }
    Ok(rows)
}

impl EnergyRow {
    /// Total mechanical energy of the row.
    pub fn total(&self) -> Scalar {
        self.energy.total()
    }

    pub fn center_of_mass(&self) -> Vec3 {
        self.energy.center_of_mass
    }
}
