//! Particle data files (`.data`).
//!
//! One frame per output step. Each frame starts with the header
//! `N time xmin ymin zmin xmax ymax zmax` followed by one line per particle:
//!
//! ```text
//! x y z vx vy vz r qw qx qy qz wx wy wz species
//! ```
//!
//! Values are written with a fixed number of significant digits, so a
//! frame read back matches the written state to that precision.

use std::io::Write;
use std::path::{Path, PathBuf};

use talus_math::{Quat, Vec3};
use talus_solver::{OutputFrame, OutputSink};
use talus_types::{Scalar, SpeciesId, TalusResult};

use crate::text::{self, sig, FrameFile, Tokens};

/// Default significant digits of the text formats.
pub const DEFAULT_PRECISION: usize = 6;

/// One particle line of a data frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataParticle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: Scalar,
    pub orientation: Quat,
    pub angular_velocity: Vec3,
    pub species: SpeciesId,
}

/// One frame of a data file.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    pub time: Scalar,
    pub domain_min: Vec3,
    pub domain_max: Vec3,
    pub particles: Vec<DataParticle>,
}

/// Appends a frame to `<directory>/<run name>.data` at every output step.
#[derive(Debug)]
pub struct DataFileWriter {
    file: FrameFile,
    precision: usize,
    frames: usize,
}

impl DataFileWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            file: FrameFile::new(directory.into(), "data"),
            precision: DEFAULT_PRECISION,
            frames: 0,
        }
    }

    /// Significant digits per value (at least 1).
    pub fn with_precision(mut self, digits: usize) -> Self {
        self.precision = digits.max(1);
        self
    }

    /// Frames written so far.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl OutputSink for DataFileWriter {
    fn write(&mut self, frame: &OutputFrame<'_>) -> TalusResult<()> {
        let digits = self.precision;
        self.file
            .append(&frame.context.name, |out| write_frame(out, frame, digits))?;
        self.frames += 1;
        Ok(())
    }

    fn finalize(&mut self) -> TalusResult<()> {
        self.file.flush()
    }

    fn name(&self) -> &str {
        "data"
    }
}

fn write_frame<W: Write>(out: &mut W, frame: &OutputFrame<'_>, digits: usize) -> std::io::Result<()> {
    let s = |x: Scalar| sig(x, digits);
    let v = |v: Vec3| format!("{} {} {}", s(v.x), s(v.y), s(v.z));
    let (min, max) = (frame.config.domain_min, frame.config.domain_max);
    writeln!(
        out,
        "{} {} {} {}",
        frame.world.particle_count(),
        s(frame.context.time),
        v(min),
        v(max)
    )?;
    for p in frame.world.particles() {
        let q = p.orientation;
        writeln!(
            out,
            "{} {} {} {} {} {} {} {} {}",
            v(p.position),
            v(p.velocity),
            s(p.radius()),
            s(q.w),
            s(q.x),
            s(q.y),
            s(q.z),
            v(p.angular_velocity),
            p.species.0
        )?;
    }
    Ok(())
}

/// Reads every frame of a data file.
pub fn read_data_frames(path: &Path) -> TalusResult<Vec<DataFrame>> {
    parse_data_frames(&text::read_text(path)?)
}

/// Parses the contents of a data file.
pub fn parse_data_frames(source: &str) -> TalusResult<Vec<DataFrame>> {
    let mut t = Tokens::new(source);
    let mut frames = Vec::new();
    while !t.is_exhausted() {
        let count: usize = t.parse("particle count")?;
        let time = t.scalar("time")?;
        let domain_min = t.vec3("domain minimum")?;
        let domain_max = t.vec3("domain maximum")?;
        let mut particles = Vec::with_capacity(count);
        for _ in 0..count {
            let position = t.vec3("position")?;
            let velocity = t.vec3("velocity")?;
            let radius = t.scalar("radius")?;
            let w = t.scalar("orientation")?;
            let axis = t.vec3("orientation")?;
            let angular_velocity = t.vec3("angular velocity")?;
            let species = SpeciesId(t.parse("species")?);
            particles.push(DataParticle {
                position,
                velocity,
                radius,
                orientation: Quat::from_xyzw(axis.x, axis.y, axis.z, w),
                angular_velocity,
                species,
            });
        }
        frames.push(DataFrame {
            time,
            domain_min,
            domain_max,
            particles,
        });
    }
    Ok(frames)
}
