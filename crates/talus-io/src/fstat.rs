//! Contact statistics (`.fstat`).
//!
//! Each frame starts with `# time contacts`, then one line per contact:
//!
//! ```text
//! time owner target cx cy cz overlap fn ftx fty ftz nx ny nz
//! ```
//!
//! `target` is `P<id>` for a particle and `W<id>` for a wall. The normal
//! points from the target towards the owner; `fn` is the signed normal
//! force on the owner.

use std::io::Write;
use std::path::{Path, PathBuf};

use talus_contact::ContactReport;
use talus_math::Vec3;
use talus_solver::{OutputFrame, OutputSink};
use talus_types::{ContactTarget, ParticleId, Scalar, TalusError, TalusResult, WallId};

use crate::data_file::DEFAULT_PRECISION;
use crate::text::{self, sig, FrameFile, Tokens};

/// Appends the contacts of every output step to
/// `<directory>/<run name>.fstat`.
#[derive(Debug)]
pub struct FStatWriter {
    file: FrameFile,
    precision: usize,
}

impl FStatWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            file: FrameFile::new(directory.into(), "fstat"),
            precision: DEFAULT_PRECISION,
        }
    }

    pub fn with_precision(mut self, digits: usize) -> Self {
        self.precision = digits.max(1);
        self
    }
}

fn target_token(target: ContactTarget) -> String {
    match target {
        ContactTarget::Particle(id) => format!("P{}", id.0),
        ContactTarget::Wall(id) => format!("W{}", id.0),
    }
}

impl OutputSink for FStatWriter {
    fn write(&mut self, frame: &OutputFrame<'_>) -> TalusResult<()> {
        let digits = self.precision;
        let s = |x: Scalar| sig(x, digits);
        let v = |v: Vec3| format!("{} {} {}", s(v.x), s(v.y), s(v.z));
        let time = s(frame.context.time);
        self.file.append(&frame.context.name, |out| {
            writeln!(out, "# {time} {}", frame.contacts.len())?;
            for c in frame.contacts {
                writeln!(
                    out,
                    "{time} {} {} {} {} {} {} {}",
                    c.owner.0,
                    target_token(c.target),
                    v(c.contact_point),
                    s(c.overlap),
                    s(c.normal_force),
                    v(c.tangential_force),
                    v(c.normal)
                )?;
            }
            Ok(())
        })
    }

    fn finalize(&mut self) -> TalusResult<()> {
        self.file.flush()
    }

    fn wants_contacts(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "fstat"
    }
}

/// A contact read back from an fstat file, with the frame time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FStatRecord {
    pub time: Scalar,
    pub report: ContactReport,
}

/// Reads every contact line of an fstat file. Frame headers are skipped.
pub fn read_fstat(path: &Path) -> TalusResult<Vec<FStatRecord>> {
    let source = text::read_text(path)?;
    let mut records = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let at_line = |e: TalusError| match e {
            TalusError::Parse { message, .. } => TalusError::Parse {
                token: line_no + 1,
                message: format!("line {}: {message}", line_no + 1),
            },
            other => other,
        };
        records.push(parse_line(line).map_err(at_line)?);
    }
    Ok(records)
}

fn parse_line(line: &str) -> TalusResult<FStatRecord> {
    let mut t = Tokens::new(line);
    let time = t.scalar("time")?;
    let owner = ParticleId(t.parse("owner")?);
    let token = t.word("target")?;
    let bad_target = || TalusError::Parse {
        token: 3,
        message: format!("bad contact target '{token}'"),
    };
    let target = if let Some(id) = token.strip_prefix('P') {
        ContactTarget::Particle(ParticleId(id.parse().map_err(|_| bad_target())?))
    } else if let Some(id) = token.strip_prefix('W') {
        ContactTarget::Wall(WallId(id.parse().map_err(|_| bad_target())?))
    } else {
        return Err(bad_target());
    };
    Ok(FStatRecord {
        time,
        report: ContactReport {
            owner,
            target,
            contact_point: t.vec3("contact point")?,
            overlap: t.scalar("overlap")?,
            normal_force: t.scalar("normal force")?,
            tangential_force: t.vec3("tangential force")?,
            normal: t.vec3("normal")?,
        },
    })
}
