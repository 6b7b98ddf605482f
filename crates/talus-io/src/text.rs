//! Whitespace-token reading and file helpers shared by the text formats.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use talus_math::{Quat, Vec3};
use talus_types::{Scalar, TalusError, TalusResult};

/// Cursor over the whitespace-separated tokens of a text file.
///
/// Errors carry the index of the offending token.
pub(crate) struct Tokens<'a> {
    iter: std::str::SplitWhitespace<'a>,
    index: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            iter: text.split_whitespace(),
            index: 0,
        }
    }

    fn error(&self, message: String) -> TalusError {
        TalusError::Parse {
            token: self.index,
            message,
        }
    }

    /// Next raw token; `what` names it in the error at end of input.
    pub fn word(&mut self, what: &str) -> TalusResult<&'a str> {
        let token = self
            .iter
            .next()
            .ok_or_else(|| self.error(format!("unexpected end of input, expected {what}")))?;
        self.index += 1;
        Ok(token)
    }

    /// Consumes `key` or fails.
    pub fn expect(&mut self, key: &str) -> TalusResult<()> {
        let token = self.word(key)?;
        if token != key {
            return Err(self.error(format!("expected '{key}', found '{token}'")));
        }
        Ok(())
    }

    pub fn parse<T: FromStr>(&mut self, what: &str) -> TalusResult<T> {
        let token = self.word(what)?;
        token
            .parse()
            .map_err(|_| self.error(format!("cannot read {what} from '{token}'")))
    }

    pub fn scalar(&mut self, what: &str) -> TalusResult<Scalar> {
        self.parse(what)
    }

    pub fn vec3(&mut self, what: &str) -> TalusResult<Vec3> {
        Ok(Vec3::new(
            self.scalar(what)?,
            self.scalar(what)?,
            self.scalar(what)?,
        ))
    }

    /// `key value`.
    pub fn keyed<T: FromStr>(&mut self, key: &str) -> TalusResult<T> {
        self.expect(key)?;
        self.parse(key)
    }

    /// `key x y z`.
    pub fn keyed_vec3(&mut self, key: &str) -> TalusResult<Vec3> {
        self.expect(key)?;
        self.vec3(key)
    }

    /// `key w x y z`.
    pub fn keyed_quat(&mut self, key: &str) -> TalusResult<Quat> {
        self.expect(key)?;
        let w = self.scalar(key)?;
        let v = self.vec3(key)?;
        Ok(Quat::from_xyzw(v.x, v.y, v.z, w))
    }

    /// `key 0|1`.
    pub fn keyed_flag(&mut self, key: &str) -> TalusResult<bool> {
        match self.keyed::<u8>(key)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(self.error(format!("flag {key} must be 0 or 1, got {other}"))),
        }
    }

    /// Returns true if every token was consumed.
    pub fn is_exhausted(&mut self) -> bool {
        self.iter.clone().next().is_none()
    }
}

/// `x y z` with round-trip precision.
pub(crate) fn vec3(v: Vec3) -> String {
    format!("{} {} {}", v.x, v.y, v.z)
}

/// `w x y z` with round-trip precision.
pub(crate) fn quat(q: Quat) -> String {
    format!("{} {} {} {}", q.w, q.x, q.y, q.z)
}

/// `x` in scientific notation with `digits` significant digits.
pub(crate) fn sig(x: Scalar, digits: usize) -> String {
    format!("{:.*e}", digits.saturating_sub(1), x)
}

pub(crate) fn flag(b: bool) -> u8 {
    u8::from(b)
}

pub(crate) fn persistence(path: &Path, error: impl std::fmt::Display) -> TalusError {
    TalusError::Persistence {
        path: path.display().to_string(),
        message: error.to_string(),
    }
}

/// Creates `path` (and its parent directories) for buffered writing.
pub(crate) fn create_file(path: &Path) -> TalusResult<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| persistence(path, e))?;
    }
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| persistence(path, e))
}

/// Reads a whole text file.
pub(crate) fn read_text(path: &Path) -> TalusResult<String> {
    std::fs::read_to_string(path).map_err(|e| persistence(path, e))
}

/// Text file `<directory>/<run name>.<extension>`, created on the first
/// frame and appended to afterwards.
#[derive(Debug)]
pub(crate) struct FrameFile {
    directory: PathBuf,
    extension: &'static str,
    open: Option<(PathBuf, BufWriter<File>)>,
}

impl FrameFile {
    pub fn new(directory: PathBuf, extension: &'static str) -> Self {
        Self {
            directory,
            extension,
            open: None,
        }
    }

    /// Returns true once the file has been created.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Runs `write` against the file, creating it first if needed.
    /// I/O failures become persistence errors naming the file.
    pub fn append(
        &mut self,
        run_name: &str,
        write: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
    ) -> TalusResult<()> {
        let (path, out) = match &mut self.open {
            Some(open) => open,
            None => {
                let path = self
                    .directory
                    .join(format!("{run_name}.{}", self.extension));
                let out = create_file(&path)?;
                self.open.insert((path, out))
            }
        };
        write(out).map_err(|e| persistence(path, e))
    }

    pub fn flush(&mut self) -> TalusResult<()> {
        if let Some((path, out)) = &mut self.open {
            out.flush().map_err(|e| persistence(path, e))?;
        }
        Ok(())
    }
}
