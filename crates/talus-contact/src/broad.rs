//! Broad phase contact detection trait.
//!
//! Quickly identifies *candidate* particle pairs using a spatial
//! acceleration structure. The narrow phase then refines these
//! candidates into actual contacts with an exact radius-sum test.
//!
//! Particles are addressed by their index in the world's particle list.
//! The world keeps the structure in sync: `insert` on creation, `update`
//! after every integration step, `remove` + `relocate` on swap removal.

use talus_math::Vec3;
use talus_types::Scalar;

/// Trait for broad phase contact detection.
///
/// Implementations must never miss a pair whose spheres overlap.
///
/// # Implementations
/// - `HGrid`: multi-level hash grid (default)
/// - `AllPairs`: exhaustive O(N²) reference
pub trait BroadPhase: Send {
    /// Adds particle `index`.
    fn insert(&mut self, index: usize, position: Vec3, radius: Scalar);

    /// Removes particle `index`. Unknown indices are ignored.
    fn remove(&mut self, index: usize);

    /// Brings the membership of `index` in line with its current position
    /// and radius. Calling it twice with the same arguments is a no-op.
    fn update(&mut self, index: usize, position: Vec3, radius: Scalar);

    /// Renames `from` to `to` after the particle list swapped `from` into
    /// the slot `to` vacated by a removal.
    fn relocate(&mut self, from: usize, to: usize);

    /// Drops every particle.
    fn clear(&mut self);

    /// Rebuilds the structure from scratch.
    fn rebuild(&mut self, items: &[(usize, Vec3, Scalar)]) {
        self.clear();
        for &(index, position, radius) in items {
            self.insert(index, position, radius);
        }
    }

    /// Returns true if inserting a particle of `radius` should be preceded
    /// by a rebuild to keep queries efficient.
    fn needs_rebuild(&self, _radius: Scalar) -> bool {
        false
    }

    /// Writes the candidate neighbours of particle `index` into `out`.
    fn query_candidates_into(&self, index: usize, out: &mut Vec<usize>);

    /// Candidate neighbours of particle `index`.
    fn query_candidates(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.query_candidates_into(index, &mut out);
        out
    }

    /// Writes every candidate pair exactly once into `out`, in ascending
    /// order of the first index.
    fn candidate_pairs_into(&self, out: &mut Vec<(usize, usize)>);

    /// Every candidate pair exactly once.
    fn candidate_pairs(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        self.candidate_pairs_into(&mut out);
        out
    }

    /// Writes every particle that could overlap a hypothetical sphere at
    /// `position` with `radius` into `out`.
    fn candidates_near(&self, position: Vec3, radius: Scalar, out: &mut Vec<usize>);

    /// Number of tracked particles.
    fn len(&self) -> usize;

    /// Returns true if no particle is tracked.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the broad phase strategy name.
    fn name(&self) -> &str;
}

/// Exhaustive broad phase: every tracked particle is a candidate of every
/// other. Used as ground truth in tests and for tiny systems.
#[derive(Debug, Clone, Default)]
pub struct AllPairs {
    present: Vec<bool>,
    count: usize,
}

impl AllPairs {
    /// Creates an empty all-pairs broad phase.
    pub fn new() -> Self {
        Self::default()
    }

    fn contains(&self, index: usize) -> bool {
        self.present.get(index).copied().unwrap_or(false)
    }
}

impl BroadPhase for AllPairs {
    fn insert(&mut self, index: usize, _position: Vec3, _radius: Scalar) {
        if index >= self.present.len() {
            self.present.resize(index + 1, false);
        }
        if !self.present[index] {
            self.present[index] = true;
            self.count += 1;
        }
    }

    fn remove(&mut self, index: usize) {
        if self.contains(index) {
            self.present[index] = false;
            self.count -= 1;
        }
    }

    fn update(&mut self, index: usize, position: Vec3, radius: Scalar) {
        self.insert(index, position, radius);
    }

    fn relocate(&mut self, from: usize, to: usize) {
        if from == to || !self.contains(from) {
            return;
        }
        self.remove(from);
        self.insert(to, Vec3::ZERO, 0.0);
    }

    fn clear(&mut self) {
        self.present.clear();
        self.count = 0;
    }

    fn query_candidates_into(&self, index: usize, out: &mut Vec<usize>) {
        out.clear();
        if !self.contains(index) {
            return;
        }
        out.extend(
            self.present
                .iter()
                .enumerate()
                .filter(|&(j, &p)| p && j != index)
                .map(|(j, _)| j),
        );
    }

    fn candidate_pairs_into(&self, out: &mut Vec<(usize, usize)>) {
        out.clear();
        let live: Vec<usize> = (0..self.present.len()).filter(|&i| self.present[i]).collect();
        for (k, &i) in live.iter().enumerate() {
            for &j in &live[k + 1..] {
                out.push((i, j));
            }
        }
    }

    fn candidates_near(&self, _position: Vec3, _radius: Scalar, out: &mut Vec<usize>) {
        out.clear();
        out.extend((0..self.present.len()).filter(|&i| self.present[i]));
    }

    fn len(&self) -> usize {
        self.count
    }

    fn name(&self) -> &str {
        "all_pairs"
    }
}
