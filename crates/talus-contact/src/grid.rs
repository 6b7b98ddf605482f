//! Hierarchical hash grid broad phase.
//!
//! Particles are binned into size *levels*. Level `l` has the uniform
//! cell size `base * level_ratio^l`, and a particle of radius `r` lives in
//! the lowest level whose cells are at least `2 * cell_over_size_ratio * r`
//! wide. Two particles can then only touch if, at the coarser of their
//! two levels, their cells are neighbours, so a query for particle `p`
//! visits the 3×3×3 (3D) or 3×3 (2D) block around `p` at its own level and
//! at every occupied coarser level. Pairs with a finer particle are found
//! from that finer particle's query.
//!
//! Cells are hashed into a fixed table of buckets. Buckets are plain index
//! vectors and every particle's slot (level, cell, bucket) is kept in an
//! arena indexed by particle index, so removal costs one bucket scan.
//! Hash collisions only cost time: a query keeps a bucket entry only if
//! its stored (level, cell) is exactly the one being visited.

use serde::{Deserialize, Serialize};
use talus_math::Vec3;
use talus_types::constants::{DEFAULT_NUMBER_OF_BUCKETS, MIN_CELL_SIZE};
use talus_types::{Scalar, TalusError, TalusResult};

use crate::broad::BroadPhase;

/// Tuning parameters of the hierarchical grid.
///
/// None of them affects correctness, only speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Size of the bucket table.
    pub number_of_buckets: usize,
    /// Cell size over particle diameter (>= 1).
    pub cell_over_size_ratio: Scalar,
    /// Cell size growth between consecutive levels (> 1).
    pub level_ratio: Scalar,
    /// Floor on every cell size.
    pub min_cell_size: Scalar,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            number_of_buckets: DEFAULT_NUMBER_OF_BUCKETS,
            cell_over_size_ratio: 1.0,
            level_ratio: 2.0,
            min_cell_size: MIN_CELL_SIZE,
        }
    }
}

impl GridConfig {
    /// Checks every field is in range.
    pub fn validate(&self) -> TalusResult<()> {
        if self.number_of_buckets == 0 {
            return Err(TalusError::InvalidConfig(
                "grid.number_of_buckets must be at least 1".into(),
            ));
        }
        if !(self.cell_over_size_ratio >= 1.0 && self.cell_over_size_ratio.is_finite()) {
            return Err(TalusError::InvalidConfig(format!(
                "grid.cell_over_size_ratio must be >= 1, got {}",
                self.cell_over_size_ratio
            )));
        }
        if !(self.level_ratio > 1.0 && self.level_ratio.is_finite()) {
            return Err(TalusError::InvalidConfig(format!(
                "grid.level_ratio must be > 1, got {}",
                self.level_ratio
            )));
        }
        if !(self.min_cell_size > 0.0 && self.min_cell_size.is_finite()) {
            return Err(TalusError::InvalidConfig(format!(
                "grid.min_cell_size must be positive, got {}",
                self.min_cell_size
            )));
        }
        Ok(())
    }
}

/// Where a particle currently lives in the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Slot {
    level: usize,
    cell: [i64; 3],
    bucket: usize,
    /// Position at the last insert/update; coarser-level cells are
    /// derived from it.
    position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Level {
    cell_size: Scalar,
    inv_cell_size: Scalar,
    occupancy: usize,
}

impl Level {
    fn new(cell_size: Scalar) -> Self {
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            occupancy: 0,
        }
    }
}

/// Multi-level hash grid over particle indices.
#[derive(Debug, Clone, PartialEq)]
pub struct HGrid {
    config: GridConfig,
    dimension: u8,
    levels: Vec<Level>,
    buckets: Vec<Vec<usize>>,
    slots: Vec<Option<Slot>>,
    count: usize,
}

impl HGrid {
    /// Creates an empty grid for a 2D or 3D world.
    pub fn new(config: GridConfig, dimension: u8) -> Self {
        let bucket_count = config.number_of_buckets.max(1);
        Self {
            config,
            dimension,
            levels: Vec::new(),
            buckets: vec![Vec::new(); bucket_count],
            slots: Vec::new(),
            count: 0,
        }
    }

    /// Returns the grid configuration.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Number of levels created so far.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Cell size of `level`.
    pub fn cell_size(&self, level: usize) -> Option<Scalar> {
        self.levels.get(level).map(|l| l.cell_size)
    }

    /// Number of particles in `level`.
    pub fn occupancy(&self, level: usize) -> usize {
        self.levels.get(level).map_or(0, |l| l.occupancy)
    }

    /// Size of the bucket table.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Length of the longest bucket.
    pub fn max_bucket_len(&self) -> usize {
        self.buckets.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Level of particle `index`, if tracked.
    pub fn level_of(&self, index: usize) -> Option<usize> {
        self.slot(index).map(|s| s.level)
    }

    /// Cell of particle `index` at its own level, if tracked.
    pub fn cell_of(&self, index: usize) -> Option<[i64; 3]> {
        self.slot(index).map(|s| s.cell)
    }

    /// Bucket holding particle `index`, if tracked.
    pub fn bucket_of(&self, index: usize) -> Option<usize> {
        self.slot(index).map(|s| s.bucket)
    }

    /// Number of entries in `bucket`.
    pub fn bucket_len(&self, bucket: usize) -> usize {
        self.buckets.get(bucket).map_or(0, Vec::len)
    }

    #[inline]
    fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Minimum cell size that can hold a particle of `radius`.
    fn required_cell_size(&self, radius: Scalar) -> Scalar {
        let size = 2.0 * self.config.cell_over_size_ratio * radius;
        if size.is_nan() {
            0.0
        } else {
            size
        }
    }

    fn push_level(&mut self, cell_size: Scalar) {
        self.levels.push(Level::new(cell_size));
        tracing::debug!(
            level = self.levels.len() - 1,
            cell_size,
            "hierarchical grid level added"
        );
    }

    /// Level for `radius`, appending coarser levels as needed.
    fn level_for(&mut self, radius: Scalar) -> usize {
        let size = self.required_cell_size(radius);
        if self.levels.is_empty() {
            self.push_level(size.max(self.config.min_cell_size));
        }
        let mut level = 0;
        loop {
            if level == self.levels.len() {
                let next = self.levels[level - 1].cell_size * self.config.level_ratio;
                self.push_level(next);
            }
            if self.levels[level].cell_size >= size {
                return level;
            }
            level += 1;
        }
    }

    #[inline]
    fn cell_at(&self, level: usize, position: Vec3) -> [i64; 3] {
        let inv = self.levels[level].inv_cell_size;
        let z = if self.dimension == 2 {
            0
        } else {
            cell_coordinate(position.z * inv)
        };
        [cell_coordinate(position.x * inv), cell_coordinate(position.y * inv), z]
    }

    #[inline]
    fn bucket_index(&self, level: usize, cell: [i64; 3]) -> usize {
        let hash = cell[0].wrapping_mul(73_856_093)
            ^ cell[1].wrapping_mul(19_349_663)
            ^ cell[2].wrapping_mul(83_492_791)
            ^ (level as i64).wrapping_mul(67_867_967);
        (hash as u64 % self.buckets.len() as u64) as usize
    }

    /// Calls `visit` for every particle whose slot is exactly
    /// (`level`, cell) with cell within `extent` of `center`.
    fn visit_block(&self, level: usize, center: [i64; 3], extent: i64, mut visit: impl FnMut(usize)) {
        let z_extent = if self.dimension == 2 { 0 } else { extent };
        for dx in -extent..=extent {
            for dy in -extent..=extent {
                for dz in -z_extent..=z_extent {
                    let cell = [center[0] + dx, center[1] + dy, center[2] + dz];
                    let bucket = self.bucket_index(level, cell);
                    for &j in &self.buckets[bucket] {
                        if let Some(s) = self.slot(j) {
                            if s.level == level && s.cell == cell {
                                visit(j);
                            }
                        }
                    }
                }
            }
        }
    }

    fn place(&mut self, index: usize, position: Vec3, level: usize) {
        let cell = self.cell_at(level, position);
        let bucket = self.bucket_index(level, cell);
        self.buckets[bucket].push(index);
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(Slot {
            level,
            cell,
            bucket,
            position,
        });
        self.levels[level].occupancy += 1;
        self.count += 1;
    }
}

/// Cell coordinates are clamped to `±CELL_LIMIT`, so neighbour offsets
/// never overflow. Far-away particles share the edge cells.
const CELL_LIMIT: i64 = 1 << 52;

#[inline]
fn cell_coordinate(scaled: Scalar) -> i64 {
    (scaled.floor() as i64).clamp(-CELL_LIMIT, CELL_LIMIT)
}

impl BroadPhase for HGrid {
    fn insert(&mut self, index: usize, position: Vec3, radius: Scalar) {
        if self.slot(index).is_some() {
            self.remove(index);
        }
        let level = self.level_for(radius);
        self.place(index, position, level);
    }

    fn remove(&mut self, index: usize) {
        let Some(slot) = self.slots.get_mut(index).and_then(Option::take) else {
            return;
        };
        let bucket = &mut self.buckets[slot.bucket];
        if let Some(pos) = bucket.iter().position(|&j| j == index) {
            bucket.remove(pos);
        }
        self.levels[slot.level].occupancy -= 1;
        self.count -= 1;
    }

    fn update(&mut self, index: usize, position: Vec3, radius: Scalar) {
        let Some(current) = self.slot(index).copied() else {
            self.insert(index, position, radius);
            return;
        };
        let level = self.level_for(radius);
        let cell = self.cell_at(level, position);
        if level == current.level && cell == current.cell {
            if let Some(slot) = self.slots[index].as_mut() {
                slot.position = position;
            }
            return;
        }
        self.remove(index);
        self.place(index, position, level);
    }

    fn relocate(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        let Some(slot) = self.slots.get_mut(from).and_then(Option::take) else {
            return;
        };
        if self.slot(to).is_some() {
            self.remove(to);
        }
        for j in self.buckets[slot.bucket].iter_mut() {
            if *j == from {
                *j = to;
            }
        }
        if to >= self.slots.len() {
            self.slots.resize(to + 1, None);
        }
        self.slots[to] = Some(slot);
    }

    fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.levels.clear();
        self.slots.clear();
        self.count = 0;
    }

    fn rebuild(&mut self, items: &[(usize, Vec3, Scalar)]) {
        self.clear();
        let min_radius = items
            .iter()
            .map(|&(_, _, r)| r)
            .filter(|r| !r.is_nan())
            .fold(Scalar::INFINITY, Scalar::min);
        if min_radius.is_finite() {
            let base = self
                .required_cell_size(min_radius)
                .max(self.config.min_cell_size);
            self.push_level(base);
        }
        for &(index, position, radius) in items {
            self.insert(index, position, radius);
        }
        tracing::debug!(
            particles = self.count,
            levels = self.levels.len(),
            base = self.cell_size(0).unwrap_or(0.0),
            "hierarchical grid rebuilt"
        );
    }

    fn needs_rebuild(&self, radius: Scalar) -> bool {
        let Some(base) = self.cell_size(0) else {
            return false;
        };
        let size = self
            .required_cell_size(radius)
            .max(self.config.min_cell_size);
        size * self.config.level_ratio <= base
    }

    fn query_candidates_into(&self, index: usize, out: &mut Vec<usize>) {
        out.clear();
        let Some(own) = self.slot(index).copied() else {
            return;
        };
        for level in own.level..self.levels.len() {
            if self.levels[level].occupancy == 0 {
                continue;
            }
            let center = if level == own.level {
                own.cell
            } else {
                self.cell_at(level, own.position)
            };
            self.visit_block(level, center, 1, |j| {
                if j != index {
                    out.push(j);
                }
            });
        }
    }

    fn candidate_pairs_into(&self, out: &mut Vec<(usize, usize)>) {
        out.clear();
        let mut scratch = Vec::new();
        for (i, slot) in self.slots.iter().enumerate() {
            let Some(own) = slot else { continue };
            self.query_candidates_into(i, &mut scratch);
            for &j in &scratch {
                let same_level = self.slot(j).is_some_and(|s| s.level == own.level);
                if same_level && j < i {
                    continue;
                }
                out.push((i, j));
            }
        }
    }

    fn candidates_near(&self, position: Vec3, radius: Scalar, out: &mut Vec<usize>) {
        out.clear();
        let radius = radius.max(0.0);
        for (level, info) in self.levels.iter().enumerate() {
            if info.occupancy == 0 {
                continue;
            }
            let extent = (radius * info.inv_cell_size + 0.5).ceil();
            let span = 2.0 * extent + 1.0;
            let cells = if self.dimension == 2 {
                span * span
            } else {
                span * span * span
            };
            if cells > info.occupancy as Scalar {
                // Cheaper to look at every particle of the level.
                out.extend(
                    self.slots
                        .iter()
                        .enumerate()
                        .filter(|(_, s)| s.is_some_and(|s| s.level == level))
                        .map(|(j, _)| j),
                );
            } else {
                let center = self.cell_at(level, position);
                self.visit_block(level, center, extent as i64, |j| out.push(j));
            }
        }
    }

    fn len(&self) -> usize {
        self.count
    }

    fn name(&self) -> &str {
        "hgrid"
    }
}
