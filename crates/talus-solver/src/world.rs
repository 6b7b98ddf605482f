//! The world: particles, walls, species and the broad phase that indexes
//! them.
//!
//! Particles live in a dense `Vec` addressed by index. The broad phase is
//! keyed by the same index, so every structural change (insertion, swap
//! removal, radius change) goes through a `World` method that keeps both
//! in sync. Ids are stable across removals and never reused.

use std::collections::HashMap;

use talus_contact::{
    compute_contact_force, particle_pair_geometry, particle_wall_geometry, BroadPhase,
    ContactHistoryRecord, ContactHistoryStore, ContactReport, GridConfig, HGrid, Wall,
};
use talus_math::Vec3;
use talus_species::SpeciesTable;
use talus_types::{ContactTarget, ParticleId, Scalar, TalusError, TalusResult, WallId};

use crate::config::EngineConfig;
use crate::integrator;
use crate::particle::Particle;

/// Summary of one force evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactStats {
    /// Pairs returned by the broad phase.
    pub candidate_pairs: usize,
    /// Particle-particle contacts that actually overlapped.
    pub particle_contacts: usize,
    /// Particle-wall contacts.
    pub wall_contacts: usize,
    /// Largest overlap seen.
    pub max_overlap: Scalar,
    /// Energy stored in all contact springs.
    pub elastic_energy: Scalar,
    /// History records dropped because their contact opened.
    pub pruned_records: usize,
}

impl ContactStats {
    /// All closed contacts.
    pub fn contact_count(&self) -> usize {
        self.particle_contacts + self.wall_contacts
    }
}

/// Particles, walls and species of a simulation.
pub struct World {
    dimension: u8,
    species: SpeciesTable,
    particles: Vec<Particle>,
    walls: Vec<Wall>,
    broad: Box<dyn BroadPhase>,
    index_of: HashMap<ParticleId, usize>,
    next_particle_id: u32,
    next_wall_id: u32,
    history_capacity: usize,
    pair_buffer: Vec<(usize, usize)>,
}

impl World {
    /// Creates an empty world indexed by an [`HGrid`].
    pub fn new(dimension: u8, species: SpeciesTable, grid: GridConfig) -> TalusResult<Self> {
        let config = EngineConfig {
            dimension,
            grid,
            ..EngineConfig::default()
        };
        Self::from_config(&config, species)
    }

    /// Creates an empty world for `config`.
    pub fn from_config(config: &EngineConfig, species: SpeciesTable) -> TalusResult<Self> {
        if config.dimension != 2 && config.dimension != 3 {
            return Err(TalusError::InvalidConfig(format!(
                "dimension must be 2 or 3, got {}",
                config.dimension
            )));
        }
        config.grid.validate()?;
        if species.is_empty() {
            return Err(TalusError::InvalidSpecies(
                "a world needs at least one species".into(),
            ));
        }
        Ok(Self {
            dimension: config.dimension,
            species,
            particles: Vec::new(),
            walls: Vec::new(),
            broad: Box::new(HGrid::new(config.grid, config.dimension)),
            index_of: HashMap::new(),
            next_particle_id: 0,
            next_wall_id: 0,
            history_capacity: config.effective_history_capacity(),
            pair_buffer: Vec::new(),
        })
    }

    /// Swaps in another broad phase and indexes every particle in it.
    pub fn with_broad_phase(mut self, broad: Box<dyn BroadPhase>) -> Self {
        self.broad = broad;
        self.rebuild_grid();
        self
    }

    // ─── Accessors ───────────────────────────────────────────

    #[inline]
    pub fn dimension(&self) -> u8 {
        self.dimension
    }

    #[inline]
    pub fn species(&self) -> &SpeciesTable {
        &self.species
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access to the particles. Moving a particle leaves the
    /// broad phase stale until [`update_grid`](Self::update_grid); use
    /// [`set_radius`](Self::set_radius) to resize.
    #[inline]
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    #[inline]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Index of the particle with `id`, if it is still alive.
    pub fn index_of(&self, id: ParticleId) -> Option<usize> {
        self.index_of.get(&id).copied()
    }

    pub fn particle_by_id(&self, id: ParticleId) -> Option<&Particle> {
        self.index_of(id).map(|i| &self.particles[i])
    }

    #[inline]
    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    #[inline]
    pub fn walls_mut(&mut self) -> &mut [Wall] {
        &mut self.walls
    }

    pub fn wall(&self, id: WallId) -> Option<&Wall> {
        self.walls.iter().find(|w| w.id == id)
    }

    #[inline]
    pub fn broad_phase(&self) -> &dyn BroadPhase {
        self.broad.as_ref()
    }

    /// Id the next created particle will receive.
    #[inline]
    pub fn next_particle_id(&self) -> ParticleId {
        ParticleId(self.next_particle_id)
    }

    /// Raises the id counter, e.g. after a restart in which the highest
    /// ids had already been deleted. Never lowers it.
    pub fn reserve_particle_ids(&mut self, next: ParticleId) {
        self.next_particle_id = self.next_particle_id.max(next.0);
    }

    // ─── Particles ───────────────────────────────────────────

    /// Adds a particle, assigning its id and deriving its mass and inertia.
    ///
    /// In 2D the particle is projected onto the xy plane.
    pub fn add_particle(&mut self, mut particle: Particle) -> TalusResult<ParticleId> {
        particle.id = ParticleId(self.next_particle_id);
        self.admit(&mut particle)?;
        self.next_particle_id += 1;
        let id = particle.id;
        self.push_particle(particle);
        Ok(id)
    }

    /// Adds a particle read back from a restart file, keeping its id and
    /// contact history.
    pub fn restore_particle(&mut self, mut particle: Particle) -> TalusResult<()> {
        if self.index_of.contains_key(&particle.id) {
            return Err(TalusError::InvalidParticle(format!(
                "particle {} already exists",
                particle.id.0
            )));
        }
        self.admit(&mut particle)?;
        self.next_particle_id = self.next_particle_id.max(particle.id.0 + 1);
        self.push_particle(particle);
        Ok(())
    }

    fn admit(&self, particle: &mut Particle) -> TalusResult<()> {
        let Some(species) = self.species.get(particle.species) else {
            return Err(TalusError::InvalidParticle(format!(
                "particle {} uses unknown species {}",
                particle.id.0, particle.species.0
            )));
        };
        let radius = particle.radius();
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(TalusError::InvalidParticle(format!(
                "particle {} has radius {radius}",
                particle.id.0
            )));
        }
        if !(particle.position.is_finite() && particle.velocity.is_finite()) {
            return Err(TalusError::InvalidParticle(format!(
                "particle {} has a non-finite position or velocity",
                particle.id.0
            )));
        }
        if self.dimension == 2 {
            project_to_plane(particle);
        }
        particle.assign_radius(radius, species.density, self.dimension);
        if particle.history.is_empty() {
            particle.history = ContactHistoryStore::with_capacity(self.history_capacity);
        }
        Ok(())
    }

    fn push_particle(&mut self, particle: Particle) {
        let index = self.particles.len();
        let (position, radius) = (particle.position, particle.radius());
        self.index_of.insert(particle.id, index);
        self.particles.push(particle);
        if self.broad.needs_rebuild(radius) {
            tracing::debug!(radius, particles = self.particles.len(), "rebuilding broad phase for a smaller particle");
            self.rebuild_grid();
        } else {
            self.broad.insert(index, position, radius);
        }
    }

    /// Removes the particle at `index` by swapping the last particle into
    /// its slot. Returns the removed particle.
    pub fn remove_particle(&mut self, index: usize) -> Option<Particle> {
        if index >= self.particles.len() {
            return None;
        }
        let last = self.particles.len() - 1;
        let removed = self.particles.swap_remove(index);
        self.broad.remove(index);
        self.index_of.remove(&removed.id);
        if index != last {
            self.broad.relocate(last, index);
            self.index_of.insert(self.particles[index].id, index);
        }
        Some(removed)
    }

    /// Changes the radius of particle `index`, rederiving mass and inertia.
    /// Invalid radii are rejected with a warning.
    pub fn set_radius(&mut self, index: usize, radius: Scalar) -> bool {
        let Some(particle) = self.particles.get(index) else {
            tracing::warn!(index, "set_radius on a missing particle");
            return false;
        };
        if !(radius > 0.0 && radius.is_finite()) {
            tracing::warn!(id = particle.id.0, radius, "radius must be positive; keeping {}", particle.radius());
            return false;
        }
        let density = self.species.get(particle.species).map_or(0.0, |s| s.density);
        let dimension = self.dimension;
        let particle = &mut self.particles[index];
        particle.assign_radius(radius, density, dimension);
        let position = particle.position;
        if self.broad.needs_rebuild(radius) {
            self.rebuild_grid();
        } else {
            self.broad.update(index, position, radius);
        }
        true
    }

    /// Pins (`fixed = true`) or releases the particle at `index`.
    pub fn set_fixed(&mut self, index: usize, fixed: bool) -> bool {
        match self.particles.get_mut(index) {
            Some(particle) => {
                particle.set_fixed(fixed);
                true
            }
            None => false,
        }
    }

    // ─── Walls ───────────────────────────────────────────────

    /// Adds a wall and assigns its id.
    pub fn add_wall(&mut self, mut wall: Wall) -> TalusResult<WallId> {
        wall.id = WallId(self.next_wall_id);
        self.admit_wall(&wall)?;
        self.next_wall_id += 1;
        let id = wall.id;
        self.walls.push(wall);
        Ok(id)
    }

    /// Adds a wall read back from a restart file, keeping its id.
    pub fn restore_wall(&mut self, wall: Wall) -> TalusResult<()> {
        if self.wall(wall.id).is_some() {
            return Err(TalusError::InvalidWall(format!("wall {} already exists", wall.id.0)));
        }
        self.admit_wall(&wall)?;
        self.next_wall_id = self.next_wall_id.max(wall.id.0 + 1);
        self.walls.push(wall);
        Ok(())
    }

    fn admit_wall(&self, wall: &Wall) -> TalusResult<()> {
        if self.species.get(wall.species).is_none() {
            return Err(TalusError::InvalidWall(format!(
                "wall {} uses unknown species {}",
                wall.id.0, wall.species.0
            )));
        }
        wall.validate()
    }

    // ─── Spatial queries ─────────────────────────────────────

    /// Returns true if a sphere at `position` with `radius` would overlap
    /// any particle or wall.
    pub fn overlaps_anything(&self, position: Vec3, radius: Scalar) -> bool {
        let mut candidates = Vec::new();
        self.broad.candidates_near(position, radius, &mut candidates);
        let hits_particle = candidates.iter().any(|&j| {
            let other = &self.particles[j];
            let reach = radius + other.radius();
            other.position.distance_squared(position) < reach * reach
        });
        hits_particle
            || self
                .walls
                .iter()
                .any(|w| w.distance_and_normal(position, radius).is_some())
    }

    /// Smallest box containing every particle, or `None` when empty.
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = self.particles.first()?;
        let r = Vec3::splat(first.radius());
        let init = (first.position - r, first.position + r);
        Some(self.particles.iter().fold(init, |(lo, hi), p| {
            let r = Vec3::splat(p.radius());
            (lo.min(p.position - r), hi.max(p.position + r))
        }))
    }

    // ─── Step phases ─────────────────────────────────────────

    /// Clears every force and torque accumulator.
    pub fn reset_forces(&mut self) {
        for particle in &mut self.particles {
            particle.reset_force();
        }
        for wall in &mut self.walls {
            wall.reset_force();
        }
    }

    /// Adds `m g` to every free particle.
    pub fn apply_gravity(&mut self, gravity: Vec3) {
        for particle in self.particles.iter_mut().filter(|p| !p.is_fixed()) {
            particle.force += gravity * particle.mass();
        }
    }

    /// Evaluates every closed contact at simulation time `time`.
    ///
    /// Stale histories are swept first. Particle pairs come from the broad
    /// phase, then every particle is tested against every wall. The record
    /// of a particle pair lives on the lower id; a wall contact lives on
    /// the particle. When `reports` is given, one report per contact is
    /// appended to it.
    pub fn compute_contact_forces(
        &mut self,
        time: Scalar,
        dt: Scalar,
        mut reports: Option<&mut Vec<ContactReport>>,
    ) -> ContactStats {
        let mut stats = ContactStats::default();
        for particle in &mut self.particles {
            stats.pruned_records += particle.history.prune_stale(time);
        }

        let mut pairs = std::mem::take(&mut self.pair_buffer);
        self.broad.candidate_pairs_into(&mut pairs);
        stats.candidate_pairs = pairs.len();

        for &(i, j) in &pairs {
            let (owner, other) = if self.particles[i].id < self.particles[j].id {
                (i, j)
            } else {
                (j, i)
            };
            let (a, b) = (&self.particles[owner], &self.particles[other]);
            if a.is_fixed() && b.is_fixed() {
                continue;
            }
            let Some(geometry) = particle_pair_geometry(&a.body_state(), &b.body_state()) else {
                continue;
            };
            let params = self.species.pair(a.species, b.species);
            let (owner_id, target) = (a.id, ContactTarget::Particle(b.id));

            let record = self.particles[owner].history.select_or_create(target, time, dt);
            let contact = compute_contact_force(&geometry, params, record, dt);

            let a = &mut self.particles[owner];
            a.force += contact.force;
            a.torque += contact.torque_a;
            let b = &mut self.particles[other];
            b.force -= contact.force;
            b.torque += contact.torque_b;

            stats.particle_contacts += 1;
            stats.max_overlap = stats.max_overlap.max(geometry.overlap);
            stats.elastic_energy += contact.elastic_energy;
            if let Some(out) = reports.as_deref_mut() {
                out.push(ContactReport {
                    owner: owner_id,
                    target,
                    contact_point: geometry.contact_point,
                    normal: geometry.normal,
                    overlap: geometry.overlap,
                    normal_force: contact.normal_force,
                    tangential_force: contact.tangential_force,
                });
            }
        }
        self.pair_buffer = pairs;

        for i in 0..self.particles.len() {
            if self.particles[i].is_fixed() {
                continue;
            }
            for w in 0..self.walls.len() {
                let particle = &self.particles[i];
                let wall = &self.walls[w];
                let Some(geometry) = particle_wall_geometry(&particle.body_state(), wall) else {
                    continue;
                };
                let params = self.species.pair(particle.species, wall.species);
                let (owner_id, target) = (particle.id, ContactTarget::Wall(wall.id));

                let record = self.particles[i].history.select_or_create(target, time, dt);
                let contact = compute_contact_force(&geometry, params, record, dt);

                let particle = &mut self.particles[i];
                particle.force += contact.force;
                particle.torque += contact.torque_a;
                let wall = &mut self.walls[w];
                wall.force -= contact.force;
                wall.torque -= geometry.contact_point.cross(contact.force);

                stats.wall_contacts += 1;
                stats.max_overlap = stats.max_overlap.max(geometry.overlap);
                stats.elastic_energy += contact.elastic_energy;
                if let Some(out) = reports.as_deref_mut() {
                    out.push(ContactReport {
                        owner: owner_id,
                        target,
                        contact_point: geometry.contact_point,
                        normal: geometry.normal,
                        overlap: geometry.overlap,
                        normal_force: contact.normal_force,
                        tangential_force: contact.tangential_force,
                    });
                }
            }
        }
        stats
    }

    /// Advances every particle and wall by `dt` with the accumulated
    /// forces.
    pub fn integrate(&mut self, dt: Scalar) {
        integrator::integrate(&mut self.particles, &mut self.walls, dt, self.dimension);
    }

    /// Brings the broad phase in line with every particle's position.
    pub fn update_grid(&mut self) {
        for (index, particle) in self.particles.iter().enumerate() {
            self.broad.update(index, particle.position, particle.radius());
        }
    }

    /// Re-indexes every particle from scratch.
    pub fn rebuild_grid(&mut self) {
        let items: Vec<_> = self
            .particles
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.position, p.radius()))
            .collect();
        self.broad.rebuild(&items);
    }

    /// The history of the contact between particle `a` and `b`, seen from
    /// `a`, wherever it is stored.
    ///
    /// A particle-particle record stored on the other participant is
    /// returned reversed.
    pub fn contact_view(&self, a: ParticleId, b: ContactTarget) -> Option<ContactHistoryRecord> {
        let owner = self.particle_by_id(a)?;
        if let Some(record) = owner.history.get(b) {
            return Some(*record);
        }
        let ContactTarget::Particle(other) = b else {
            return None;
        };
        self.particle_by_id(other)?
            .history
            .get(ContactTarget::Particle(a))
            .map(|record| {
                let mut view = record.reversed();
                view.target = b;
                view
            })
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("dimension", &self.dimension)
            .field("particles", &self.particles.len())
            .field("walls", &self.walls.len())
            .field("species", &self.species.names())
            .field("broad_phase", &self.broad.name())
            .finish()
    }
}

fn project_to_plane(particle: &mut Particle) {
    particle.position.z = 0.0;
    particle.velocity.z = 0.0;
    particle.angular_velocity.x = 0.0;
    particle.angular_velocity.y = 0.0;
}
