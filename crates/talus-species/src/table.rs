//! Species registry with mixed-pair lookup.
//!
//! Mixed parameters are stored in a flat lower-triangular array, so a pair
//! lookup during the force loop is a single index computation.

use talus_types::{Scalar, SpeciesId, TalusError, TalusResult};

use crate::calibration::{collision_time, harmonic_mean_mass, hertz_collision_time};
use crate::presets;
use crate::properties::{ContactParameters, NormalModel};
use crate::species::Species;

/// A collection of species and the parameters for every species pair.
///
/// Read-only during a run: the engine takes it by value at construction.
#[derive(Debug, Clone, Default)]
pub struct SpeciesTable {
    species: Vec<Species>,
    /// Parameters for pairs `(a, b)` with `a > b`, at `a(a-1)/2 + b`.
    mixed: Vec<ContactParameters>,
    /// Whether the mixed entry was set explicitly.
    overridden: Vec<bool>,
}

#[inline]
fn tri_index(a: usize, b: usize) -> usize {
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi * (hi - 1) / 2 + lo
}

impl SpeciesTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding the built-in presets.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for species in presets::all() {
            // Presets are valid by construction.
            let _ = table.add(species);
        }
        table
    }

    /// Registers a species, deriving mixed parameters with every existing
    /// species. Returns its id.
    pub fn add(&mut self, species: Species) -> TalusResult<SpeciesId> {
        species.validate()?;
        if self.by_name(&species.name).is_some() {
            return Err(TalusError::InvalidSpecies(format!(
                "species '{}' is already registered",
                species.name
            )));
        }
        if self.species.len() >= u16::MAX as usize {
            return Err(TalusError::InvalidSpecies("too many species".into()));
        }
        let id = SpeciesId(self.species.len() as u16);
        for other in &self.species {
            self.mixed
                .push(ContactParameters::mixed(&species.contact, &other.contact));
            self.overridden.push(false);
        }
        self.species.push(species);
        Ok(id)
    }

    /// Overrides the parameters used between species `a` and `b`.
    pub fn set_mixed(
        &mut self,
        a: SpeciesId,
        b: SpeciesId,
        params: ContactParameters,
    ) -> TalusResult<()> {
        if a == b {
            return Err(TalusError::InvalidSpecies(format!(
                "mixed parameters need two different species, got {} twice",
                a.0
            )));
        }
        if a.index() >= self.len() || b.index() >= self.len() {
            return Err(TalusError::InvalidSpecies(format!(
                "unknown species pair ({}, {})",
                a.0, b.0
            )));
        }
        params.validate()?;
        let idx = tri_index(a.index(), b.index());
        self.mixed[idx] = params;
        self.overridden[idx] = true;
        Ok(())
    }

    /// Looks up a species by id.
    pub fn get(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(id.index())
    }

    /// Looks up a species by name.
    pub fn by_name(&self, name: &str) -> Option<SpeciesId> {
        self.species
            .iter()
            .position(|s| s.name == name)
            .map(|i| SpeciesId(i as u16))
    }

    /// Contact parameters between species `a` and `b`.
    ///
    /// # Panics
    /// If either id is not registered. Ids are validated when particles
    /// and walls are created, so this indicates a programming error.
    #[inline]
    pub fn pair(&self, a: SpeciesId, b: SpeciesId) -> &ContactParameters {
        if a == b {
            &self.species[a.index()].contact
        } else {
            &self.mixed[tri_index(a.index(), b.index())]
        }
    }

    /// Iterates over every mixed pair `(a, b)` with `a > b`, with a flag
    /// telling whether the entry was set explicitly.
    pub fn mixed_pairs(&self) -> impl Iterator<Item = (SpeciesId, SpeciesId, &ContactParameters, bool)> {
        let n = self.species.len();
        (1..n).flat_map(move |a| {
            (0..a).map(move |b| {
                let idx = tri_index(a, b);
                (
                    SpeciesId(a as u16),
                    SpeciesId(b as u16),
                    &self.mixed[idx],
                    self.overridden[idx],
                )
            })
        })
    }

    /// Iterates over `(id, species)`.
    pub fn iter(&self) -> impl Iterator<Item = (SpeciesId, &Species)> {
        self.species
            .iter()
            .enumerate()
            .map(|(i, s)| (SpeciesId(i as u16), s))
    }

    /// Returns all registered species names.
    pub fn names(&self) -> Vec<&str> {
        self.species.iter().map(|s| s.name.as_str()).collect()
    }

    /// Returns the number of registered species.
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Shortest binary collision time over every species pair in use.
    ///
    /// `lightest[i]` is the `(mass, radius)` of the lightest particle of
    /// species `i`, or `None` when no particle uses it. Particles also meet
    /// walls of `wall_species`. Hertz pairs are evaluated at impact speed
    /// `speed`. `None` when no pair yields a time.
    pub fn shortest_collision_time(
        &self,
        lightest: &[Option<(Scalar, Scalar)>],
        wall_species: &[SpeciesId],
        speed: Scalar,
    ) -> Option<Scalar> {
        let mut shortest = Scalar::INFINITY;
        let mut consider = |params: &ContactParameters, mass: Scalar, radius: Scalar| {
            let tc = match params.normal_model {
                NormalModel::Linear => collision_time(params.stiffness, params.dissipation, mass),
                NormalModel::Hertz => hertz_collision_time(params, mass, radius, speed),
            };
            if let Some(tc) = tc {
                shortest = shortest.min(tc);
            }
        };
        for (a, _) in self.iter() {
            let Some((mass_a, radius_a)) = lightest.get(a.index()).copied().flatten() else {
                continue;
            };
            for (b, _) in self.iter().take(a.index() + 1) {
                let Some((mass_b, radius_b)) = lightest.get(b.index()).copied().flatten() else {
                    continue;
                };
                let radius = radius_a * radius_b / (radius_a + radius_b);
                consider(self.pair(a, b), harmonic_mean_mass(mass_a, mass_b), radius);
            }
            for &wall in wall_species {
                consider(
                    self.pair(a, wall),
                    harmonic_mean_mass(mass_a, Scalar::INFINITY),
                    radius_a,
                );
            }
        }
        shortest.is_finite().then_some(shortest)
    }

    /// Returns true if no species is registered.
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}
