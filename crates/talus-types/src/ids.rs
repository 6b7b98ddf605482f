//! Strongly-typed identifiers for simulation entities.
//!
//! Newtype wrappers prevent accidental mixing of particle ids
//! with wall or species indices.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable particle identifier.
///
/// Allocated monotonically and never reused, so it survives the index
/// shuffling caused by particle removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub u32);

/// Index into the wall list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WallId(pub u32);

/// Index into the species table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub u16);

impl ParticleId {
    /// Returns the raw id as `usize`.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl WallId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl SpeciesId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for ParticleId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u32> for WallId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u16> for SpeciesId {
    fn from(val: u16) -> Self {
        Self(val)
    }
}

/// The other participant of a contact, seen from the particle that owns
/// the contact's history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactTarget {
    /// Another particle.
    Particle(ParticleId),
    /// A wall.
    Wall(WallId),
}

impl ContactTarget {
    /// Returns true if the target is a wall.
    #[inline]
    pub fn is_wall(self) -> bool {
        matches!(self, ContactTarget::Wall(_))
    }

    /// Raw numeric id of the target, regardless of kind.
    #[inline]
    pub fn raw_id(self) -> u32 {
        match self {
            ContactTarget::Particle(id) => id.0,
            ContactTarget::Wall(id) => id.0,
        }
    }
}

impl fmt::Display for ContactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactTarget::Particle(id) => write!(f, "particle {}", id.0),
            ContactTarget::Wall(id) => write!(f, "wall {}", id.0),
        }
    }
}
