//! Per-particle contact history ("tangential springs").
//!
//! Each particle owns a small ordered store of records, one per contact it
//! owns. A record keeps the elastic displacements of the sliding, rolling
//! and torsion springs alive for as long as the contact stays closed.
//!
//! Staleness is tracked by time stamps instead of explicit contact-end
//! events: every step a contact is evaluated its record is stamped
//! `time + dt`. At the next step the stamp equals the current time; once a
//! step passes without evaluation the stamp falls behind and the record is
//! swept.

use serde::{Deserialize, Serialize};
use talus_math::Vec3;
use talus_types::{ContactTarget, Scalar};

/// Persistent state of one contact, stored by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactHistoryRecord {
    /// The other participant.
    pub target: ContactTarget,
    /// Accumulated sliding spring displacement.
    pub tangential: Vec3,
    /// Accumulated rolling spring displacement.
    pub rolling: Vec3,
    /// Accumulated torsion spring displacement.
    pub torsion: Vec3,
    /// Tangential force of the last evaluation.
    pub sliding_force: Vec3,
    /// Sliding spring is at the Coulomb limit.
    pub sliding: bool,
    /// Rolling spring is at its Coulomb limit.
    pub rolling_sliding: bool,
    /// Torsion spring is at its Coulomb limit.
    pub torsion_sliding: bool,
    /// Simulation time up to which the record is valid.
    pub last_touched: Scalar,
}

impl ContactHistoryRecord {
    /// A zero record for `target`, valid until `last_touched`.
    pub fn new(target: ContactTarget, last_touched: Scalar) -> Self {
        Self {
            target,
            tangential: Vec3::ZERO,
            rolling: Vec3::ZERO,
            torsion: Vec3::ZERO,
            sliding_force: Vec3::ZERO,
            sliding: false,
            rolling_sliding: false,
            torsion_sliding: false,
            last_touched,
        }
    }

    /// Flips the record to the other participant's point of view.
    pub fn reverse(&mut self) {
        self.tangential = -self.tangential;
        self.rolling = -self.rolling;
        self.torsion = -self.torsion;
        self.sliding_force = -self.sliding_force;
    }

    /// Returns a copy seen from the other participant.
    pub fn reversed(&self) -> Self {
        let mut copy = *self;
        copy.reverse();
        copy
    }

    /// Elastic displacement of the sliding spring.
    pub fn tangential_displacement(&self) -> Scalar {
        self.tangential.length()
    }
}

/// Ordered collection of the contact records owned by one particle.
///
/// Holds at most one record per target: [`select_or_create`] scans
/// before appending and [`insert_restored`] replaces.
///
/// [`select_or_create`]: ContactHistoryStore::select_or_create
/// [`insert_restored`]: ContactHistoryStore::insert_restored
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactHistoryStore {
    records: Vec<ContactHistoryRecord>,
}

impl ContactHistoryStore {
    /// Creates an empty store with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Returns the record for `target`, creating a zero record if none
    /// exists, and stamps it valid until `current_time + dt`.
    ///
    /// Stale records are swept first, so a contact that was open during
    /// the previous step starts again from zero.
    pub fn select_or_create(
        &mut self,
        target: ContactTarget,
        current_time: Scalar,
        dt: Scalar,
    ) -> &mut ContactHistoryRecord {
        self.prune_stale(current_time);
        let stamp = current_time + dt;
        let idx = match self.records.iter().position(|r| r.target == target) {
            Some(idx) => {
                self.records[idx].last_touched = stamp;
                idx
            }
            None => {
                self.records.push(ContactHistoryRecord::new(target, stamp));
                self.records.len() - 1
            }
        };
        &mut self.records[idx]
    }

    /// Returns true if a live record for `target` exists. Sweeps stale
    /// records but never creates one.
    pub fn has_record(&mut self, target: ContactTarget, current_time: Scalar) -> bool {
        self.prune_stale(current_time);
        self.records.iter().any(|r| r.target == target)
    }

    /// Removes every record with `last_touched < current_time`. Returns the
    /// number removed.
    pub fn prune_stale(&mut self, current_time: Scalar) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.last_touched >= current_time);
        before - self.records.len()
    }

    /// Record for `target`, without sweeping.
    pub fn get(&self, target: ContactTarget) -> Option<&ContactHistoryRecord> {
        self.records.iter().find(|r| r.target == target)
    }

    /// Inserts a record read back from a restart file, replacing any record
    /// with the same target.
    pub fn insert_restored(&mut self, record: ContactHistoryRecord) {
        match self.records.iter_mut().find(|r| r.target == record.target) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    /// Iterates over the records in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &ContactHistoryRecord> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the store holds no record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talus_types::{ParticleId, WallId};

    #[test]
    fn particle_and_wall_with_same_raw_id_are_distinct() {
        let mut store = ContactHistoryStore::with_capacity(4);
        store.select_or_create(ContactTarget::Particle(ParticleId(3)), 0.0, 0.1);
        store.select_or_create(ContactTarget::Wall(WallId(3)), 0.0, 0.1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn reversed_negates_vectors_only() {
        let mut r = ContactHistoryRecord::new(ContactTarget::Wall(WallId(0)), 1.0);
        r.tangential = Vec3::X;
        r.sliding = true;
        let back = r.reversed();
        assert_eq!(back.tangential, -Vec3::X);
        assert!(back.sliding);
        assert_eq!(back.reversed(), r);
    }
}
