//! # talus-contact
//!
//! Contact detection and contact forces for granular simulation.
//!
//! The contact pipeline is split into three phases:
//! 1. **Broad phase**: multi-level hash grid over particle positions
//! 2. **Narrow phase**: exact radius-sum and wall distance tests
//! 3. **Contact force**: spring-dashpot normal law with history-dependent
//!    sliding, rolling and torsion springs
//!
//! The broad phase is a pluggable trait so the grid can be checked
//! against an exhaustive all-pairs strategy.

pub mod broad;
pub mod contact;
pub mod force;
pub mod grid;
pub mod history;
pub mod narrow;
pub mod wall;

pub use broad::{AllPairs, BroadPhase};
pub use contact::{ContactGeometry, ContactReport};
pub use force::{compute_contact_force, ContactForce};
pub use grid::{GridConfig, HGrid};
pub use history::{ContactHistoryRecord, ContactHistoryStore};
pub use narrow::{particle_pair_geometry, particle_wall_geometry, BodyState};
pub use wall::{HalfSpace, HelixBlade, Wall, WallShape};
