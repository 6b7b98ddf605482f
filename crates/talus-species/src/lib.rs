//! # talus-species
//!
//! Material species and contact parameters for granular simulation.
//!
//! A *species* is a named set of material constants (density plus the
//! normal, sliding, rolling and torsion contact laws) shared by a group of
//! particles or walls. Contacts between two different species use a
//! *mixed* parameter set, derived by averaging unless set explicitly.
//!
//! ## Key Types
//!
//! - [`ContactParameters`]: coefficients consumed by the contact force model
//! - [`Species`]: density + contact parameters, with validated setters
//! - [`SpeciesTable`]: species registry with mixed-pair lookup
//! - [`calibration`]: collision time / restitution conversions

pub mod calibration;
pub mod presets;
pub mod properties;
pub mod species;
pub mod table;

pub use properties::{ContactParameters, FrictionLaw, NormalModel};
pub use species::Species;
pub use table::SpeciesTable;
