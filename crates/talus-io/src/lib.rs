//! # talus-io
//!
//! Scenario input, validation and result files for the Talus engine.
//!
//! ## Modules
//!
//! - [`contract`]: `SimulationInput` (TOML / JSON) and `build_engine`
//! - [`validator`]: input checks, including timestep against collision time
//! - [`restart`]: full-state text files with exact round trip
//! - [`data_file`]: per-frame particle data (`.data`)
//! - [`energy_file`]: energy time series (`.ene`)
//! - [`fstat`]: per-contact statistics (`.fstat`)
//! - [`snapshot`]: compact binary particle snapshots

pub mod contract;
pub mod data_file;
pub mod energy_file;
pub mod fstat;
pub mod restart;
pub mod snapshot;
mod text;
pub mod validator;

pub use contract::{build_engine, SimulationInput};
pub use data_file::{read_data_frames, DataFileWriter, DataFrame};
pub use energy_file::{read_energy_file, EnergyFileWriter};
pub use fstat::{read_fstat, FStatWriter};
pub use restart::{read_restart, write_restart, RestartState, RestartWriter};
pub use snapshot::{SnapshotWriter, StateSnapshot};
pub use validator::{validate_input, ValidationReport};
