//! macharden core: everything that does not talk to the operating system.
//!
//! - `profile`: profile + strict flag → `EffectivePolicy`
//! - `policy`: the declarative desired-state table
//! - `reconcile`: probe/compare/apply engine over `SubsystemControl`s
//! - `report`: outcome records → transcript sections, summary, JSON
//! - `config` / `observability`: environment config, tracing, run log

pub mod config;
pub mod error;
pub mod observability;
pub mod policy;
pub mod profile;
pub mod reconcile;
pub mod report;
pub mod state;

pub use error::{CollaboratorError, ConfigError};
pub use policy::{DesiredState, Subsystem};
pub use profile::{EffectivePolicy, Profile};
pub use state::{ActionTaken, OutcomeRecord, ProbeResult, ProbeState, Switch};
