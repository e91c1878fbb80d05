//! macOS collaborators for macharden.
//!
//! Everything here shells out through a `CommandRunner`; nothing links
//! against system frameworks.

pub mod controls;
pub mod network;
pub mod parse;
pub mod posture;
pub mod runner;
pub mod session;
pub mod updates;

pub use controls::standard_controls;
pub use runner::{CommandOutput, CommandRunner, SystemRunner};

#[cfg(any(test, feature = "test-support"))]
pub use runner::ScriptedRunner;
