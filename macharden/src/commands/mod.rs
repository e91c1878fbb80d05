//! Command implementations.

pub mod harden;
