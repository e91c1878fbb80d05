//! macharden configuration layer
//!
//! Every environment read goes through this module; the rest of the code only
//! sees typed config structs.
//!
//! - `loader`: env_or, env_optional, env_bool helpers
//! - `schema`: ObservabilityConfig, SessionConfig
//! - `env_keys`: key constants and aliases

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_optional, env_or};
pub use schema::{ObservabilityConfig, SessionConfig};
