//! Configuration for the view engine.
//!
//! Loaded from `~/.config/beagle/config.toml` (or the platform equivalent),
//! falling back to defaults when the file is missing.

mod loader;
mod store;
mod types;

pub use loader::ConfigError;
pub use store::ConfigStore;
pub use types::{CacheConfig, Config, NetworkConfig};
