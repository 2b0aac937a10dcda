//! Vigil Config — loads the single YAML runtime config file named by
//! `--config`, plus its environment variable overrides.
//!
//! Deliberately scaled down from the teacher workspace's `astrid-config`
//! layered system/user/workspace TOML merge: this runtime takes exactly
//! one YAML file, no layering, so [`load`] reads it directly and applies
//! environment overrides on top (see `DESIGN.md`'s Open Question #2).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod loader;
mod types;

pub use error::{ConfigError, ConfigResult};
pub use loader::{BusBackend, EffectiveConfig, load};
pub use types::{EmailConfig, MIN_POLL_INTERVAL_SECONDS, RuntimeConfig};
