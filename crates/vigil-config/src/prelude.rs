//! Prelude — commonly used types for convenient import.

pub use crate::{BusBackend, ConfigError, ConfigResult, EffectiveConfig, RuntimeConfig, load};
