//! Subcommand implementations.

pub(crate) mod keys;
pub(crate) mod run;
pub(crate) mod sessions;
