//! Subcommand implementations

pub mod info;
pub mod lookup;
pub mod probe;
