//! # clipsync
//!
//! Command-line host for the ClipSync engine: loads the application file, installs
//! tracing, wires the infrastructure adapters into the use cases and dispatches
//! the subcommands.

pub mod bootstrap;
pub mod cli;
