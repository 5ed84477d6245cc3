//! Startup: configuration file, tracing subscriber and dependency wiring.

pub mod config;
pub mod tracing;
pub mod wiring;

pub use config::{default_config_path, load_config, resolve_config, AppConfig};
pub use wiring::{wire_dependencies, AppDeps};
