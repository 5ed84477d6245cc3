//! Tracing subscriber for the `clipsync` binary.
//!
//! `RUST_LOG` wins when set; otherwise the directives are built from the
//! `[logging] level` of the application file.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Check if running in development environment
fn is_development() -> bool {
    cfg!(debug_assertions)
}

/// Default directives for `level`, or debug/info by build profile when it is blank.
pub fn build_filter_directives(level: &str, is_dev: bool) -> Vec<String> {
    let level = match level.trim() {
        "" if is_dev => "debug",
        "" => "info",
        level => level,
    };

    vec![
        level.to_string(),
        format!("cs_app={level}"),
        format!("cs_infra={level}"),
        "hyper=warn".to_string(),
        "hyper_util=warn".to_string(),
        "reqwest=warn".to_string(),
        "rustls=warn".to_string(),
    ]
}

/// Install the global subscriber. Call once, before wiring.
pub fn init_tracing_subscriber(level: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(build_filter_directives(level, is_development()).join(","))
    });

    let fmt_layer = fmt::layer()
        .with_timer(fmt::time::ChronoLocal::rfc_3339())
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install tracing subscriber")
}
