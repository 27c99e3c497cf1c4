//! CLI command implementations for filegate.
//!
//! - [`serve`] - HTTP API over the grant store
//! - [`sweep`] - one-shot removal of expired records
//! - [`url`] - print an endpoint URL
//! - [`show_config`] - print the resolved configuration

pub mod serve;
pub mod show_config;
pub mod sweep;
pub mod url;

use anyhow::Result;
use std::path::Path;

use crate::config::Config;

/// Load and validate configuration, logging any warnings.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or fails validation.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load(path)?;
    let result = config.validate()?;
    for warning in &result.warnings {
        tracing::warn!("{warning}");
    }
    Ok(config)
}

/// Initialize stdout logging.
///
/// `RUST_LOG` overrides the default `info` filter; `json` switches to
/// structured JSON lines.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
