//! Print the resolved configuration.

use anyhow::{Context, Result};
use std::path::Path;

use crate::remote::R2Config;

/// Print the effective config as TOML, plus where records are stored and
/// whether R2 credentials were found.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or serialized.
pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;
    println!("{rendered}");

    match config.store.db_path() {
        Ok(path) => println!("# database: {}", path.display()),
        Err(e) => println!("# database: unresolved ({e})"),
    }
    match R2Config::from_env() {
        Some(r2) => println!("# external store: {} ({})", r2.bucket_name, r2.endpoint()),
        None => println!("# external store: not configured"),
    }
    Ok(())
}
