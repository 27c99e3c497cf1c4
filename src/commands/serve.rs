//! Serve the HTTP API.

use anyhow::Result;
use std::path::Path;

use crate::http::{self, AppState};
use crate::remote::R2Config;

/// Open the configured store and serve until ctrl-c.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the store cannot be
/// opened, or the listener cannot bind.
pub async fn execute(config_path: Option<&Path>, port_override: Option<u16>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let store = config.store.open()?;

    let remote = R2Config::from_env();
    match &remote {
        Some(r2) => tracing::info!(
            bucket = %r2.bucket_name,
            endpoint = %r2.endpoint(),
            "External object store configured"
        ),
        None => tracing::info!("No external object store configured; using primary storage"),
    }

    let port = port_override.unwrap_or(config.server.port);
    let state = AppState::new(store, &config, remote);
    http::serve(state, &config.server.host, port).await
}
