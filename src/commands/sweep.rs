//! One-shot sweep of expired records, for cron or systemd timers.
//!
//! A running `filegate serve` owns the store: it holds the redb file lock,
//! and a memory store exists only inside that process. The sweep therefore
//! goes through the server's `POST /sweep` whenever a server answers, and
//! opens the database directly only for the redb backend with the server
//! stopped.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use std::time::Duration;

use crate::config::{ServerConfig, StoreBackend, StoreConfig};
use crate::grants::SweepReport;

/// Timeout for the health check against the configured server.
const HEALTH_TIMEOUT: Duration = Duration::from_millis(500);

/// Timeout for the sweep request itself.
const SWEEP_TIMEOUT: Duration = Duration::from_secs(30);

/// Remove every pending upload, file and grant whose expiry has passed.
///
/// With `server` set, the sweep is sent to that server. Otherwise the
/// configured server is used if it is up, and the redb database is swept
/// directly if it is not.
///
/// # Errors
///
/// Returns an error if the server rejects the sweep, the memory backend is
/// configured without a running server, or the database cannot be opened.
pub async fn execute(config_path: Option<&Path>, server: Option<&str>) -> Result<()> {
    let config = super::load_config(config_path)?;

    let report = match server {
        Some(url) => sweep_remote(url).await?,
        None => {
            let local = local_server_url(&config.server);
            if is_server_running(&local).await {
                tracing::debug!(server = %local, "Sweeping through running server");
                sweep_remote(&local).await?
            } else {
                sweep_offline(&config.store).await?
            }
        },
    };

    println!(
        "Removed {} pending uploads, {} files ({} access keys), {} grants",
        report.pending_uploads, report.files, report.access_keys, report.grants
    );
    Ok(())
}

/// Base URL of the server described by `[server]`.
fn local_server_url(server: &ServerConfig) -> String {
    let host = match server.host.as_str() {
        "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
        host => host,
    };
    format!("http://{host}:{}", server.port)
}

/// Check if a server answers on its health endpoint.
async fn is_server_running(base_url: &str) -> bool {
    reqwest::Client::new()
        .get(format!("{}/health", base_url.trim_end_matches('/')))
        .timeout(HEALTH_TIMEOUT)
        .send()
        .await
        .is_ok_and(|response| response.status().is_success())
}

/// Run the sweep on a running server.
///
/// # Errors
///
/// Returns an error if the server is unreachable or answers with a failure.
pub async fn sweep_remote(base_url: &str) -> Result<SweepReport> {
    let url = format!("{}/sweep", base_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .timeout(SWEEP_TIMEOUT)
        .send()
        .await
        .with_context(|| format!("Failed to reach filegate server at {base_url}"))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Sweep request to {url} failed with {status}: {body}");
    }

    response
        .json::<SweepReport>()
        .await
        .context("Invalid sweep response")
}

/// Sweep the redb database directly.
///
/// # Errors
///
/// Returns an error for the memory backend, or if the database is locked by
/// a running server.
pub async fn sweep_offline(store: &StoreConfig) -> Result<SweepReport> {
    if store.backend == StoreBackend::Memory {
        anyhow::bail!(
            "The memory backend only exists inside `filegate serve`; \
             start the server or pass --server <url>"
        );
    }

    let store = store
        .open()
        .context("Stop `filegate serve` or pass --server <url> to sweep through it")?;
    Ok(store.sweep_expired(Utc::now()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::grants::GrantStore;
    use crate::http::{AppState, router};
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    /// Serve `store` on an ephemeral port; returns the base URL.
    async fn spawn_server(store: GrantStore) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(AppState::new(store, &Config::default(), None));
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{addr}")
    }

    async fn expired_grant(store: &GrantStore) -> crate::types::GrantId {
        let issued = Utc::now() - ChronoDuration::hours(1);
        let expires_at = issued + ChronoDuration::seconds(1);
        store
            .create_download_grant_at("blob", Some(expires_at), None, issued)
            .await
            .unwrap()
    }

    fn redb_config(tmp: &TempDir) -> StoreConfig {
        StoreConfig {
            backend: StoreBackend::Redb,
            path: Some(tmp.path().join("grants.redb").display().to_string()),
        }
    }

    #[test]
    fn test_local_server_url_uses_loopback_for_wildcard_hosts() {
        let server = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 3940,
        };
        assert_eq!(local_server_url(&server), "http://127.0.0.1:3940");

        let server = ServerConfig {
            host: "10.0.0.5".to_string(),
            port: 8080,
        };
        assert_eq!(local_server_url(&server), "http://10.0.0.5:8080");
    }

    #[tokio::test]
    async fn test_offline_sweep_refuses_memory_backend() {
        let store = StoreConfig {
            backend: StoreBackend::Memory,
            path: None,
        };
        let err = sweep_offline(&store).await.unwrap_err();
        assert!(err.to_string().contains("--server"), "{err}");
    }

    #[tokio::test]
    async fn test_offline_sweep_on_stopped_redb() {
        let tmp = TempDir::new().unwrap();
        let config = redb_config(&tmp);
        {
            let store = config.open().unwrap();
            expired_grant(&store).await;
        }

        let report = sweep_offline(&config).await.unwrap();
        assert_eq!(report.grants, 1);
    }

    #[tokio::test]
    async fn test_offline_sweep_fails_while_redb_is_held() {
        let tmp = TempDir::new().unwrap();
        let config = redb_config(&tmp);
        let _held = config.open().unwrap();

        let err = sweep_offline(&config).await.unwrap_err();
        assert!(format!("{err:#}").contains("--server"), "{err:#}");
    }

    #[tokio::test]
    async fn test_remote_sweep_reaches_live_memory_store() {
        let store = GrantStore::memory();
        let grant = expired_grant(&store).await;
        let url = spawn_server(store.clone()).await;

        let report = sweep_remote(&url).await.unwrap();
        assert_eq!(report.grants, 1);
        assert!(store.get_grant(grant).await.is_err());

        let again = sweep_remote(&format!("{url}/")).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_execute_sweeps_through_configured_server() {
        let tmp = TempDir::new().unwrap();
        let store_config = redb_config(&tmp);
        let store = store_config.open().unwrap();
        let grant = expired_grant(&store).await;

        let url = spawn_server(store.clone()).await;
        let port = url.rsplit(':').next().unwrap();
        let config_path = tmp.path().join("filegate.toml");
        std::fs::write(
            &config_path,
            format!(
                "[server]\nhost = \"127.0.0.1\"\nport = {port}\n\n[store]\nbackend = \"redb\"\npath = {:?}\n",
                store_config.path.as_deref().unwrap()
            ),
        )
        .unwrap();

        // The server holds the redb lock; the sweep must go through it
        execute(Some(&config_path), None).await.unwrap();
        assert!(store.get_grant(grant).await.is_err());
    }

    #[tokio::test]
    async fn test_remote_sweep_unreachable_server() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = sweep_remote(&format!("http://{addr}")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to reach"), "{err}");
    }
}
