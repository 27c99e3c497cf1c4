//! HTTP API over the grant store.
//!
//! Routes (JSON bodies throughout):
//!
//! - `GET  /health`
//! - `POST /uploads`, `POST /uploads/{id}/finalize`
//! - `GET  /files`, `GET|DELETE /files/{storage_id}`, `PUT /files/{storage_id}/expiry`
//! - `POST /files/{storage_id}/keys`, `DELETE /files/{storage_id}/keys/{key}`
//! - `POST /grants`, `GET|DELETE /grants/{id}`, `POST /grants/{id}/redeem`
//! - `POST /sweep`

mod handlers;
pub mod types;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use std::sync::Arc;

use crate::config::Config;
use crate::error::Error;
use crate::grants::GrantStore;
use crate::remote::R2Config;
use crate::url::UrlBuilder;
use types::ErrorResponse;

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: GrantStore,
    pub urls: UrlBuilder,
    /// External store credentials; `None` means uploads go to the primary store.
    pub remote: Option<R2Config>,
    pub pending_ttl_secs: u64,
}

impl AppState {
    pub fn new(store: GrantStore, config: &Config, remote: Option<R2Config>) -> Self {
        Self {
            store,
            urls: config.urls.builder(),
            remote,
            pending_ttl_secs: config.uploads.pending_ttl_secs,
        }
    }
}

pub(crate) type SharedState = Arc<AppState>;

/// Handler error mapped to an HTTP status and a JSON body.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidArgument(_) => Self::BadRequest(err.to_string()),
            Error::NotFound { .. } => Self::NotFound(err.to_string()),
            Error::DuplicateKey { .. } => Self::Conflict(err.to_string()),
            Error::Storage(e) => Self::Internal(format!("{e:#}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            },
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/uploads", post(handlers::create_upload))
        .route("/uploads/{id}/finalize", post(handlers::finalize_upload))
        .route("/files", get(handlers::list_files))
        .route(
            "/files/{storage_id}",
            get(handlers::get_file).delete(handlers::delete_file),
        )
        .route("/files/{storage_id}/expiry", put(handlers::set_file_expiry))
        .route("/files/{storage_id}/keys", post(handlers::mint_access_key))
        .route(
            "/files/{storage_id}/keys/{key}",
            delete(handlers::revoke_access_key),
        )
        .route("/grants", post(handlers::create_grant))
        .route(
            "/grants/{id}",
            get(handlers::get_grant).delete(handlers::revoke_grant),
        )
        .route("/grants/{id}/redeem", post(handlers::redeem_grant))
        .route("/sweep", post(handlers::sweep))
        .with_state(Arc::new(state))
}

/// Bind and serve the API until ctrl-c.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    use anyhow::Context;

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        external_store = state.remote.is_some(),
        "filegate listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("HTTP server failed")
}
