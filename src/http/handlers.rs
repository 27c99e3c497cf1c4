//! Grant store handlers.
//!
//! Each handler is a thin adapter: parse the request, call one
//! [`GrantStore`](crate::grants::GrantStore) operation, shape the response.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{Duration, Utc};

use super::types::{
    CreateGrantRequest, CreateGrantResponse, CreateUploadRequest, CreateUploadResponse,
    FileListResponse, FileResponse, FinalizeUploadRequest, GrantResponse, HealthResponse,
    MintKeyRequest, RedeemResponse, SetExpiryRequest,
};
use super::{AppError, SharedState};
use crate::constants;
use crate::grants::{FinalizeOptions, Redemption, SweepReport};
use crate::types::{GrantId, PendingUploadId, StorageProvider, UploadMetadata, UploadResult};

fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {what} id: {raw}")))
}

/// GET /health
pub(crate) async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        external_store: state.remote.is_some(),
    })
}

/// POST /uploads - Issue a pending upload ticket.
pub(crate) async fn create_upload(
    State(state): State<SharedState>,
    Json(req): Json<CreateUploadRequest>,
) -> Result<(StatusCode, Json<CreateUploadResponse>), AppError> {
    let ttl_secs = req.ttl_secs.unwrap_or(state.pending_ttl_secs);
    if ttl_secs == 0 || ttl_secs > constants::MAX_PENDING_TTL_SECS {
        return Err(AppError::BadRequest(format!(
            "ttl_secs must be between 1 and {}",
            constants::MAX_PENDING_TTL_SECS
        )));
    }

    let now = Utc::now();
    let expires_at = now + Duration::seconds(ttl_secs as i64);
    let id = state.store.create_pending_upload_at(expires_at, now).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUploadResponse {
            pending_upload_id: id,
            upload_url: state.urls.upload_url(&id),
            storage_provider: StorageProvider::for_remote(state.remote.as_ref()),
            expires_at,
        }),
    ))
}

/// POST /uploads/{id}/finalize - Record the uploaded object.
pub(crate) async fn finalize_upload(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<FinalizeUploadRequest>,
) -> Result<(StatusCode, Json<UploadResult>), AppError> {
    let pending: PendingUploadId = parse_id(&id, "pending upload")?;
    let provider = StorageProvider::for_remote(state.remote.as_ref());

    let file = state
        .store
        .finalize_upload(
            pending,
            &req.storage_id,
            FinalizeOptions {
                expires_at: req.expires_at,
                provider,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResult {
            storage_id: file.storage_id.clone(),
            storage_provider: file.provider,
            expires_at: file.expires_at,
            metadata: UploadMetadata {
                storage_id: file.storage_id,
                size: req.size,
                sha256: req.sha256,
                content_type: req.content_type,
            },
            virtual_path: req.virtual_path,
        }),
    ))
}

/// GET /files - List all files.
pub(crate) async fn list_files(
    State(state): State<SharedState>,
) -> Result<Json<FileListResponse>, AppError> {
    let files = state.store.list_files().await?;
    Ok(Json(FileListResponse {
        files: files.into_iter().map(FileResponse::from).collect(),
    }))
}

/// GET /files/{storage_id}
pub(crate) async fn get_file(
    State(state): State<SharedState>,
    Path(storage_id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let file = state.store.get_file(&storage_id).await?;
    Ok(Json(file.into()))
}

/// PUT /files/{storage_id}/expiry - Update or clear the expiry.
pub(crate) async fn set_file_expiry(
    State(state): State<SharedState>,
    Path(storage_id): Path<String>,
    Json(req): Json<SetExpiryRequest>,
) -> Result<Json<FileResponse>, AppError> {
    let file = state
        .store
        .set_file_expiry(&storage_id, req.expires_at)
        .await?;
    Ok(Json(file.into()))
}

/// DELETE /files/{storage_id} - Delete a file and its access keys.
pub(crate) async fn delete_file(
    State(state): State<SharedState>,
    Path(storage_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.store.delete_file(&storage_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("file not found: {storage_id}")))
    }
}

/// POST /files/{storage_id}/keys - Mint an access key.
pub(crate) async fn mint_access_key(
    State(state): State<SharedState>,
    Path(storage_id): Path<String>,
    Json(req): Json<MintKeyRequest>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .mint_access_key(&storage_id, &req.access_key)
        .await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /files/{storage_id}/keys/{key} - Revoke an access key.
pub(crate) async fn revoke_access_key(
    State(state): State<SharedState>,
    Path((storage_id, key)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    if state.store.revoke_access_key(&storage_id, &key).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "access key not found for storage id: {storage_id}"
        )))
    }
}

/// POST /grants - Create a download grant.
pub(crate) async fn create_grant(
    State(state): State<SharedState>,
    Json(req): Json<CreateGrantRequest>,
) -> Result<(StatusCode, Json<CreateGrantResponse>), AppError> {
    let id = state
        .store
        .create_download_grant(&req.storage_id, req.expires_at, req.max_uses)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateGrantResponse {
            grant_id: id,
            download_url: state.urls.download_url(&id),
        }),
    ))
}

/// GET /grants/{id}
pub(crate) async fn get_grant(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<GrantResponse>, AppError> {
    let id: GrantId = parse_id(&id, "grant")?;
    let grant = state.store.get_grant(id).await?;
    Ok(Json(grant.into()))
}

/// POST /grants/{id}/redeem - Use a grant once.
///
/// 200 when allowed, 403 with a reason when denied.
pub(crate) async fn redeem_grant(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<RedeemResponse>), AppError> {
    let id: GrantId = parse_id(&id, "grant")?;
    // Storage id never changes, so reading it first is race-free
    let storage_id = state.store.get_grant(id).await?.storage_id;

    let response = match state.store.redeem_grant(id).await? {
        Redemption::Allowed {
            use_count,
            remaining,
        } => (
            StatusCode::OK,
            Json(RedeemResponse {
                allowed: true,
                storage_id: Some(storage_id),
                use_count: Some(use_count),
                remaining_uses: remaining,
                reason: None,
            }),
        ),
        Redemption::Denied(reason) => (
            StatusCode::FORBIDDEN,
            Json(RedeemResponse {
                allowed: false,
                storage_id: None,
                use_count: None,
                remaining_uses: None,
                reason: Some(reason),
            }),
        ),
    };
    Ok(response)
}

/// DELETE /grants/{id} - Revoke a grant.
pub(crate) async fn revoke_grant(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: GrantId = parse_id(&id, "grant")?;
    if state.store.revoke_grant(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("download grant not found: {id}")))
    }
}

/// POST /sweep - Remove every expired record now.
pub(crate) async fn sweep(
    State(state): State<SharedState>,
) -> Result<Json<SweepReport>, AppError> {
    let report = state.store.sweep_expired(Utc::now()).await?;
    Ok(Json(report))
}
