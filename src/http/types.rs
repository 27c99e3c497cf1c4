//! Request and response bodies for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::grants::{DenialReason, DownloadGrant, FileRecord};
use crate::types::{FileId, GrantId, PendingUploadId, StorageProvider};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub external_store: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateUploadRequest {
    /// Ticket lifetime; defaults to `uploads.pending_ttl_secs`.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUploadResponse {
    pub pending_upload_id: PendingUploadId,
    pub upload_url: String,
    pub storage_provider: StorageProvider,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FinalizeUploadRequest {
    pub storage_id: String,
    pub size: u64,
    pub sha256: String,
    pub content_type: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub virtual_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileResponse {
    pub id: FileId,
    pub storage_id: String,
    pub storage_provider: StorageProvider,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        Self {
            id: file.id,
            storage_id: file.storage_id,
            storage_provider: file.provider,
            expires_at: file.expires_at,
            created_at: file.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetExpiryRequest {
    /// `null` clears the expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MintKeyRequest {
    pub access_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGrantRequest {
    pub storage_id: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_uses: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGrantResponse {
    pub grant_id: GrantId,
    pub download_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GrantResponse {
    pub id: GrantId,
    pub storage_id: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<u32>,
    pub use_count: u32,
    pub remaining_uses: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl From<DownloadGrant> for GrantResponse {
    fn from(grant: DownloadGrant) -> Self {
        Self {
            remaining_uses: grant.remaining_uses(),
            id: grant.id,
            storage_id: grant.storage_id,
            expires_at: grant.expires_at,
            max_uses: grant.max_uses,
            use_count: grant.use_count,
            created_at: grant.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedeemResponse {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_uses: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenialReason>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
