//! Backend trait for the access grant store.
//!
//! Defines the interface that all grant storage backends must implement,
//! enabling pluggable storage (redb, memory, a host database, etc.).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::types::{DownloadGrant, FileRecord, PendingUpload, Redemption, SweepReport};
use crate::error::Result;
use crate::types::{FileId, GrantId, PendingUploadId};

/// Backend trait for grant storage.
///
/// All backends must be thread-safe (`Send + Sync`) for use with tokio.
/// Every method is one serializable transaction: implementations must not
/// let another writer observe or interleave with a half-applied call.
/// Input validation (future expiries, `max_uses >= 1`) happens in
/// [`GrantStore`](super::GrantStore) before a backend is called.
#[async_trait]
pub trait GrantBackend: Send + Sync + 'static {
    /// Inserts a pending upload and its expiry index entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn insert_pending_upload(&self, upload: PendingUpload) -> Result<()>;

    /// Replaces a pending upload with a file record.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the pending upload is missing or expired at `now`
    /// - `DuplicateKey` if a file with the same storage id exists
    async fn finalize_upload(
        &self,
        pending: PendingUploadId,
        file: FileRecord,
        now: DateTime<Utc>,
    ) -> Result<FileId>;

    /// Associates an access key with a storage id.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the pair already exists.
    async fn insert_access_key(&self, storage_id: &str, access_key: &str) -> Result<()>;

    /// Removes an access key. Returns `Ok(false)` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn remove_access_key(&self, storage_id: &str, access_key: &str) -> Result<bool>;

    /// Checks whether the pair exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn has_access_key(&self, storage_id: &str, access_key: &str) -> Result<bool>;

    /// Inserts a download grant and its expiry index entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn insert_grant(&self, grant: DownloadGrant) -> Result<()>;

    /// Checks and increments a grant's use count atomically.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the grant does not exist.
    async fn redeem_grant(&self, id: GrantId, now: DateTime<Utc>) -> Result<Redemption>;

    /// Reads a grant without touching its use count.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn get_grant(&self, id: GrantId) -> Result<Option<DownloadGrant>>;

    /// Deletes a grant. Returns `Ok(false)` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn remove_grant(&self, id: GrantId) -> Result<bool>;

    /// Reads a file by storage id.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn get_file(&self, storage_id: &str) -> Result<Option<FileRecord>>;

    /// Lists all files sorted by storage id.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn list_files(&self) -> Result<Vec<FileRecord>>;

    /// Updates or clears a file's expiry, moving its index entry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file does not exist.
    async fn set_file_expiry(
        &self,
        storage_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<FileRecord>;

    /// Deletes a file and all of its access keys.
    ///
    /// Returns `Ok(false)` if the file did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn remove_file(&self, storage_id: &str) -> Result<bool>;

    /// Deletes every pending upload, file and grant whose expiry is `<= now`.
    ///
    /// Scans only the expired range of each expiry index.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<SweepReport>;
}
