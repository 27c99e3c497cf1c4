//! High-level `GrantStore` wrapper over backend implementations.
//!
//! Validates inputs, stamps ids and creation times, logs lifecycle events
//! and delegates each operation to one backend transaction.

use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

use super::backend::GrantBackend;
use super::memory::MemoryBackend;
use super::redb::RedbBackend;
use super::types::{
    DownloadGrant, FileRecord, PendingUpload, Redemption, SweepReport, truncate_millis,
};
use crate::error::{Error, RecordKind, Result};
use crate::types::{FileId, GrantId, PendingUploadId, StorageProvider};

/// Options for finalizing a pending upload.
#[derive(Debug, Clone, Default)]
pub struct FinalizeOptions {
    pub expires_at: Option<DateTime<Utc>>,
    pub provider: StorageProvider,
}

/// Authoritative record of stored files, their access keys and grants, and
/// in-flight uploads.
///
/// Each method has an `_at` form taking an explicit `now`; the plain form
/// uses the wall clock.
///
/// # Thread Safety
///
/// `GrantStore` is `Clone` and can be shared across threads. The underlying
/// backend handles concurrent access safely.
///
/// # Example
///
/// ```ignore
/// use filegate::grants::GrantStore;
/// use chrono::{Duration, Utc};
///
/// let store = GrantStore::memory();
/// let ticket = store.create_pending_upload(Utc::now() + Duration::hours(1)).await?;
/// let file = store.finalize_upload(ticket, "blob-1", Default::default()).await?;
/// let grant = store.create_download_grant("blob-1", None, Some(3)).await?;
/// assert!(store.redeem_grant(grant).await?.is_allowed());
/// ```
#[derive(Clone)]
pub struct GrantStore {
    backend: Arc<dyn GrantBackend>,
}

impl GrantStore {
    /// Creates a new `GrantStore` backed by a file-based redb database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let backend = RedbBackend::open(path)?;
        Ok(Self {
            backend: Arc::new(backend),
        })
    }

    /// Creates a new `GrantStore` backed by an in-memory store.
    ///
    /// All data is lost when the process exits.
    pub fn memory() -> Self {
        Self {
            backend: Arc::new(MemoryBackend::new()),
        }
    }

    /// Creates a new `GrantStore` with a custom backend.
    pub fn custom<B: GrantBackend>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    // -------------------------------------------------------------------------
    // Pending uploads
    // -------------------------------------------------------------------------

    /// Reserves an upload slot that stays redeemable until `expires_at`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` unless `expires_at` is in the future.
    pub async fn create_pending_upload(&self, expires_at: DateTime<Utc>) -> Result<PendingUploadId> {
        self.create_pending_upload_at(expires_at, Utc::now()).await
    }

    pub async fn create_pending_upload_at(
        &self,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<PendingUploadId> {
        let expires_at = require_future(expires_at, now, "pending upload expiry")?;
        let upload = PendingUpload {
            id: PendingUploadId::new(),
            expires_at,
            created_at: now,
        };
        let id = upload.id;
        self.backend.insert_pending_upload(upload).await?;

        tracing::info!(pending_upload = %id, %expires_at, "Created pending upload");
        Ok(id)
    }

    /// Turns a pending upload into a file record and returns the record as
    /// committed.
    ///
    /// Not idempotent: once finalized, the pending id is gone and a second
    /// call fails with `NotFound`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the pending upload is missing, finalized or expired
    /// - `InvalidArgument` for an empty storage id or a past expiry
    /// - `DuplicateKey` if the storage id is already recorded
    pub async fn finalize_upload(
        &self,
        pending: PendingUploadId,
        storage_id: &str,
        options: FinalizeOptions,
    ) -> Result<FileRecord> {
        self.finalize_upload_at(pending, storage_id, options, Utc::now())
            .await
    }

    pub async fn finalize_upload_at(
        &self,
        pending: PendingUploadId,
        storage_id: &str,
        options: FinalizeOptions,
        now: DateTime<Utc>,
    ) -> Result<FileRecord> {
        require_non_empty(storage_id, "storage id")?;
        let expires_at = options
            .expires_at
            .map(|exp| require_future(exp, now, "file expiry"))
            .transpose()?;

        let file = FileRecord {
            id: FileId::new(),
            storage_id: storage_id.to_string(),
            provider: options.provider,
            expires_at,
            created_at: now,
        };
        let id = self.backend.finalize_upload(pending, file.clone(), now).await?;

        tracing::info!(
            pending_upload = %pending,
            file = %id,
            storage_id,
            provider = %options.provider,
            "Finalized upload"
        );
        Ok(file)
    }

    // -------------------------------------------------------------------------
    // Access keys
    // -------------------------------------------------------------------------

    /// Associates a caller-supplied access key with a storage id.
    ///
    /// # Errors
    ///
    /// - `DuplicateKey` if the pair already exists
    /// - `InvalidArgument` for an empty key or storage id
    pub async fn mint_access_key(&self, storage_id: &str, access_key: &str) -> Result<()> {
        require_non_empty(storage_id, "storage id")?;
        require_non_empty(access_key, "access key")?;
        self.backend.insert_access_key(storage_id, access_key).await?;

        tracing::info!(storage_id, "Minted access key");
        Ok(())
    }

    /// Removes an access key. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn revoke_access_key(&self, storage_id: &str, access_key: &str) -> Result<bool> {
        let removed = self
            .backend
            .remove_access_key(storage_id, access_key)
            .await?;
        if removed {
            tracing::info!(storage_id, "Revoked access key");
        }
        Ok(removed)
    }

    /// Checks whether `access_key` unlocks `storage_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn has_access(&self, storage_id: &str, access_key: &str) -> Result<bool> {
        self.backend.has_access_key(storage_id, access_key).await
    }

    // -------------------------------------------------------------------------
    // Download grants
    // -------------------------------------------------------------------------

    /// Issues a grant bounded by time and/or number of uses.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `max_uses` is zero, the expiry is not in
    /// the future, or the storage id is empty.
    pub async fn create_download_grant(
        &self,
        storage_id: &str,
        expires_at: Option<DateTime<Utc>>,
        max_uses: Option<u32>,
    ) -> Result<GrantId> {
        self.create_download_grant_at(storage_id, expires_at, max_uses, Utc::now())
            .await
    }

    pub async fn create_download_grant_at(
        &self,
        storage_id: &str,
        expires_at: Option<DateTime<Utc>>,
        max_uses: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<GrantId> {
        require_non_empty(storage_id, "storage id")?;
        if max_uses == Some(0) {
            return Err(Error::invalid("max_uses must be at least 1"));
        }
        let expires_at = expires_at
            .map(|exp| require_future(exp, now, "grant expiry"))
            .transpose()?;

        let grant = DownloadGrant {
            id: GrantId::new(),
            storage_id: storage_id.to_string(),
            expires_at,
            max_uses,
            use_count: 0,
            created_at: now,
        };
        let id = grant.id;
        self.backend.insert_grant(grant).await?;

        tracing::info!(grant = %id, storage_id, ?expires_at, ?max_uses, "Created download grant");
        Ok(id)
    }

    /// Redeems one use of a grant.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the grant does not exist (or was swept).
    pub async fn redeem_grant(&self, id: GrantId) -> Result<Redemption> {
        self.redeem_grant_at(id, Utc::now()).await
    }

    pub async fn redeem_grant_at(&self, id: GrantId, now: DateTime<Utc>) -> Result<Redemption> {
        let outcome = self.backend.redeem_grant(id, now).await?;
        match outcome {
            Redemption::Allowed { use_count, .. } => {
                tracing::debug!(grant = %id, use_count, "Redeemed download grant");
            },
            Redemption::Denied(reason) => {
                tracing::warn!(grant = %id, %reason, "Download grant denied");
            },
        }
        Ok(outcome)
    }

    /// Reads a grant.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the grant does not exist.
    pub async fn get_grant(&self, id: GrantId) -> Result<DownloadGrant> {
        self.backend
            .get_grant(id)
            .await?
            .ok_or_else(|| Error::not_found(RecordKind::Grant, id))
    }

    /// Deletes a grant. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn revoke_grant(&self, id: GrantId) -> Result<bool> {
        let removed = self.backend.remove_grant(id).await?;
        if removed {
            tracing::info!(grant = %id, "Revoked download grant");
        }
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Files
    // -------------------------------------------------------------------------

    /// Reads a file by storage id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no file has this storage id.
    pub async fn get_file(&self, storage_id: &str) -> Result<FileRecord> {
        self.backend
            .get_file(storage_id)
            .await?
            .ok_or_else(|| Error::not_found(RecordKind::File, storage_id))
    }

    /// Lists all files sorted by storage id.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let files = self.backend.list_files().await?;
        tracing::debug!(count = files.len(), "Listed files");
        Ok(files)
    }

    /// Updates (`Some`) or clears (`None`) a file's expiry.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no file has this storage id
    /// - `InvalidArgument` if the new expiry is not in the future
    pub async fn set_file_expiry(
        &self,
        storage_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<FileRecord> {
        self.set_file_expiry_at(storage_id, expires_at, Utc::now())
            .await
    }

    pub async fn set_file_expiry_at(
        &self,
        storage_id: &str,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<FileRecord> {
        let expires_at = expires_at
            .map(|exp| require_future(exp, now, "file expiry"))
            .transpose()?;
        let file = self.backend.set_file_expiry(storage_id, expires_at).await?;

        tracing::info!(storage_id, ?expires_at, "Updated file expiry");
        Ok(file)
    }

    /// Deletes a file and its access keys. Returns `false` if it did not exist.
    ///
    /// Grants for the storage id are left to expire or be revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn delete_file(&self, storage_id: &str) -> Result<bool> {
        let removed = self.backend.remove_file(storage_id).await?;
        if removed {
            tracing::info!(storage_id, "Deleted file");
        }
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Sweep
    // -------------------------------------------------------------------------

    /// Deletes every record whose expiry is `<= now`.
    ///
    /// Idempotent: a second call with the same `now` removes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let report = self.backend.sweep_expired(now).await?;

        if report.is_empty() {
            tracing::debug!(%now, "Sweep found nothing to remove");
        } else {
            tracing::info!(
                %now,
                pending_uploads = report.pending_uploads,
                files = report.files,
                access_keys = report.access_keys,
                grants = report.grants,
                "Swept expired records"
            );
        }
        Ok(report)
    }
}

fn require_future(at: DateTime<Utc>, now: DateTime<Utc>, what: &str) -> Result<DateTime<Utc>> {
    let at = truncate_millis(at);
    if at <= now {
        return Err(Error::invalid(format!("{what} must be in the future")));
    }
    Ok(at)
}

fn require_non_empty(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid(format!("{what} cannot be empty")));
    }
    Ok(())
}
