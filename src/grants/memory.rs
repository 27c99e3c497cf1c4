//! In-memory grant storage backend.
//!
//! Provides a fast, non-persistent grant store. All tables live behind a
//! single `parking_lot` mutex, so each backend call is one serializable
//! transaction. Ideal for testing, development, and embedded use cases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use super::backend::GrantBackend;
use super::types::{
    DownloadGrant, FileRecord, PendingUpload, Redemption, SweepReport, expiry_millis,
};
use crate::error::{Error, RecordKind, Result};
use crate::types::{FileId, GrantId, PendingUploadId};

#[derive(Default)]
struct Tables {
    /// Files keyed by storage id.
    files: BTreeMap<String, FileRecord>,
    /// Access keys grouped by storage id.
    file_access: HashMap<String, BTreeSet<String>>,
    grants: HashMap<GrantId, DownloadGrant>,
    pending: HashMap<PendingUploadId, PendingUpload>,
    files_by_expiry: BTreeSet<(i64, String)>,
    grants_by_expiry: BTreeSet<(i64, GrantId)>,
    pending_by_expiry: BTreeSet<(i64, PendingUploadId)>,
}

impl Tables {
    fn remove_file(&mut self, storage_id: &str) -> Option<(FileRecord, usize)> {
        let file = self.files.remove(storage_id)?;
        if let Some(exp) = &file.expires_at {
            self.files_by_expiry
                .remove(&(expiry_millis(exp), storage_id.to_string()));
        }
        let keys = self
            .file_access
            .remove(storage_id)
            .map_or(0, |keys| keys.len());
        Some((file, keys))
    }
}

/// Pops every entry with expiry `<= cutoff` from the front of an index.
fn drain_expired<T: Ord + Clone>(index: &mut BTreeSet<(i64, T)>, cutoff: i64) -> Vec<T> {
    let mut expired = Vec::new();
    while let Some((exp, _)) = index.first() {
        if *exp > cutoff {
            break;
        }
        if let Some((_, id)) = index.pop_first() {
            expired.push(id);
        }
    }
    expired
}

/// In-memory grant storage backend.
///
/// # Thread Safety
///
/// `MemoryBackend` is `Clone`; clones share the same tables.
///
/// # Example
///
/// ```ignore
/// use filegate::grants::{GrantStore, MemoryBackend};
///
/// let store = GrantStore::custom(MemoryBackend::new());
/// ```
#[derive(Clone, Default)]
pub struct MemoryBackend {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records across all tables (including expired).
    pub fn len(&self) -> usize {
        let t = self.tables.lock();
        t.files.len()
            + t.file_access.values().map(BTreeSet::len).sum::<usize>()
            + t.grants.len()
            + t.pending.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GrantBackend for MemoryBackend {
    async fn insert_pending_upload(&self, upload: PendingUpload) -> Result<()> {
        let mut t = self.tables.lock();
        t.pending_by_expiry
            .insert((expiry_millis(&upload.expires_at), upload.id));
        t.pending.insert(upload.id, upload);
        Ok(())
    }

    async fn finalize_upload(
        &self,
        pending: PendingUploadId,
        file: FileRecord,
        now: DateTime<Utc>,
    ) -> Result<FileId> {
        let mut t = self.tables.lock();

        match t.pending.get(&pending) {
            Some(upload) if !upload.is_expired_at(now) => {},
            _ => return Err(Error::not_found(RecordKind::PendingUpload, pending)),
        }
        if t.files.contains_key(&file.storage_id) {
            return Err(Error::duplicate(&file.storage_id, &file.storage_id));
        }

        if let Some(upload) = t.pending.remove(&pending) {
            t.pending_by_expiry
                .remove(&(expiry_millis(&upload.expires_at), pending));
        }
        if let Some(exp) = &file.expires_at {
            t.files_by_expiry
                .insert((expiry_millis(exp), file.storage_id.clone()));
        }
        let id = file.id;
        t.files.insert(file.storage_id.clone(), file);
        Ok(id)
    }

    async fn insert_access_key(&self, storage_id: &str, access_key: &str) -> Result<()> {
        let mut t = self.tables.lock();
        let keys = t.file_access.entry(storage_id.to_string()).or_default();
        if !keys.insert(access_key.to_string()) {
            return Err(Error::duplicate(storage_id, access_key));
        }
        Ok(())
    }

    async fn remove_access_key(&self, storage_id: &str, access_key: &str) -> Result<bool> {
        let mut t = self.tables.lock();
        let Some(keys) = t.file_access.get_mut(storage_id) else {
            return Ok(false);
        };
        let removed = keys.remove(access_key);
        if keys.is_empty() {
            t.file_access.remove(storage_id);
        }
        Ok(removed)
    }

    async fn has_access_key(&self, storage_id: &str, access_key: &str) -> Result<bool> {
        let t = self.tables.lock();
        Ok(t
            .file_access
            .get(storage_id)
            .is_some_and(|keys| keys.contains(access_key)))
    }

    async fn insert_grant(&self, grant: DownloadGrant) -> Result<()> {
        let mut t = self.tables.lock();
        if let Some(exp) = &grant.expires_at {
            t.grants_by_expiry.insert((expiry_millis(exp), grant.id));
        }
        t.grants.insert(grant.id, grant);
        Ok(())
    }

    async fn redeem_grant(&self, id: GrantId, now: DateTime<Utc>) -> Result<Redemption> {
        let mut t = self.tables.lock();
        let grant = t
            .grants
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(RecordKind::Grant, id))?;
        Ok(grant.redeem(now))
    }

    async fn get_grant(&self, id: GrantId) -> Result<Option<DownloadGrant>> {
        Ok(self.tables.lock().grants.get(&id).cloned())
    }

    async fn remove_grant(&self, id: GrantId) -> Result<bool> {
        let mut t = self.tables.lock();
        let Some(grant) = t.grants.remove(&id) else {
            return Ok(false);
        };
        if let Some(exp) = &grant.expires_at {
            t.grants_by_expiry.remove(&(expiry_millis(exp), id));
        }
        Ok(true)
    }

    async fn get_file(&self, storage_id: &str) -> Result<Option<FileRecord>> {
        Ok(self.tables.lock().files.get(storage_id).cloned())
    }

    async fn list_files(&self) -> Result<Vec<FileRecord>> {
        Ok(self.tables.lock().files.values().cloned().collect())
    }

    async fn set_file_expiry(
        &self,
        storage_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<FileRecord> {
        let mut t = self.tables.lock();
        let Some(file) = t.files.get_mut(storage_id) else {
            return Err(Error::not_found(RecordKind::File, storage_id));
        };
        let previous = std::mem::replace(&mut file.expires_at, expires_at);
        let updated = file.clone();

        if let Some(exp) = &previous {
            t.files_by_expiry
                .remove(&(expiry_millis(exp), storage_id.to_string()));
        }
        if let Some(exp) = &expires_at {
            t.files_by_expiry
                .insert((expiry_millis(exp), storage_id.to_string()));
        }
        Ok(updated)
    }

    async fn remove_file(&self, storage_id: &str) -> Result<bool> {
        Ok(self.tables.lock().remove_file(storage_id).is_some())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let cutoff = expiry_millis(&now);
        let mut t = self.tables.lock();
        let mut report = SweepReport::default();

        for id in drain_expired(&mut t.pending_by_expiry, cutoff) {
            if t.pending.remove(&id).is_some() {
                report.pending_uploads += 1;
            }
        }

        for storage_id in drain_expired(&mut t.files_by_expiry, cutoff) {
            if let Some((_, keys)) = t.remove_file(&storage_id) {
                report.files += 1;
                report.access_keys += keys;
            }
        }

        let Tables {
            files, file_access, ..
        } = &mut *t;
        file_access.retain(|storage_id, keys| {
            let keep = files.contains_key(storage_id);
            if !keep {
                report.access_keys += keys.len();
            }
            keep
        });

        for id in drain_expired(&mut t.grants_by_expiry, cutoff) {
            if t.grants.remove(&id).is_some() {
                report.grants += 1;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StorageProvider;
    use chrono::Duration;

    fn file(storage_id: &str, expires_at: Option<DateTime<Utc>>) -> FileRecord {
        FileRecord {
            id: FileId::new(),
            storage_id: storage_id.to_string(),
            provider: StorageProvider::Primary,
            expires_at,
            created_at: Utc::now(),
        }
    }

    fn pending(expires_at: DateTime<Utc>) -> PendingUpload {
        PendingUpload {
            id: PendingUploadId::new(),
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_finalize_moves_pending_to_files() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let upload = pending(now + Duration::hours(1));
        let id = upload.id;
        backend.insert_pending_upload(upload).await.unwrap();

        backend
            .finalize_upload(id, file("blob-1", None), now)
            .await
            .unwrap();

        assert!(backend.get_file("blob-1").await.unwrap().is_some());
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_file_cascades_access_keys() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let upload = pending(now + Duration::hours(1));
        let id = upload.id;
        backend.insert_pending_upload(upload).await.unwrap();
        backend
            .finalize_upload(id, file("blob-1", None), now)
            .await
            .unwrap();
        backend.insert_access_key("blob-1", "k1").await.unwrap();
        backend.insert_access_key("blob-1", "k2").await.unwrap();
        backend.insert_access_key("blob-2", "k1").await.unwrap();

        assert!(backend.remove_file("blob-1").await.unwrap());
        assert!(!backend.has_access_key("blob-1", "k1").await.unwrap());
        assert!(backend.has_access_key("blob-2", "k1").await.unwrap());
        assert!(!backend.remove_file("blob-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_file_expiry_moves_index_entry() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let upload = pending(now + Duration::hours(1));
        let id = upload.id;
        backend.insert_pending_upload(upload).await.unwrap();
        backend
            .finalize_upload(id, file("blob-1", Some(now + Duration::minutes(5))), now)
            .await
            .unwrap();

        backend
            .set_file_expiry("blob-1", Some(now + Duration::days(1)))
            .await
            .unwrap();

        let report = backend
            .sweep_expired(now + Duration::minutes(10))
            .await
            .unwrap();
        assert_eq!(report.files, 0);

        backend.set_file_expiry("blob-1", None).await.unwrap();
        let report = backend
            .sweep_expired(now + Duration::days(2))
            .await
            .unwrap();
        assert_eq!(report.files, 0);
        assert!(backend.get_file("blob-1").await.unwrap().is_some());
    }

    #[test]
    fn test_drain_expired_stops_at_cutoff() {
        let mut index = BTreeSet::from([(1, "a"), (5, "b"), (5, "c"), (9, "d")]);
        let drained = drain_expired(&mut index, 5);
        assert_eq!(drained, vec!["a", "b", "c"]);
        assert_eq!(index.len(), 1);
        assert!(drain_expired(&mut index, 5).is_empty());
    }
}
