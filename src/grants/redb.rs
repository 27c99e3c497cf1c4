//! Redb-backed grant storage backend.
//!
//! Provides persistent grant storage using redb with ACID guarantees.
//! redb serializes write transactions, so every mutating call (and in
//! particular the check-and-increment in `redeem_grant`) runs in one write
//! transaction and cannot interleave with another writer.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

use super::backend::GrantBackend;
use super::types::{
    DownloadGrant, FileRecord, PendingUpload, Redemption, SweepReport, expiry_millis,
};
use crate::error::{Error, RecordKind, Result};
use crate::types::{FileId, GrantId, PendingUploadId};

/// Files keyed by storage id.
const FILES_TABLE: TableDefinition<'static, &'static str, &'static [u8]> =
    TableDefinition::new("files");

/// `(storage_id, access_key)` pairs.
const FILE_ACCESS_TABLE: TableDefinition<'static, (&'static str, &'static str), ()> =
    TableDefinition::new("file_access");

/// Download grants keyed by grant id.
const GRANTS_TABLE: TableDefinition<'static, &'static str, &'static [u8]> =
    TableDefinition::new("download_grants");

/// Pending uploads keyed by pending upload id.
const PENDING_TABLE: TableDefinition<'static, &'static str, &'static [u8]> =
    TableDefinition::new("pending_uploads");

/// Expiry indexes: `(expiry_millis, record key)`.
const FILES_BY_EXPIRY: TableDefinition<'static, (i64, &'static str), ()> =
    TableDefinition::new("files_by_expiry");
const GRANTS_BY_EXPIRY: TableDefinition<'static, (i64, &'static str), ()> =
    TableDefinition::new("grants_by_expiry");
const PENDING_BY_EXPIRY: TableDefinition<'static, (i64, &'static str), ()> =
    TableDefinition::new("pending_by_expiry");

fn encode<T: Serialize>(record: &T, what: &str) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(record).with_context(|| format!("Failed to serialize {what}"))?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8], what: &str) -> Result<T> {
    Ok(serde_json::from_slice(bytes).with_context(|| format!("Failed to deserialize {what}"))?)
}

/// Collects the keys of every index entry with expiry `<= cutoff`.
fn expired_keys(
    index: &Table<'_, (i64, &'static str), ()>,
    cutoff: i64,
) -> Result<Vec<(i64, String)>> {
    let mut keys = Vec::new();
    let Some(end) = cutoff.checked_add(1) else {
        return Ok(keys);
    };
    for item in index
        .range(..(end, ""))
        .context("Failed to scan expiry index")?
    {
        let (key, _) = item.context("Failed to read expiry index entry")?;
        let (exp, id) = key.value();
        keys.push((exp, id.to_string()));
    }
    Ok(keys)
}

/// Removes every access key of `storage_id`. Returns how many were removed.
fn remove_access_keys(
    access: &mut Table<'_, (&'static str, &'static str), ()>,
    storage_id: &str,
) -> Result<usize> {
    let mut keys = Vec::new();
    for item in access
        .range((storage_id, "")..)
        .context("Failed to scan access keys")?
    {
        let (key, _) = item.context("Failed to read access key")?;
        let (sid, access_key) = key.value();
        if sid != storage_id {
            break;
        }
        keys.push(access_key.to_string());
    }
    for key in &keys {
        access
            .remove((storage_id, key.as_str()))
            .context("Failed to remove access key")?;
    }
    Ok(keys.len())
}


/// Removes access keys whose storage id has no file record. Returns how many
/// were removed.
fn remove_orphaned_access_keys(
    access: &mut Table<'_, (&'static str, &'static str), ()>,
    files: &Table<'_, &'static str, &'static [u8]>,
) -> Result<usize> {
    let mut orphaned = Vec::new();
    let mut last: Option<(String, bool)> = None;
    for item in access.iter().context("Failed to scan access keys")? {
        let (key, _) = item.context("Failed to read access key")?;
        let (sid, access_key) = key.value();
        let has_file = match &last {
            Some((seen, has_file)) if seen == sid => *has_file,
            _ => {
                let has_file = files
                    .get(sid)
                    .with_context(|| format!("Failed to read file '{sid}'"))?
                    .is_some();
                last = Some((sid.to_string(), has_file));
                has_file
            },
        };
        if !has_file {
            orphaned.push((sid.to_string(), access_key.to_string()));
        }
    }
    for (sid, key) in &orphaned {
        access
            .remove((sid.as_str(), key.as_str()))
            .context("Failed to remove access key")?;
    }
    Ok(orphaned.len())
}
/// Redb-backed grant storage backend.
///
/// # Thread Safety
///
/// `RedbBackend` is `Clone` and can be shared across threads. The underlying
/// database handles concurrent access safely.
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Opens or creates a redb database at the given path.
    ///
    /// Creates parent directories and all tables if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - Database file cannot be opened or created (permissions, disk full, etc.)
    /// - Initialization transaction fails to begin or commit
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create grant store directory: {}", parent.display())
            })?;
        }

        let db = Database::create(path)
            .with_context(|| format!("Failed to open grant database: {}", path.display()))?;

        // Create every table up front so read transactions can open them
        let write_txn = db
            .begin_write()
            .context("Failed to begin initialization transaction")?;
        {
            write_txn
                .open_table(FILES_TABLE)
                .context("Failed to initialize files table")?;
            write_txn
                .open_table(FILE_ACCESS_TABLE)
                .context("Failed to initialize file access table")?;
            write_txn
                .open_table(GRANTS_TABLE)
                .context("Failed to initialize grants table")?;
            write_txn
                .open_table(PENDING_TABLE)
                .context("Failed to initialize pending uploads table")?;
            write_txn
                .open_table(FILES_BY_EXPIRY)
                .context("Failed to initialize files expiry index")?;
            write_txn
                .open_table(GRANTS_BY_EXPIRY)
                .context("Failed to initialize grants expiry index")?;
            write_txn
                .open_table(PENDING_BY_EXPIRY)
                .context("Failed to initialize pending expiry index")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initialization transaction")?;

        tracing::debug!(path = %path.display(), "Opened grant database");

        Ok(Self { db: Arc::new(db) })
    }

    fn insert_pending_upload_sync(&self, upload: &PendingUpload) -> Result<()> {
        let id = upload.id.to_string();
        let json = encode(upload, "pending upload")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(PENDING_TABLE)
                .context("Failed to open pending uploads table")?;
            table
                .insert(id.as_str(), json.as_slice())
                .with_context(|| format!("Failed to insert pending upload '{id}'"))?;

            let mut index = write_txn
                .open_table(PENDING_BY_EXPIRY)
                .context("Failed to open pending expiry index")?;
            index
                .insert((expiry_millis(&upload.expires_at), id.as_str()), ())
                .context("Failed to index pending upload")?;
        }
        write_txn
            .commit()
            .context("Failed to commit pending upload transaction")?;

        Ok(())
    }

    fn finalize_upload_sync(
        &self,
        pending: PendingUploadId,
        file: &FileRecord,
        now: DateTime<Utc>,
    ) -> Result<FileId> {
        let pending_key = pending.to_string();
        let json = encode(file, "file record")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut pending_table = write_txn
                .open_table(PENDING_TABLE)
                .context("Failed to open pending uploads table")?;

            let stored = pending_table
                .get(pending_key.as_str())
                .with_context(|| format!("Failed to read pending upload '{pending_key}'"))?
                .map(|guard| guard.value().to_vec());
            let upload: PendingUpload = match stored {
                Some(bytes) => decode(&bytes, "pending upload")?,
                None => return Err(Error::not_found(RecordKind::PendingUpload, pending)),
            };
            if upload.is_expired_at(now) {
                return Err(Error::not_found(RecordKind::PendingUpload, pending));
            }

            let mut files = write_txn
                .open_table(FILES_TABLE)
                .context("Failed to open files table")?;
            if files
                .get(file.storage_id.as_str())
                .context("Failed to read files table")?
                .is_some()
            {
                return Err(Error::duplicate(&file.storage_id, &file.storage_id));
            }

            pending_table
                .remove(pending_key.as_str())
                .context("Failed to remove pending upload")?;
            let mut pending_index = write_txn
                .open_table(PENDING_BY_EXPIRY)
                .context("Failed to open pending expiry index")?;
            pending_index
                .remove((expiry_millis(&upload.expires_at), pending_key.as_str()))
                .context("Failed to unindex pending upload")?;

            files
                .insert(file.storage_id.as_str(), json.as_slice())
                .with_context(|| format!("Failed to insert file '{}'", file.storage_id))?;
            if let Some(exp) = &file.expires_at {
                let mut file_index = write_txn
                    .open_table(FILES_BY_EXPIRY)
                    .context("Failed to open files expiry index")?;
                file_index
                    .insert((expiry_millis(exp), file.storage_id.as_str()), ())
                    .context("Failed to index file")?;
            }
        }
        write_txn
            .commit()
            .context("Failed to commit finalize transaction")?;

        Ok(file.id)
    }

    fn insert_access_key_sync(&self, storage_id: &str, access_key: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(FILE_ACCESS_TABLE)
                .context("Failed to open file access table")?;
            let previous = table
                .insert((storage_id, access_key), ())
                .context("Failed to insert access key")?;
            if previous.is_some() {
                // Dropping the transaction aborts it
                return Err(Error::duplicate(storage_id, access_key));
            }
        }
        write_txn
            .commit()
            .context("Failed to commit access key transaction")?;

        Ok(())
    }

    fn remove_access_key_sync(&self, storage_id: &str, access_key: &str) -> Result<bool> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        let removed = {
            let mut table = write_txn
                .open_table(FILE_ACCESS_TABLE)
                .context("Failed to open file access table")?;
            table
                .remove((storage_id, access_key))
                .context("Failed to remove access key")?
                .is_some()
        };
        write_txn
            .commit()
            .context("Failed to commit access key removal")?;

        Ok(removed)
    }

    fn has_access_key_sync(&self, storage_id: &str, access_key: &str) -> Result<bool> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(FILE_ACCESS_TABLE)
            .context("Failed to open file access table")?;
        let found = table
            .get((storage_id, access_key))
            .context("Failed to read access key")?
            .is_some();
        Ok(found)
    }

    fn insert_grant_sync(&self, grant: &DownloadGrant) -> Result<()> {
        let id = grant.id.to_string();
        let json = encode(grant, "download grant")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(GRANTS_TABLE)
                .context("Failed to open grants table")?;
            table
                .insert(id.as_str(), json.as_slice())
                .with_context(|| format!("Failed to insert grant '{id}'"))?;

            if let Some(exp) = &grant.expires_at {
                let mut index = write_txn
                    .open_table(GRANTS_BY_EXPIRY)
                    .context("Failed to open grants expiry index")?;
                index
                    .insert((expiry_millis(exp), id.as_str()), ())
                    .context("Failed to index grant")?;
            }
        }
        write_txn
            .commit()
            .context("Failed to commit grant transaction")?;

        Ok(())
    }

    fn redeem_grant_sync(&self, id: GrantId, now: DateTime<Utc>) -> Result<Redemption> {
        let key = id.to_string();

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        let outcome = {
            let mut table = write_txn
                .open_table(GRANTS_TABLE)
                .context("Failed to open grants table")?;

            let stored = table
                .get(key.as_str())
                .with_context(|| format!("Failed to read grant '{key}'"))?
                .map(|guard| guard.value().to_vec());
            let Some(bytes) = stored else {
                return Err(Error::not_found(RecordKind::Grant, id));
            };
            let mut grant: DownloadGrant = decode(&bytes, "download grant")?;

            let outcome = grant.redeem(now);
            if outcome.is_allowed() {
                let json = encode(&grant, "download grant")?;
                table
                    .insert(key.as_str(), json.as_slice())
                    .with_context(|| format!("Failed to update grant '{key}'"))?;
            }
            outcome
        };
        write_txn
            .commit()
            .context("Failed to commit redemption transaction")?;

        Ok(outcome)
    }

    fn get_grant_sync(&self, id: GrantId) -> Result<Option<DownloadGrant>> {
        let key = id.to_string();
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(GRANTS_TABLE)
            .context("Failed to open grants table")?;

        match table
            .get(key.as_str())
            .with_context(|| format!("Failed to read grant '{key}'"))?
        {
            Some(guard) => Ok(Some(decode(guard.value(), "download grant")?)),
            None => Ok(None),
        }
    }

    fn remove_grant_sync(&self, id: GrantId) -> Result<bool> {
        let key = id.to_string();
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        let removed = {
            let mut table = write_txn
                .open_table(GRANTS_TABLE)
                .context("Failed to open grants table")?;
            let stored = table
                .remove(key.as_str())
                .with_context(|| format!("Failed to remove grant '{key}'"))?
                .map(|guard| guard.value().to_vec());

            match stored {
                Some(bytes) => {
                    let grant: DownloadGrant = decode(&bytes, "download grant")?;
                    if let Some(exp) = &grant.expires_at {
                        let mut index = write_txn
                            .open_table(GRANTS_BY_EXPIRY)
                            .context("Failed to open grants expiry index")?;
                        index
                            .remove((expiry_millis(exp), key.as_str()))
                            .context("Failed to unindex grant")?;
                    }
                    true
                },
                None => false,
            }
        };
        write_txn
            .commit()
            .context("Failed to commit grant removal")?;

        Ok(removed)
    }

    fn get_file_sync(&self, storage_id: &str) -> Result<Option<FileRecord>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(FILES_TABLE)
            .context("Failed to open files table")?;

        match table
            .get(storage_id)
            .with_context(|| format!("Failed to read file '{storage_id}'"))?
        {
            Some(guard) => Ok(Some(decode(guard.value(), "file record")?)),
            None => Ok(None),
        }
    }

    fn list_files_sync(&self) -> Result<Vec<FileRecord>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(FILES_TABLE)
            .context("Failed to open files table")?;

        let mut files = Vec::new();
        for item in table.iter().context("Failed to iterate files table")? {
            let (_, value) = item.context("Failed to read file entry")?;
            files.push(decode(value.value(), "file record")?);
        }
        Ok(files)
    }

    fn set_file_expiry_sync(
        &self,
        storage_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<FileRecord> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        let updated = {
            let mut table = write_txn
                .open_table(FILES_TABLE)
                .context("Failed to open files table")?;
            let stored = table
                .get(storage_id)
                .with_context(|| format!("Failed to read file '{storage_id}'"))?
                .map(|guard| guard.value().to_vec());
            let Some(bytes) = stored else {
                return Err(Error::not_found(RecordKind::File, storage_id));
            };
            let mut file: FileRecord = decode(&bytes, "file record")?;
            let previous = std::mem::replace(&mut file.expires_at, expires_at);

            let json = encode(&file, "file record")?;
            table
                .insert(storage_id, json.as_slice())
                .with_context(|| format!("Failed to update file '{storage_id}'"))?;

            let mut index = write_txn
                .open_table(FILES_BY_EXPIRY)
                .context("Failed to open files expiry index")?;
            if let Some(exp) = &previous {
                index
                    .remove((expiry_millis(exp), storage_id))
                    .context("Failed to unindex file")?;
            }
            if let Some(exp) = &expires_at {
                index
                    .insert((expiry_millis(exp), storage_id), ())
                    .context("Failed to index file")?;
            }
            file
        };
        write_txn
            .commit()
            .context("Failed to commit file expiry transaction")?;

        Ok(updated)
    }

    /// Removes a file, its index entry and its access keys inside `write_txn`.
    ///
    /// Returns the number of access keys removed, or `None` if the file did
    /// not exist.
    fn remove_file_in(write_txn: &redb::WriteTransaction, storage_id: &str) -> Result<Option<usize>> {
        let mut table = write_txn
            .open_table(FILES_TABLE)
            .context("Failed to open files table")?;
        let stored = table
            .remove(storage_id)
            .with_context(|| format!("Failed to remove file '{storage_id}'"))?
            .map(|guard| guard.value().to_vec());
        let Some(bytes) = stored else {
            return Ok(None);
        };

        let file: FileRecord = decode(&bytes, "file record")?;
        if let Some(exp) = &file.expires_at {
            let mut index = write_txn
                .open_table(FILES_BY_EXPIRY)
                .context("Failed to open files expiry index")?;
            index
                .remove((expiry_millis(exp), storage_id))
                .context("Failed to unindex file")?;
        }

        let mut access = write_txn
            .open_table(FILE_ACCESS_TABLE)
            .context("Failed to open file access table")?;
        Ok(Some(remove_access_keys(&mut access, storage_id)?))
    }

    fn remove_file_sync(&self, storage_id: &str) -> Result<bool> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        let removed = Self::remove_file_in(&write_txn, storage_id)?.is_some();
        write_txn
            .commit()
            .context("Failed to commit file removal")?;

        Ok(removed)
    }

    fn sweep_expired_sync(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let cutoff = expiry_millis(&now);
        let mut report = SweepReport::default();

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin sweep transaction")?;

        {
            let mut index = write_txn
                .open_table(PENDING_BY_EXPIRY)
                .context("Failed to open pending expiry index")?;
            let mut table = write_txn
                .open_table(PENDING_TABLE)
                .context("Failed to open pending uploads table")?;
            for (exp, id) in expired_keys(&index, cutoff)? {
                index
                    .remove((exp, id.as_str()))
                    .context("Failed to unindex pending upload")?;
                if table
                    .remove(id.as_str())
                    .context("Failed to remove pending upload")?
                    .is_some()
                {
                    report.pending_uploads += 1;
                }
            }
        }

        let expired_files = {
            let index = write_txn
                .open_table(FILES_BY_EXPIRY)
                .context("Failed to open files expiry index")?;
            expired_keys(&index, cutoff)?
        };
        for (_, storage_id) in expired_files {
            if let Some(keys) = Self::remove_file_in(&write_txn, &storage_id)? {
                report.files += 1;
                report.access_keys += keys;
            }
        }

        {
            let mut access = write_txn
                .open_table(FILE_ACCESS_TABLE)
                .context("Failed to open file access table")?;
            let files = write_txn
                .open_table(FILES_TABLE)
                .context("Failed to open files table")?;
            report.access_keys += remove_orphaned_access_keys(&mut access, &files)?;
        }

        {
            let mut index = write_txn
                .open_table(GRANTS_BY_EXPIRY)
                .context("Failed to open grants expiry index")?;
            let mut table = write_txn
                .open_table(GRANTS_TABLE)
                .context("Failed to open grants table")?;
            for (exp, id) in expired_keys(&index, cutoff)? {
                index
                    .remove((exp, id.as_str()))
                    .context("Failed to unindex grant")?;
                if table
                    .remove(id.as_str())
                    .context("Failed to remove grant")?
                    .is_some()
                {
                    report.grants += 1;
                }
            }
        }

        write_txn
            .commit()
            .context("Failed to commit sweep transaction")?;

        Ok(report)
    }
}

#[async_trait]
impl GrantBackend for RedbBackend {
    async fn insert_pending_upload(&self, upload: PendingUpload) -> Result<()> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.insert_pending_upload_sync(&upload))
            .await
            .context("Task join error")?
    }

    async fn finalize_upload(
        &self,
        pending: PendingUploadId,
        file: FileRecord,
        now: DateTime<Utc>,
    ) -> Result<FileId> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.finalize_upload_sync(pending, &file, now))
            .await
            .context("Task join error")?
    }

    async fn insert_access_key(&self, storage_id: &str, access_key: &str) -> Result<()> {
        let backend = self.clone();
        let storage_id = storage_id.to_string();
        let access_key = access_key.to_string();
        tokio::task::spawn_blocking(move || backend.insert_access_key_sync(&storage_id, &access_key))
            .await
            .context("Task join error")?
    }

    async fn remove_access_key(&self, storage_id: &str, access_key: &str) -> Result<bool> {
        let backend = self.clone();
        let storage_id = storage_id.to_string();
        let access_key = access_key.to_string();
        tokio::task::spawn_blocking(move || backend.remove_access_key_sync(&storage_id, &access_key))
            .await
            .context("Task join error")?
    }

    async fn has_access_key(&self, storage_id: &str, access_key: &str) -> Result<bool> {
        let backend = self.clone();
        let storage_id = storage_id.to_string();
        let access_key = access_key.to_string();
        tokio::task::spawn_blocking(move || backend.has_access_key_sync(&storage_id, &access_key))
            .await
            .context("Task join error")?
    }

    async fn insert_grant(&self, grant: DownloadGrant) -> Result<()> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.insert_grant_sync(&grant))
            .await
            .context("Task join error")?
    }

    async fn redeem_grant(&self, id: GrantId, now: DateTime<Utc>) -> Result<Redemption> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.redeem_grant_sync(id, now))
            .await
            .context("Task join error")?
    }

    async fn get_grant(&self, id: GrantId) -> Result<Option<DownloadGrant>> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.get_grant_sync(id))
            .await
            .context("Task join error")?
    }

    async fn remove_grant(&self, id: GrantId) -> Result<bool> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.remove_grant_sync(id))
            .await
            .context("Task join error")?
    }

    async fn get_file(&self, storage_id: &str) -> Result<Option<FileRecord>> {
        let backend = self.clone();
        let storage_id = storage_id.to_string();
        tokio::task::spawn_blocking(move || backend.get_file_sync(&storage_id))
            .await
            .context("Task join error")?
    }

    async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.list_files_sync())
            .await
            .context("Task join error")?
    }

    async fn set_file_expiry(
        &self,
        storage_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<FileRecord> {
        let backend = self.clone();
        let storage_id = storage_id.to_string();
        tokio::task::spawn_blocking(move || backend.set_file_expiry_sync(&storage_id, expires_at))
            .await
            .context("Task join error")?
    }

    async fn remove_file(&self, storage_id: &str) -> Result<bool> {
        let backend = self.clone();
        let storage_id = storage_id.to_string();
        tokio::task::spawn_blocking(move || backend.remove_file_sync(&storage_id))
            .await
            .context("Task join error")?
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.sweep_expired_sync(now))
            .await
            .context("Task join error")?
    }
}
