//! Value types shared by the store, the HTTP API and callers.
//!
//! - [`FileId`], [`GrantId`], [`PendingUploadId`] - typed record ids
//! - [`StorageProvider`] - which blob store holds an object
//! - [`UploadMetadata`] / [`UploadResult`] - shapes exchanged on upload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::remote::R2Config;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Id of a finalized file record.
    FileId
);
define_id!(
    /// Id of a download grant.
    GrantId
);
define_id!(
    /// Id of a pending upload ticket.
    PendingUploadId
);

/// Backing store holding an object's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// The host platform's built-in blob storage.
    #[default]
    Primary,
    /// An optionally configured R2-compatible object store.
    External,
}

impl StorageProvider {
    /// Pick the provider for new uploads: external when R2 is configured.
    pub fn for_remote(remote: Option<&R2Config>) -> Self {
        if remote.is_some() {
            Self::External
        } else {
            Self::Primary
        }
    }
}

impl fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::External => write!(f, "external"),
        }
    }
}

impl FromStr for StorageProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "external" => Ok(Self::External),
            _ => Err(anyhow::anyhow!("Invalid storage provider: {s}")),
        }
    }
}

/// Metadata describing an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub storage_id: String,
    /// Size in bytes
    pub size: u64,
    /// Lowercase hex SHA-256 of the content
    pub sha256: String,
    pub content_type: String,
}

impl UploadMetadata {
    /// Describe `data` stored under `storage_id`, computing its digest.
    pub fn from_bytes(
        storage_id: impl Into<String>,
        data: &[u8],
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            storage_id: storage_id.into(),
            size: data.len() as u64,
            sha256: hex::encode(Sha256::digest(data)),
            content_type: content_type.into(),
        }
    }
}

/// Result returned to the client once an upload is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub storage_id: String,
    pub storage_provider: StorageProvider,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: UploadMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_path: Option<String>,
}
