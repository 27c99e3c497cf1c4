//! Error types for the access grant store.
//!
//! Lifecycle operations return [`Error`] for caller mistakes (bad expiry,
//! unknown ids, key collisions) and wrap backend failures in
//! [`Error::Storage`]. A denied grant redemption is not an error; see
//! [`crate::grants::Redemption`].

/// Result type for grant store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Record kinds that can be reported as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    PendingUpload,
    File,
    Grant,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PendingUpload => write!(f, "pending upload"),
            Self::File => write!(f, "file"),
            Self::Grant => write!(f, "download grant"),
        }
    }
}

/// Grant store errors with structured context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Bad expiry, zero `max_uses`, empty key and similar input errors.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The referenced record does not exist (or no longer exists).
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    /// A unique index already holds this key.
    #[error("duplicate key '{key}' for storage id '{storage_id}'")]
    DuplicateKey { storage_id: String, key: String },

    /// Backend failure (database I/O, serialization, task join).
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl Error {
    /// Create an invalid argument error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Create a not found error.
    pub fn not_found(kind: RecordKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Create a duplicate key error.
    pub fn duplicate(storage_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            storage_id: storage_id.into(),
            key: key.into(),
        }
    }

    /// Get the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,
            Self::NotFound { .. } => 404,
            Self::DuplicateKey { .. } => 409,
            Self::Storage(_) => 500,
        }
    }
}
