//! Records and outcomes for the access grant store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{FileId, GrantId, PendingUploadId, StorageProvider};

/// A finalized upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    /// Reference into the blob store. Unique across files.
    pub storage_id: String,
    pub provider: StorageProvider,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A bounded authorization to download one stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadGrant {
    pub id: GrantId,
    pub storage_id: String,
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` means unlimited.
    pub max_uses: Option<u32>,
    pub use_count: u32,
    pub created_at: DateTime<Utc>,
}

impl DownloadGrant {
    /// Why this grant cannot be redeemed at `now`, if it cannot.
    ///
    /// Expiry wins over exhaustion.
    pub fn denial_at(&self, now: DateTime<Utc>) -> Option<DenialReason> {
        if self.expires_at.is_some_and(|exp| now >= exp) {
            return Some(DenialReason::Expired);
        }
        if self.max_uses.is_some_and(|max| self.use_count >= max) {
            return Some(DenialReason::Exhausted);
        }
        None
    }

    /// Uses left, or `None` when unlimited.
    pub fn remaining_uses(&self) -> Option<u32> {
        self.max_uses
            .map(|max| max.saturating_sub(self.use_count))
    }

    /// Apply one redemption at `now`: check, then increment.
    ///
    /// An unlimited grant whose counter is saturated is treated as exhausted.
    /// Callers must hold the record exclusively for the whole call.
    pub(crate) fn redeem(&mut self, now: DateTime<Utc>) -> Redemption {
        if let Some(reason) = self.denial_at(now) {
            return Redemption::Denied(reason);
        }
        let Some(use_count) = self.use_count.checked_add(1) else {
            return Redemption::Denied(DenialReason::Exhausted);
        };
        self.use_count = use_count;
        Redemption::Allowed {
            use_count: self.use_count,
            remaining: self.remaining_uses(),
        }
    }
}

/// A reservation for an upload that has not been finalized yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpload {
    pub id: PendingUploadId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PendingUpload {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Why a redemption was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenialReason {
    Expired,
    Exhausted,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired => write!(f, "expired"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Outcome of redeeming a download grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Redemption {
    Allowed {
        use_count: u32,
        remaining: Option<u32>,
    },
    Denied(DenialReason),
}

impl Redemption {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Counts of records removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub pending_uploads: usize,
    pub files: usize,
    /// Access keys removed along with their files, plus keys whose storage
    /// id has no file record.
    pub access_keys: usize,
    pub grants: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.pending_uploads + self.files + self.access_keys + self.grants
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Expiry index key component. Stored expiries are truncated to whole
/// milliseconds, so comparing millis agrees with comparing timestamps.
pub(crate) fn expiry_millis(at: &DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Drop sub-millisecond precision from a timestamp.
pub(crate) fn truncate_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn grant(expires_at: Option<DateTime<Utc>>, max_uses: Option<u32>) -> DownloadGrant {
        DownloadGrant {
            id: GrantId::new(),
            storage_id: "blob".into(),
            expires_at,
            max_uses,
            use_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unlimited_grant_allows_repeated_use() {
        let now = Utc::now();
        let mut g = grant(None, None);
        for _ in 0..1000 {
            assert!(g.redeem(now).is_allowed());
        }
        assert_eq!(g.use_count, 1000);
        assert_eq!(g.remaining_uses(), None);
    }

    #[test]
    fn test_saturated_unlimited_grant_is_exhausted() {
        let now = Utc::now();
        let mut g = grant(None, None);
        g.use_count = u32::MAX - 1;
        assert_eq!(
            g.redeem(now),
            Redemption::Allowed {
                use_count: u32::MAX,
                remaining: None,
            }
        );
        assert_eq!(g.redeem(now), Redemption::Denied(DenialReason::Exhausted));
        assert_eq!(g.use_count, u32::MAX);
    }

    #[test]
    fn test_expiry_checked_before_exhaustion() {
        let now = Utc::now();
        let mut g = grant(Some(now), Some(1));
        g.use_count = 1;
        assert_eq!(g.denial_at(now), Some(DenialReason::Expired));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let g = grant(Some(now + Duration::seconds(1)), None);
        assert_eq!(g.denial_at(now), None);
        assert_eq!(
            g.denial_at(now + Duration::seconds(1)),
            Some(DenialReason::Expired)
        );
    }

    #[test]
    fn test_denied_redemption_does_not_count() {
        let now = Utc::now();
        let mut g = grant(None, Some(1));
        assert!(g.redeem(now).is_allowed());
        assert_eq!(g.redeem(now), Redemption::Denied(DenialReason::Exhausted));
        assert_eq!(g.use_count, 1);
    }

    #[test]
    fn test_redemption_json() {
        let allowed = Redemption::Allowed {
            use_count: 2,
            remaining: Some(1),
        };
        let json = serde_json::to_value(allowed).unwrap();
        assert_eq!(json["allowed"]["use_count"], 2);

        let denied = Redemption::Denied(DenialReason::Exhausted);
        let json = serde_json::to_value(denied).unwrap();
        assert_eq!(json["denied"], "exhausted");
    }

    #[test]
    fn test_truncate_millis() {
        let at = DateTime::from_timestamp(10, 500_999_999).unwrap();
        let truncated = truncate_millis(at);
        assert_eq!(truncated.timestamp_subsec_nanos(), 500_000_000);
        assert_eq!(expiry_millis(&truncated), 10_500);
    }
}
