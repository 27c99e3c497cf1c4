//! Property-based tests for grant store invariants.
//!
//! # Tested Invariants
//!
//! - A grant with `max_uses = N` allows at most N redemptions
//! - Redemption at or after expiry is always denied as expired
//! - A sweep removes exactly the records with expiry `<= now`
//! - Sweeping twice with the same `now` removes nothing the second time

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use std::collections::BTreeSet;

use super::{DenialReason, FinalizeOptions, GrantStore, Redemption};

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

// ============================================================================
// Test Strategies - Input Generation
// ============================================================================

/// Strategy for generating valid `max_uses` values.
fn max_uses_strategy() -> impl Strategy<Value = u32> {
    1u32..50
}

/// Strategy for generating expiry offsets (seconds after the epoch base).
fn expiry_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1i64..1000, 0..40)
}

proptest! {
    #[test]
    fn prop_at_most_max_uses_allowed(max_uses in max_uses_strategy(), attempts in 0u32..100) {
        let (allowed, last) = block_on(async {
            let store = GrantStore::memory();
            let grant = store
                .create_download_grant_at("blob", None, Some(max_uses), at(0))
                .await
                .unwrap();

            let mut allowed = 0u32;
            let mut last = None;
            for _ in 0..attempts {
                let outcome = store.redeem_grant_at(grant, at(1)).await.unwrap();
                if outcome.is_allowed() {
                    allowed += 1;
                }
                last = Some(outcome);
            }
            (allowed, last)
        });

        prop_assert_eq!(allowed, attempts.min(max_uses));
        if attempts > max_uses {
            prop_assert_eq!(last, Some(Redemption::Denied(DenialReason::Exhausted)));
        }
    }

    #[test]
    fn prop_expired_grant_always_denied(
        expiry in 1i64..1000,
        late_by in 0i64..1000,
        max_uses in prop::option::of(max_uses_strategy()),
    ) {
        let outcome = block_on(async {
            let store = GrantStore::memory();
            let grant = store
                .create_download_grant_at("blob", Some(at(expiry)), max_uses, at(0))
                .await
                .unwrap();
            store.redeem_grant_at(grant, at(expiry + late_by)).await.unwrap()
        });

        prop_assert_eq!(outcome, Redemption::Denied(DenialReason::Expired));
    }

    #[test]
    fn prop_sweep_removes_exactly_expired(
        grant_expiries in expiry_strategy(),
        file_expiries in expiry_strategy(),
        now in 0i64..1000,
    ) {
        let (first, second, surviving_grants, surviving_files) = block_on(async {
            let store = GrantStore::memory();

            let mut grants = Vec::new();
            for exp in &grant_expiries {
                let id = store
                    .create_download_grant_at("blob", Some(at(*exp)), None, at(0))
                    .await
                    .unwrap();
                grants.push(id);
            }
            for (i, exp) in file_expiries.iter().enumerate() {
                let ticket = store.create_pending_upload_at(at(2000), at(0)).await.unwrap();
                store
                    .finalize_upload_at(
                        ticket,
                        &format!("file-{i}"),
                        FinalizeOptions { expires_at: Some(at(*exp)), ..Default::default() },
                        at(0),
                    )
                    .await
                    .unwrap();
            }

            let first = store.sweep_expired(at(now)).await.unwrap();
            let second = store.sweep_expired(at(now)).await.unwrap();

            let mut surviving_grants = 0;
            for id in grants {
                if store.get_grant(id).await.is_ok() {
                    surviving_grants += 1;
                }
            }
            let surviving_files: BTreeSet<String> = store
                .list_files()
                .await
                .unwrap()
                .into_iter()
                .map(|f| f.storage_id)
                .collect();
            (first, second, surviving_grants, surviving_files)
        });

        let expired_grants = grant_expiries.iter().filter(|exp| **exp <= now).count();
        let expected_files: BTreeSet<String> = file_expiries
            .iter()
            .enumerate()
            .filter(|(_, exp)| **exp > now)
            .map(|(i, _)| format!("file-{i}"))
            .collect();

        prop_assert_eq!(first.grants, expired_grants);
        prop_assert_eq!(surviving_grants, grant_expiries.len() - expired_grants);
        prop_assert_eq!(first.files, file_expiries.len() - expected_files.len());
        prop_assert_eq!(surviving_files, expected_files);
        prop_assert!(second.is_empty());
    }
}
