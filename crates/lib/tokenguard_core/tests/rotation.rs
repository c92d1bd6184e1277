//! Rotation properties of `TokenManager` against the in-memory store.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use tokenguard_core::auth::notify::{NotifyError, OriginMismatch, SecurityNotifier};
use tokenguard_core::store::{CredentialStore, MemoryCredentialStore, StoreError};
use tokenguard_core::{TokenConfig, TokenError, TokenManager};
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Alerts are delivered from a background task, so they arrive on a channel.
type Alerts = mpsc::UnboundedReceiver<OriginMismatch>;

/// Notifier that forwards every alert it receives.
struct RecordingNotifier {
    tx: mpsc::UnboundedSender<OriginMismatch>,
}

#[async_trait]
impl SecurityNotifier for RecordingNotifier {
    async fn origin_mismatch(&self, alert: &OriginMismatch) -> Result<(), NotifyError> {
        self.tx
            .send(alert.clone())
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}

/// Notifier whose delivery never completes.
struct HangingNotifier;

#[async_trait]
impl SecurityNotifier for HangingNotifier {
    async fn origin_mismatch(&self, _alert: &OriginMismatch) -> Result<(), NotifyError> {
        std::future::pending().await
    }
}

/// Notifier whose delivery always fails.
struct BrokenNotifier;

#[async_trait]
impl SecurityNotifier for BrokenNotifier {
    async fn origin_mismatch(&self, _alert: &OriginMismatch) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("smtp down".into()))
    }
}

fn config() -> TokenConfig {
    TokenConfig::new("test-secret", "15m", "168h")
        .unwrap()
        .with_hash_cost(4)
        .unwrap()
}

async fn enrolled_manager() -> (TokenManager<MemoryCredentialStore>, Alerts) {
    let (tx, alerts) = mpsc::unbounded_channel();
    let manager = TokenManager::new(&config(), MemoryCredentialStore::new())
        .with_notifier(Arc::new(RecordingNotifier { tx }));
    manager.enroll("u1", "a@b.com", "1.1.1.1").await.unwrap();
    (manager, alerts)
}

/// True when no further alert shows up within a short grace period.
async fn no_more_alerts(alerts: &mut Alerts) -> bool {
    timeout(StdDuration::from_millis(200), alerts.recv())
        .await
        .is_err()
}

/// Flip one character in the middle of the signature segment.
fn tamper_signature(token: &str) -> String {
    let sig_start = token.rfind('.').unwrap() + 1;
    let idx = sig_start + (token.len() - sig_start) / 2;
    let mut bytes = token.as_bytes().to_vec();
    bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
    String::from_utf8(bytes).unwrap()
}

#[tokio::test]
async fn issue_then_refresh_rotates_refresh_token() {
    let (manager, mut alerts) = enrolled_manager().await;

    let first = manager.issue("u1", "1.1.1.1").await.unwrap();
    let second = manager.refresh(&first.refresh_token, "1.1.1.1").await.unwrap();

    assert_ne!(first.refresh_token, second.refresh_token);
    assert_ne!(first.access_token, second.access_token);
    assert!(no_more_alerts(&mut alerts).await);

    let claims = manager.codec().verify(&second.access_token).unwrap();
    assert_eq!(claims.sub, "u1");
    assert_eq!(claims.origin, "1.1.1.1");
}

#[tokio::test]
async fn concrete_scenario_rejects_reuse_after_rotation() {
    let (manager, _) = enrolled_manager().await;

    let p1 = manager.issue("u1", "1.1.1.1").await.unwrap();
    let p2 = manager.refresh(&p1.refresh_token, "1.1.1.1").await.unwrap();
    assert_ne!(p2.refresh_token, p1.refresh_token);

    let reuse = manager.refresh(&p1.refresh_token, "1.1.1.1").await;
    assert!(matches!(reuse, Err(TokenError::UnknownCredential)));

    // The legitimate holder can keep rotating.
    let p3 = manager.refresh(&p2.refresh_token, "1.1.1.1").await.unwrap();
    assert_ne!(p3.refresh_token, p2.refresh_token);
}

#[tokio::test]
async fn issue_invalidates_previous_refresh_token() {
    let (manager, _) = enrolled_manager().await;

    let p1 = manager.issue("u1", "1.1.1.1").await.unwrap();
    let _p2 = manager.issue("u1", "1.1.1.1").await.unwrap();

    let stale = manager.refresh(&p1.refresh_token, "1.1.1.1").await;
    assert!(matches!(stale, Err(TokenError::UnknownCredential)));
}

#[tokio::test]
async fn enrollment_pair_is_redeemable() {
    let manager = TokenManager::new(&config(), MemoryCredentialStore::new());
    let enrolled = manager.enroll("u2", "c@d.com", "2.2.2.2").await.unwrap();

    let rotated = manager.refresh(&enrolled.refresh_token, "2.2.2.2").await.unwrap();
    assert_ne!(rotated.refresh_token, enrolled.refresh_token);
}

#[tokio::test]
async fn tampered_signature_is_invalid() {
    let (manager, _) = enrolled_manager().await;
    let pair = manager.issue("u1", "1.1.1.1").await.unwrap();

    let result = manager
        .refresh(&tamper_signature(&pair.refresh_token), "1.1.1.1")
        .await;
    assert!(matches!(result, Err(TokenError::InvalidToken(_))));

    // The untampered token is still live.
    assert!(manager.refresh(&pair.refresh_token, "1.1.1.1").await.is_ok());
}

#[tokio::test]
async fn expired_refresh_token_is_invalid() {
    let store = MemoryCredentialStore::new();
    let mut expired = config();
    expired.refresh_ttl = Duration::seconds(-1);

    let manager = TokenManager::new(&expired, store);
    let pair = manager.enroll("u1", "a@b.com", "1.1.1.1").await.unwrap();

    let result = manager.refresh(&pair.refresh_token, "1.1.1.1").await;
    assert!(matches!(result, Err(TokenError::InvalidToken(_))));
}

#[tokio::test]
async fn zero_ttl_refresh_token_is_invalid() {
    let mut zero = config();
    zero.refresh_ttl = Duration::zero();

    let manager = TokenManager::new(&zero, MemoryCredentialStore::new());
    let pair = manager.enroll("u1", "a@b.com", "1.1.1.1").await.unwrap();

    let result = manager.refresh(&pair.refresh_token, "1.1.1.1").await;
    assert!(matches!(result, Err(TokenError::InvalidToken(_))));
}

#[tokio::test]
async fn origin_mismatch_notifies_once_and_still_rotates() {
    let (manager, mut alerts) = enrolled_manager().await;
    let pair = manager.issue("u1", "1.1.1.1").await.unwrap();

    let rotated = manager.refresh(&pair.refresh_token, "9.9.9.9").await.unwrap();

    let alert = timeout(StdDuration::from_secs(5), alerts.recv())
        .await
        .expect("alert delivered")
        .expect("channel open");
    assert!(no_more_alerts(&mut alerts).await);
    assert_eq!(
        alert,
        OriginMismatch {
            guid: "u1".into(),
            email: Some("a@b.com".into()),
            issued_origin: "1.1.1.1".into(),
            presented_origin: "9.9.9.9".into(),
        }
    );

    // The new pair is bound to the caller's current origin.
    let claims = manager.codec().verify(&rotated.refresh_token).unwrap();
    assert_eq!(claims.origin, "9.9.9.9");
}

#[tokio::test]
async fn notifier_failure_does_not_block_rotation() {
    let manager = TokenManager::new(&config(), MemoryCredentialStore::new())
        .with_notifier(Arc::new(BrokenNotifier));
    manager.enroll("u1", "a@b.com", "1.1.1.1").await.unwrap();
    let pair = manager.issue("u1", "1.1.1.1").await.unwrap();

    assert!(manager.refresh(&pair.refresh_token, "8.8.8.8").await.is_ok());
}

#[tokio::test]
async fn hanging_notifier_does_not_delay_rotation() {
    let manager = TokenManager::new(&config(), MemoryCredentialStore::new())
        .with_notifier(Arc::new(HangingNotifier));
    manager.enroll("u1", "a@b.com", "1.1.1.1").await.unwrap();
    let pair = manager.issue("u1", "1.1.1.1").await.unwrap();

    let rotated = timeout(
        StdDuration::from_secs(2),
        manager.refresh(&pair.refresh_token, "9.9.9.9"),
    )
    .await
    .expect("refresh must not wait for the notifier");
    assert!(rotated.is_ok());
}

#[tokio::test]
async fn issue_for_unknown_guid_fails_without_side_effects() {
    let (manager, _) = enrolled_manager().await;
    let before = manager.store().get("u1").await.unwrap();

    let result = manager.issue("ghost", "1.1.1.1").await;

    assert!(matches!(
        result,
        Err(TokenError::Store(StoreError::NotEnrolled(_)))
    ));
    assert!(manager.store().get("ghost").await.is_none());
    assert_eq!(manager.store().get("u1").await.unwrap(), before);
}

#[tokio::test]
async fn duplicate_enrollment_is_a_store_error() {
    let (manager, _) = enrolled_manager().await;
    let result = manager.enroll("u1", "other@b.com", "1.1.1.1").await;
    assert!(matches!(
        result,
        Err(TokenError::Store(StoreError::Duplicate(_)))
    ));
}

#[tokio::test]
async fn forged_token_with_valid_signature_is_unknown() {
    let (manager, _) = enrolled_manager().await;
    // Signed with the right secret but never persisted.
    let forged = manager.codec().issue("u1", "1.1.1.1").unwrap();

    let result = manager.refresh(&forged.refresh_token, "1.1.1.1").await;
    assert!(matches!(result, Err(TokenError::UnknownCredential)));
}

#[tokio::test]
async fn concurrent_refreshes_of_one_token_yield_one_winner() {
    let (manager, _) = enrolled_manager().await;
    let manager = Arc::new(manager);
    let pair = manager.issue("u1", "1.1.1.1").await.unwrap();

    let a = tokio::spawn({
        let manager = Arc::clone(&manager);
        let token = pair.refresh_token.clone();
        async move { manager.refresh(&token, "1.1.1.1").await }
    });
    let b = tokio::spawn({
        let manager = Arc::clone(&manager);
        let token = pair.refresh_token.clone();
        async move { manager.refresh(&token, "1.1.1.1").await }
    });
    let results = [a.await.unwrap(), b.await.unwrap()];

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(
                    e,
                    TokenError::UnknownCredential | TokenError::Store(StoreError::Conflict(_))
                ),
                "unexpected loser error: {e}"
            );
        }
    }

    // Whichever pair won is the only live one.
    let live = results.into_iter().find_map(Result::ok).unwrap();
    let stored = manager.store().get("u1").await.unwrap();
    let resolved = manager
        .store()
        .lookup_guid_by_hash(&stored.refresh_hash)
        .await
        .unwrap();
    assert_eq!(resolved.as_deref(), Some("u1"));
    assert!(manager.refresh(&live.refresh_token, "1.1.1.1").await.is_ok());
}
