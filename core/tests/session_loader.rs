mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{init_tracing, FakeKvStore, FakeSecureStore, Probe};
use storefront_core::api::{
    AuthState, CartItemRef, SecureStoreError, SessionConfig, SessionLoader, SnapshotSource,
};

const TOKEN_SERVICE: &str = "com.ecom:userToken";

fn loader(secure: Arc<FakeSecureStore>, plain: Arc<FakeKvStore>) -> SessionLoader {
    SessionLoader::new(secure, plain, SessionConfig::default())
}

fn seeded_plain(plain: &FakeKvStore) {
    plain.insert("theme", json!("dark"));
    plain.insert("notificationsEnabled", json!(true));
    plain.insert(
        "cartItems",
        json!([{ "productId": "7", "quantity": 2 }, { "productId": 12 }]),
    );
}

#[tokio::test]
async fn merges_both_stores() {
    init_tracing();
    let secure = Arc::new(FakeSecureStore::default());
    secure.insert(TOKEN_SERVICE, "user-42", "tok-abc");
    let plain = Arc::new(FakeKvStore::default());
    seeded_plain(&plain);

    let snap = loader(secure, plain).load_initial_data().await.unwrap();

    assert_eq!(snap.source(), SnapshotSource::Combined);
    assert_eq!(snap.auth_token(), Some("tok-abc"));
    assert_eq!(snap.user_id(), Some("user-42"));
    assert_eq!(snap.theme(), Some("dark"));
    assert_eq!(snap.notifications_enabled(), Some(true));
    assert_eq!(
        snap.cart_items(),
        Some(&[CartItemRef::new("7", 2), CartItemRef::new("12", 1)][..])
    );
}

#[tokio::test]
async fn secure_and_plain_reads_are_in_flight_together() {
    let probe = Probe::default();
    let secure = Arc::new(FakeSecureStore::with_probe(probe.clone()));
    let plain = Arc::new(FakeKvStore::with_probe(probe.clone()));

    loader(secure, plain).load_initial_data().await.unwrap();

    let first_end = probe
        .entries()
        .iter()
        .position(|e| e.starts_with("end:"))
        .unwrap();
    assert!(probe.position("start:secure") < first_end);
    assert!(probe.position("start:theme") < first_end);
    assert!(probe.position("start:notificationsEnabled") < first_end);
    assert!(probe.position("start:cartItems") < first_end);
}

#[tokio::test]
async fn access_denied_propagates_and_fallback_keeps_plain_fields() {
    let secure = Arc::new(FakeSecureStore::default());
    secure.insert(TOKEN_SERVICE, "user-42", "tok-abc");
    secure.fail_with(SecureStoreError::AccessDenied("device passcode reset".into()));
    let plain = Arc::new(FakeKvStore::default());
    seeded_plain(&plain);
    plain.fail_key("notificationsEnabled");
    let loader = loader(secure, plain);

    let err = loader.load_initial_data().await.unwrap_err();
    assert_eq!(err.reason, "device passcode reset");

    let snap = loader.get_fallback_snapshot().await;
    assert!(snap.is_fallback());
    assert_eq!(snap.auth_token(), None);
    assert_eq!(snap.user_id(), None);
    assert_eq!(snap.theme(), Some("dark"));
    assert_eq!(snap.notifications_enabled(), None);
    assert_eq!(snap.cart_items().map(<[_]>::len), Some(2));
}

#[tokio::test]
async fn failed_plain_key_degrades_only_that_field() {
    let secure = Arc::new(FakeSecureStore::default());
    secure.insert(TOKEN_SERVICE, "user-42", "tok-abc");
    let plain = Arc::new(FakeKvStore::default());
    seeded_plain(&plain);
    plain.fail_key("theme");

    let snap = loader(secure, plain).load_initial_data().await.unwrap();

    assert_eq!(snap.theme(), None);
    assert_eq!(snap.auth_token(), Some("tok-abc"));
    assert_eq!(snap.user_id(), Some("user-42"));
    assert_eq!(snap.notifications_enabled(), Some(true));
}

#[tokio::test]
async fn generic_secure_failure_degrades_silently() {
    let secure = Arc::new(FakeSecureStore::default());
    secure.insert(TOKEN_SERVICE, "user-42", "tok-abc");
    secure.fail_with(SecureStoreError::Backend("keychain busy".into()));
    let plain = Arc::new(FakeKvStore::default());
    seeded_plain(&plain);

    let snap = loader(secure, plain).load_initial_data().await.unwrap();

    assert_eq!(snap.source(), SnapshotSource::Combined);
    assert_eq!(snap.auth_token(), None);
    assert_eq!(snap.user_id(), None);
    assert_eq!(snap.theme(), Some("dark"));
}

#[tokio::test]
async fn malformed_plain_value_is_treated_as_absent() {
    let secure = Arc::new(FakeSecureStore::default());
    let plain = Arc::new(FakeKvStore::default());
    plain.insert("theme", json!(42));
    plain.insert("cartItems", json!({ "not": "a list" }));

    let snap = loader(secure, plain).load_initial_data().await.unwrap();

    assert_eq!(snap.theme(), None);
    assert_eq!(snap.cart_items(), None);
}

#[tokio::test]
async fn bootstrap_reports_auth_state() {
    let secure = Arc::new(FakeSecureStore::default());
    let plain = Arc::new(FakeKvStore::default());
    let loader = loader(secure.clone(), plain);

    assert_eq!(loader.bootstrap().await.auth, AuthState::Guest);

    loader.save_credentials("user-42", "tok-abc").await.unwrap();
    assert_eq!(
        loader.bootstrap().await.auth,
        AuthState::Authenticated {
            user_id: "user-42".into()
        }
    );

    secure.fail_with(SecureStoreError::AccessDenied("biometry changed".into()));
    let outcome = loader.bootstrap().await;
    assert_eq!(
        outcome.auth,
        AuthState::ReauthRequired {
            reason: "biometry changed".into()
        }
    );
    assert!(outcome.snapshot.is_fallback());
}

#[tokio::test]
async fn quota_exceeded_surfaces_to_the_writer() {
    let secure = Arc::new(FakeSecureStore::default());
    let plain = Arc::new(FakeKvStore::with_quota(64));
    let loader = loader(secure, plain.clone());

    loader.save_theme("light").await.unwrap();

    let many: Vec<CartItemRef> = (0..20).map(|i| CartItemRef::new(i.to_string(), 1)).collect();
    let err = loader.save_cart(&many).await.unwrap_err();
    assert!(err.is_quota_exceeded());
    assert_eq!(plain.value("cartItems"), None);
    assert_eq!(plain.value("theme"), Some(json!("light")));
}

#[tokio::test]
async fn write_helpers_round_trip_through_the_loader() {
    let secure = Arc::new(FakeSecureStore::default());
    let plain = Arc::new(FakeKvStore::default());
    let loader = loader(secure.clone(), plain.clone());

    loader.save_credentials("u-1", "t-1").await.unwrap();
    loader.save_notifications_enabled(false).await.unwrap();
    loader.save_cart(&[CartItemRef::new("3", 1)]).await.unwrap();

    let snap = loader.load_initial_data().await.unwrap();
    assert_eq!(snap.user_id(), Some("u-1"));
    assert_eq!(snap.notifications_enabled(), Some(false));

    assert!(loader.clear_credentials().await.unwrap());
    assert!(!loader.clear_credentials().await.unwrap());
    loader.clear_preferences().await.unwrap();

    let snap = loader.load_initial_data().await.unwrap();
    assert!(!snap.has_credentials());
    assert_eq!(snap.cart_items(), None);
    assert_eq!(snap.notifications_enabled(), None);
}

#[tokio::test]
async fn access_denied_on_write_maps_to_session_error() {
    let secure = Arc::new(FakeSecureStore::default());
    secure.fail_with(SecureStoreError::AccessDenied("locked".into()));
    let plain = Arc::new(FakeKvStore::default());

    let err = loader(secure, plain)
        .save_credentials("u", "t")
        .await
        .unwrap_err();
    assert!(err.is_access_denied());
}
