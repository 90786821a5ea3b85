// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token refresh tests.
//!
//! Verifies lazy refresh, single-flight refresh under concurrency, and that
//! dead refresh tokens disconnect the user.

use calendar_agent::error::AppError;
use calendar_agent::services::CredentialService;
use calendar_agent::store::{CredentialStore, MemoryCredentialStore};
use std::sync::Arc;

mod common;

use common::{expired_credential, fresh_credential, FakeOAuthProvider};

fn service(
    provider: FakeOAuthProvider,
) -> (
    Arc<CredentialService>,
    Arc<MemoryCredentialStore>,
    Arc<FakeOAuthProvider>,
) {
    let store = Arc::new(MemoryCredentialStore::new());
    let provider = Arc::new(provider);
    let service = Arc::new(CredentialService::new(store.clone(), provider.clone()));
    (service, store, provider)
}

#[tokio::test]
async fn test_fresh_token_is_returned_without_refresh() {
    let (service, store, provider) = service(FakeOAuthProvider::default());
    store.put("u1", fresh_credential("current"));

    let token = service.valid_access_token("u1").await.unwrap();

    assert_eq!(token, "current");
    assert_eq!(provider.refreshes(), 0);
}

#[tokio::test]
async fn test_unknown_user_is_not_authenticated() {
    let (service, _, provider) = service(FakeOAuthProvider::default());

    let result = service.valid_access_token("nobody").await;

    assert!(matches!(result, Err(AppError::NotAuthenticated)));
    assert_eq!(provider.refreshes(), 0);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_stored() {
    let (service, store, provider) = service(FakeOAuthProvider::default());
    store.put("u1", expired_credential(Some("rt-1")));

    let token = service.valid_access_token("u1").await.unwrap();

    assert_eq!(token, "refreshed-1");
    assert_eq!(provider.refreshes(), 1);

    let stored = store.get("u1").unwrap();
    assert_eq!(stored.access_token, "refreshed-1");
    // Google omits the refresh token on refresh; the old one is kept
    assert_eq!(stored.refresh_token.as_deref(), Some("rt-1"));
    assert!(!stored.scopes.is_empty());

    // Second call uses the stored token
    let again = service.valid_access_token("u1").await.unwrap();
    assert_eq!(again, "refreshed-1");
    assert_eq!(provider.refreshes(), 1);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_refresh() {
    let (service, store, provider) = service(FakeOAuthProvider::with_refresh_delay(50));
    store.put("u1", expired_credential(Some("rt-1")));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.valid_access_token("u1").await
        }));
    }

    for handle in handles {
        let token = handle.await.unwrap().unwrap();
        assert_eq!(token, "refreshed-1");
    }
    assert_eq!(provider.refreshes(), 1);
}

#[tokio::test]
async fn test_invalid_grant_disconnects_user() {
    let provider = FakeOAuthProvider::default();
    provider.fail_refresh("invalid_grant: Token has been expired or revoked.");
    let (service, store, provider) = service(provider);
    store.put("u1", expired_credential(Some("revoked")));

    let result = service.valid_access_token("u1").await;

    assert!(matches!(result, Err(AppError::NotAuthenticated)));
    assert!(!store.contains("u1"));
    assert_eq!(provider.refreshes(), 1);
}

#[tokio::test]
async fn test_missing_refresh_token_disconnects_user() {
    let (service, store, provider) = service(FakeOAuthProvider::default());
    store.put("u1", expired_credential(None));

    let result = service.valid_access_token("u1").await;

    assert!(matches!(result, Err(AppError::NotAuthenticated)));
    assert!(!store.contains("u1"));
    assert_eq!(provider.refreshes(), 0);
}

#[tokio::test]
async fn test_transient_refresh_failure_keeps_credential() {
    let provider = FakeOAuthProvider::default();
    provider.fail_refresh("temporarily_unavailable: try again");
    let (service, store, _) = service(provider);
    store.put("u1", expired_credential(Some("rt-1")));

    let result = service.valid_access_token("u1").await;

    assert!(matches!(result, Err(AppError::TokenExchange(_))));
    assert!(store.contains("u1"));
}

#[tokio::test]
async fn test_forget_removes_credential() {
    let (service, store, _) = service(FakeOAuthProvider::default());
    store.put("u1", fresh_credential("current"));
    assert!(service.is_connected("u1"));

    service.forget("u1");

    assert!(!service.is_connected("u1"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unrepresentable_refresh_lifetime_keeps_credential() {
    let provider = FakeOAuthProvider::default();
    provider.set_expires_in(i64::MIN);
    let (service, store, _) = service(provider);
    store.put("u1", expired_credential(Some("rt-1")));

    let result = service.valid_access_token("u1").await;

    assert!(matches!(result, Err(AppError::TokenExchange(_))));
    assert_eq!(store.get("u1").unwrap().access_token, "stale-access");
}
