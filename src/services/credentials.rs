// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token lifecycle: hand out a valid token, refreshing on demand.

use crate::error::AppError;
use crate::services::google_oauth::OAuthProvider;
use crate::store::CredentialStore;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Margin before token expiration when we proactively refresh (1 minute).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Per-user refresh locks.
pub type RefreshLocks = DashMap<String, Arc<Mutex<()>>>;

/// Resolves credentials for calendar calls.
///
/// Refresh happens lazily when a caller needs a token. A per-user lock makes
/// concurrent callers share a single refresh.
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    provider: Arc<dyn OAuthProvider>,
    refresh_locks: RefreshLocks,
}

impl CredentialService {
    pub fn new(store: Arc<dyn CredentialStore>, provider: Arc<dyn OAuthProvider>) -> Self {
        Self {
            store,
            provider,
            refresh_locks: DashMap::new(),
        }
    }

    /// Whether the user has completed the OAuth flow.
    pub fn is_connected(&self, user_id: &str) -> bool {
        self.store.contains(user_id)
    }

    /// Drop a credential the provider no longer accepts.
    pub fn forget(&self, user_id: &str) {
        if self.store.remove(user_id) {
            tracing::info!(user_id, "Credential removed");
        }
    }

    /// Get a valid (non-expired) access token for the given user.
    pub async fn valid_access_token(&self, user_id: &str) -> Result<String, AppError> {
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);

        // Fast path
        let credential = self.store.get(user_id)?;
        if !credential.expires_within(Utc::now(), margin) {
            return Ok(credential.access_token);
        }

        let lock = self
            .refresh_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another task may have refreshed while we were waiting.
        let credential = self.store.get(user_id)?;
        let now = Utc::now();
        if !credential.expires_within(now, margin) {
            return Ok(credential.access_token);
        }

        let Some(refresh_token) = credential.refresh_token.clone() else {
            tracing::info!(user_id, "Access token expired and no refresh token available");
            self.forget(user_id);
            return Err(AppError::NotAuthenticated);
        };

        tracing::info!(user_id, "Access token expired, refreshing");
        let grant = match self.provider.refresh(&refresh_token).await {
            Ok(grant) => grant,
            Err(e) if e.is_invalid_grant() => {
                tracing::warn!(user_id, "Refresh token rejected, user must reconnect");
                self.forget(user_id);
                return Err(AppError::NotAuthenticated);
            }
            Err(e) => return Err(e),
        };

        let refreshed = grant.into_credential(now, Some(refresh_token), &credential.scopes)?;
        let access_token = refreshed.access_token.clone();
        self.store.put(user_id, refreshed);

        tracing::info!(user_id, "Token refreshed");
        Ok(access_token)
    }
}
