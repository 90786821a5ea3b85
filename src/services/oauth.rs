// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth authorization-code flow with single-use state tokens and PKCE.

use crate::error::AppError;
use crate::services::google_oauth::OAuthProvider;
use crate::store::CredentialStore;
use anyhow::anyhow;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Random bytes behind each state token and PKCE verifier.
const RANDOM_BYTES: usize = 32;

/// Authorization request waiting for its callback.
struct PendingAuthorization {
    user_id: String,
    code_verifier: String,
    created_at: Instant,
}

/// Starts and completes the authorization-code flow.
pub struct OAuthFlow {
    provider: Arc<dyn OAuthProvider>,
    store: Arc<dyn CredentialStore>,
    /// Pending requests keyed by state token.
    pending: DashMap<String, PendingAuthorization>,
    state_ttl: Duration,
    rng: SystemRandom,
}

impl OAuthFlow {
    pub fn new(
        provider: Arc<dyn OAuthProvider>,
        store: Arc<dyn CredentialStore>,
        state_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            pending: DashMap::new(),
            state_ttl,
            rng: SystemRandom::new(),
        }
    }

    /// Issue a state token for `user_id` and return the provider's consent URL.
    pub fn begin(&self, user_id: &str) -> Result<String, AppError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::Validation("user_id must not be empty".into()));
        }

        self.prune_expired();

        let state = self.random_token()?;
        let code_verifier = self.random_token()?;
        let code_challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()));

        let url = self.provider.authorization_url(&state, &code_challenge);
        self.pending.insert(
            state,
            PendingAuthorization {
                user_id: user_id.to_string(),
                code_verifier,
                created_at: Instant::now(),
            },
        );

        tracing::info!(user_id, "Starting OAuth flow");
        Ok(url)
    }

    /// Redeem `state`, exchange `code` for tokens and store them.
    ///
    /// Returns the user ID the state was issued for. The state is consumed
    /// whether or not the exchange succeeds.
    pub async fn complete(&self, code: &str, state: &str) -> Result<String, AppError> {
        let pending = self.take_pending(state)?;

        let grant = self
            .provider
            .exchange_code(code, &pending.code_verifier)
            .await
            .map_err(|e| match e {
                AppError::TokenExchange(_) => e,
                other => AppError::TokenExchange(other.to_string()),
            })?;

        let credential = grant.into_credential(Utc::now(), None, &[])?;
        if credential.refresh_token.is_none() {
            tracing::warn!(
                user_id = %pending.user_id,
                "Provider returned no refresh token; user must reconnect when it expires"
            );
        }
        self.store.put(&pending.user_id, credential);

        tracing::info!(user_id = %pending.user_id, "OAuth completed, credential stored");
        Ok(pending.user_id)
    }

    /// The provider redirected back with an error instead of a code.
    ///
    /// Consumes `state` and returns the error to surface to the caller.
    pub fn reject(&self, state: &str, reason: &str) -> AppError {
        match self.take_pending(state) {
            Ok(pending) => {
                tracing::warn!(user_id = %pending.user_id, reason, "Authorization denied by provider");
                AppError::TokenExchange(format!("authorization denied: {}", reason))
            }
            Err(e) => e,
        }
    }

    /// Number of outstanding authorization requests.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn take_pending(&self, state: &str) -> Result<PendingAuthorization, AppError> {
        let (_, pending) = self.pending.remove(state).ok_or_else(|| {
            tracing::warn!("OAuth callback with unknown or already used state");
            AppError::InvalidState
        })?;

        if pending.created_at.elapsed() > self.state_ttl {
            tracing::warn!(user_id = %pending.user_id, "OAuth callback with expired state");
            return Err(AppError::InvalidState);
        }
        Ok(pending)
    }

    fn prune_expired(&self) {
        let ttl = self.state_ttl;
        self.pending.retain(|_, p| p.created_at.elapsed() <= ttl);
    }

    fn random_token(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; RANDOM_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow!("system RNG failure")))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}
