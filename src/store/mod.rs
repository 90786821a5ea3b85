// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential storage.
//!
//! Services receive the store as an `Arc<dyn CredentialStore>` so tests can
//! hand in their own instance instead of sharing process-wide state.

pub mod memory;

pub use memory::MemoryCredentialStore;

use crate::error::AppError;
use crate::models::OAuthCredential;

/// Mapping of user ID to OAuth credential.
pub trait CredentialStore: Send + Sync {
    /// Return the stored credential or `AppError::NotAuthenticated`.
    fn get(&self, user_id: &str) -> Result<OAuthCredential, AppError>;

    /// Store a credential, replacing any previous one (last write wins).
    fn put(&self, user_id: &str, credential: OAuthCredential);

    /// Forget a user's credential. Returns whether one was present.
    fn remove(&self, user_id: &str) -> bool;

    fn contains(&self, user_id: &str) -> bool {
        self.get(user_id).is_ok()
    }
}
