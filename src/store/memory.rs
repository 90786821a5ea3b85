// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory credential store. Contents are lost on restart.

use super::CredentialStore;
use crate::error::AppError;
use crate::models::OAuthCredential;
use dashmap::DashMap;

/// `DashMap`-backed store; writes for different users never contend.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credentials: DashMap<String, OAuthCredential>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, user_id: &str) -> Result<OAuthCredential, AppError> {
        self.credentials
            .get(user_id)
            .map(|entry| entry.value().clone())
            .ok_or(AppError::NotAuthenticated)
    }

    fn put(&self, user_id: &str, credential: OAuthCredential) {
        self.credentials.insert(user_id.to_string(), credential);
    }

    fn remove(&self, user_id: &str) -> bool {
        self.credentials.remove(user_id).is_some()
    }

    fn contains(&self, user_id: &str) -> bool {
        self.credentials.contains_key(user_id)
    }
}
