// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth credential held for a connected user.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Google OAuth tokens for one user. Kept in memory only.
#[derive(Clone, PartialEq)]
pub struct OAuthCredential {
    /// Bearer token for Calendar API calls
    pub access_token: String,
    /// Long-lived token used to mint new access tokens
    pub refresh_token: Option<String>,
    /// When the access token stops being accepted
    pub expires_at: DateTime<Utc>,
    /// Granted OAuth scopes
    pub scopes: Vec<String>,
}

impl OAuthCredential {
    /// True if the access token is expired or will expire within `margin`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin >= self.expires_at
    }
}

// Tokens must never end up in logs.
impl fmt::Debug for OAuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredential")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}
