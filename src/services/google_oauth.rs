// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth 2.0 endpoints: authorization URL, code exchange, refresh.

use crate::config::Config;
use crate::error::AppError;
use crate::models::OAuthCredential;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Token material returned by the provider's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Only present on the first exchange (or when the provider rotates it)
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires
    pub expires_in: i64,
    /// Space separated granted scopes
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenGrant {
    /// Build a credential, keeping `previous_refresh` when the grant has none.
    ///
    /// Fails if `expires_in` does not yield a representable expiry instant.
    pub fn into_credential(
        self,
        now: DateTime<Utc>,
        previous_refresh: Option<String>,
        previous_scopes: &[String],
    ) -> Result<OAuthCredential, AppError> {
        let expires_at = Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AppError::TokenExchange(format!("invalid expires_in: {}", self.expires_in))
            })?;
        let scopes = match self.scope {
            Some(scope) => scope.split_whitespace().map(String::from).collect(),
            None => previous_scopes.to_vec(),
        };
        Ok(OAuthCredential {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at,
            scopes,
        })
    }
}

/// The three things the OAuth flow needs from an authorization server.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// URL the user is redirected to for consent.
    fn authorization_url(&self, state: &str, code_challenge: &str) -> String;

    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, code: &str, code_verifier: &str)
        -> Result<TokenGrant, AppError>;

    /// Mint a new access token from a refresh token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AppError>;
}

/// Error body from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    auth_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
}

impl GoogleOAuthClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("failed building OAuth HTTP client")?;

        Ok(Self {
            http,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.google_redirect_uri.clone(),
            scopes: config.google_scopes.clone(),
        })
    }

    /// Point the client at different endpoints (used against mock servers).
    pub fn with_endpoints(mut self, auth_url: &str, token_url: &str) -> Self {
        self.auth_url = auth_url.to_string();
        self.token_url = token_url.to_string();
        self
    }

    async fn post_token_form(&self, form: &[(&str, &str)]) -> Result<TokenGrant, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::TokenExchange(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<TokenErrorBody>(&body) {
                Ok(err) => match err.error_description {
                    Some(desc) => format!("{}: {}", err.error, desc),
                    None => err.error,
                },
                Err(_) => format!("HTTP {}", status),
            };
            tracing::warn!(status = %status, reason = %reason, "Google token endpoint rejected request");
            return Err(AppError::TokenExchange(reason));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::TokenExchange(format!("failed to parse token response: {}", e)))
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuthClient {
    fn authorization_url(&self, state: &str, code_challenge: &str) -> String {
        format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             state={}&\
             access_type=offline&\
             include_granted_scopes=true&\
             prompt=consent&\
             code_challenge={}&\
             code_challenge_method=S256",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.scopes.join(" ")),
            urlencoding::encode(state),
            urlencoding::encode(code_challenge),
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenGrant, AppError> {
        self.post_token_form(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AppError> {
        self.post_token_form(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }
}
