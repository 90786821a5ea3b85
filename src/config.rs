//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use std::env;
use std::time::Duration;

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Google OAuth ---
    /// OAuth client ID (public)
    pub google_client_id: String,
    /// OAuth client secret
    pub google_client_secret: String,
    /// Callback URL registered with Google (points at `/auth/callback`)
    pub google_redirect_uri: String,
    /// Scopes requested during authorization
    pub google_scopes: Vec<String>,
    /// How long an issued OAuth state stays redeemable
    pub oauth_state_ttl: Duration,

    // --- LLM ---
    /// API key for the chat-completions provider
    pub openai_api_key: String,
    /// Base URL of the chat-completions provider
    pub openai_api_base: String,
    /// Model name sent with every completion request
    pub openai_model: String,

    // --- Server ---
    /// Externally reachable base URL of this service
    pub public_url: String,
    /// Allowed CORS origins; empty allows any origin
    pub cors_allowed_origins: Vec<String>,
    /// Timeout applied to outbound HTTP calls
    pub http_timeout: Duration,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            google_client_id: required("GOOGLE_CLIENT_ID")?,
            google_client_secret: required("GOOGLE_CLIENT_SECRET")?,
            google_redirect_uri: required("GOOGLE_OAUTH_REDIRECT_URI")?,
            google_scopes: env::var("GOOGLE_OAUTH_SCOPES")
                .map(|v| v.split_whitespace().map(String::from).collect::<Vec<_>>())
                .ok()
                .filter(|scopes| !scopes.is_empty())
                .unwrap_or_else(|| vec![DEFAULT_CALENDAR_SCOPE.to_string()]),
            oauth_state_ttl: Duration::from_secs(parse_or("OAUTH_STATE_TTL_SECS", 600)?),

            openai_api_key: required("OPENAI_API_KEY")?,
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_OPENAI_API_BASE.to_string()),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),

            public_url: env::var("PUBLIC_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            http_timeout: Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", 30)?),
            port: parse_or("PORT", 8080)?,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test_client_id".to_string(),
            google_client_secret: "test_client_secret".to_string(),
            google_redirect_uri: "http://localhost:8080/auth/callback".to_string(),
            google_scopes: vec![DEFAULT_CALENDAR_SCOPE.to_string()],
            oauth_state_ttl: Duration::from_secs(600),
            openai_api_key: "test_openai_key".to_string(),
            openai_api_base: "http://localhost:9999".to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            public_url: "http://localhost:8080".to_string(),
            cors_allowed_origins: Vec::new(),
            http_timeout: Duration::from_secs(5),
            port: 8080,
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
