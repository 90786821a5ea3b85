// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar Agent API Server
//!
//! Relays chat messages to an LLM and carries out the Google Calendar
//! operations it requests for OAuth-connected users.

use calendar_agent::{
    config::Config,
    services::{GoogleCalendarClient, GoogleOAuthClient, OpenAiClient},
    store::MemoryCredentialStore,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, model = %config.openai_model, "Starting Calendar Agent API");

    let oauth_provider = Arc::new(GoogleOAuthClient::new(&config)?);
    let calendar_api = Arc::new(GoogleCalendarClient::new(&config)?);
    let model = Arc::new(OpenAiClient::new(&config)?);

    // Credentials live in memory only and are lost on restart
    let store = Arc::new(MemoryCredentialStore::new());
    tracing::info!("Credential store initialized");

    // Build shared state
    let port = config.port;
    let state = Arc::new(AppState::new(
        config,
        store,
        oauth_provider,
        calendar_api,
        model,
    ));

    // Build router
    let app = calendar_agent::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("calendar_agent=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
