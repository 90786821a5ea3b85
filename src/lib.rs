// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Calendar Agent: chat-driven Google Calendar assistant
//!
//! This crate provides the backend API that relays chat messages to an LLM,
//! executes the calendar function calls it asks for on behalf of an
//! OAuth-connected user, and returns the model's final reply.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use config::Config;
use services::{
    CalendarApi, CalendarService, ChatModel, ChatOrchestrator, CredentialService,
    FunctionDispatcher, OAuthFlow, OAuthProvider,
};
use std::sync::Arc;
use store::CredentialStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn CredentialStore>,
    pub oauth: OAuthFlow,
    pub chat: ChatOrchestrator,
}

impl AppState {
    /// Wire services around the three external collaborators.
    pub fn new(
        config: Config,
        store: Arc<dyn CredentialStore>,
        oauth_provider: Arc<dyn OAuthProvider>,
        calendar_api: Arc<dyn CalendarApi>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        let credentials = Arc::new(CredentialService::new(
            store.clone(),
            oauth_provider.clone(),
        ));
        let calendar = Arc::new(CalendarService::new(credentials.clone(), calendar_api));
        let dispatcher = FunctionDispatcher::new(calendar);
        let chat = ChatOrchestrator::new(model, dispatcher, credentials, &config.public_url);
        let oauth = OAuthFlow::new(oauth_provider, store.clone(), config.oauth_state_ttl);

        Self {
            config,
            store,
            oauth,
            chat,
        }
    }
}
