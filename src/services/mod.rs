// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod calendar;
pub mod chat;
pub mod credentials;
pub mod functions;
pub mod google_calendar;
pub mod google_oauth;
pub mod oauth;
pub mod openai;

pub use calendar::CalendarService;
pub use chat::{ChatOrchestrator, ChatState};
pub use credentials::CredentialService;
pub use functions::{CalendarFunction, FunctionDispatcher};
pub use google_calendar::{CalendarApi, GoogleCalendarClient};
pub use google_oauth::{GoogleOAuthClient, OAuthProvider, TokenGrant};
pub use oauth::OAuthFlow;
pub use openai::{ChatModel, OpenAiClient};
