// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process fakes for the three external services, plus app builders.

use async_trait::async_trait;
use calendar_agent::config::Config;
use calendar_agent::error::AppError;
use calendar_agent::models::{CalendarEvent, EventPatch, NewEvent, OAuthCredential};
use calendar_agent::routes::create_router;
use calendar_agent::services::openai::{FunctionCall, FunctionCallFn, Message, Role, Tool};
use calendar_agent::services::{CalendarApi, ChatModel, OAuthProvider, TokenGrant};
use calendar_agent::store::{CredentialStore, MemoryCredentialStore};
use calendar_agent::AppState;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ─── OAuth provider ──────────────────────────────────────────

/// Authorization server that hands out numbered tokens.
#[derive(Default)]
pub struct FakeOAuthProvider {
    pub exchange_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    /// When set, code exchange fails with `TokenExchange(<message>)`.
    pub exchange_error: Mutex<Option<String>>,
    /// When set, refresh fails with `TokenExchange(<message>)`.
    pub refresh_error: Mutex<Option<String>>,
    /// Artificial latency on refresh so concurrent callers overlap.
    pub refresh_delay_ms: u64,
    /// Overrides the one-hour `expires_in` on every grant.
    pub expires_in: Mutex<Option<i64>>,
}

#[allow(dead_code)]
impl FakeOAuthProvider {
    pub fn with_refresh_delay(delay_ms: u64) -> Self {
        Self {
            refresh_delay_ms: delay_ms,
            ..Default::default()
        }
    }

    pub fn fail_exchange(&self, message: &str) {
        *self.exchange_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_refresh(&self, message: &str) {
        *self.refresh_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_expires_in(&self, expires_in: i64) {
        *self.expires_in.lock().unwrap() = Some(expires_in);
    }

    fn grant_lifetime(&self) -> i64 {
        self.expires_in.lock().unwrap().unwrap_or(3600)
    }

    pub fn exchanges(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OAuthProvider for FakeOAuthProvider {
    fn authorization_url(&self, state: &str, code_challenge: &str) -> String {
        format!(
            "https://auth.example.test/authorize?client_id=test_client_id&state={}&code_challenge={}",
            state, code_challenge
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        _code_verifier: &str,
    ) -> Result<TokenGrant, AppError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.exchange_error.lock().unwrap().clone() {
            return Err(AppError::TokenExchange(message));
        }
        Ok(TokenGrant {
            access_token: format!("access-for-{}", code),
            refresh_token: Some(format!("refresh-for-{}", code)),
            expires_in: self.grant_lifetime(),
            scope: Some("https://www.googleapis.com/auth/calendar".to_string()),
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant, AppError> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.refresh_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.refresh_delay_ms)).await;
        }
        if let Some(message) = self.refresh_error.lock().unwrap().clone() {
            return Err(AppError::TokenExchange(message));
        }
        Ok(TokenGrant {
            access_token: format!("refreshed-{}", n),
            refresh_token: None,
            expires_in: self.grant_lifetime(),
            scope: None,
        })
    }
}

// ─── Calendar API ────────────────────────────────────────────

/// Failure the fake calendar should answer every call with.
#[derive(Clone, Copy, Debug)]
#[allow(dead_code)]
pub enum CalendarFailure {
    Unauthorized,
    NotFound,
    ServerError,
}

impl CalendarFailure {
    fn to_error(self) -> AppError {
        match self {
            CalendarFailure::Unauthorized => AppError::NotAuthenticated,
            CalendarFailure::NotFound => AppError::NotFound("event".to_string()),
            CalendarFailure::ServerError => {
                AppError::CalendarApi("500 Internal Server Error".to_string())
            }
        }
    }
}

/// Calendar that keeps events in memory and records every call.
#[derive(Default)]
pub struct FakeCalendarApi {
    pub calls: AtomicUsize,
    pub events: Mutex<Vec<CalendarEvent>>,
    pub tokens_seen: Mutex<Vec<String>>,
    pub failure: Mutex<Option<CalendarFailure>>,
}

#[allow(dead_code)]
impl FakeCalendarApi {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, failure: CalendarFailure) {
        *self.failure.lock().unwrap() = Some(failure);
    }

    pub fn add_event(&self, id: &str, title: &str, start: &str, end: &str) {
        self.events.lock().unwrap().push(CalendarEvent {
            id: id.to_string(),
            title: title.to_string(),
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            description: None,
            location: None,
            attendees: Vec::new(),
            html_link: None,
        });
    }

    fn record(&self, access_token: &str) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen
            .lock()
            .unwrap()
            .push(access_token.to_string());
        match *self.failure.lock().unwrap() {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CalendarApi for FakeCalendarApi {
    async fn list_events(
        &self,
        access_token: &str,
        _time_min: DateTime<FixedOffset>,
        _time_max: DateTime<FixedOffset>,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        self.record(access_token)?;
        Ok(self.events.lock().unwrap().clone())
    }

    async fn insert_event(
        &self,
        access_token: &str,
        event: &NewEvent,
    ) -> Result<CalendarEvent, AppError> {
        self.record(access_token)?;
        let mut events = self.events.lock().unwrap();
        let created = CalendarEvent {
            id: format!("evt-{}", events.len() + 1),
            title: event.title.clone(),
            start: Some(event.start.to_rfc3339()),
            end: Some(event.end.to_rfc3339()),
            description: event.description.clone(),
            location: event.location.clone(),
            attendees: event.attendees.clone(),
            html_link: None,
        };
        events.push(created.clone());
        Ok(created)
    }

    async fn patch_event(
        &self,
        access_token: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<CalendarEvent, AppError> {
        self.record(access_token)?;
        let mut events = self.events.lock().unwrap();
        let event = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| AppError::NotFound(event_id.to_string()))?;
        if let Some(title) = &patch.title {
            event.title = title.clone();
        }
        if let Some(start) = patch.start {
            event.start = Some(start.to_rfc3339());
        }
        if let Some(end) = patch.end {
            event.end = Some(end.to_rfc3339());
        }
        if let Some(description) = &patch.description {
            event.description = Some(description.clone());
        }
        if let Some(location) = &patch.location {
            event.location = Some(location.clone());
        }
        Ok(event.clone())
    }

    async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<(), AppError> {
        self.record(access_token)?;
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| e.id != event_id);
        if events.len() == before {
            return Err(AppError::NotFound(event_id.to_string()));
        }
        Ok(())
    }
}

// ─── Chat model ──────────────────────────────────────────────

/// A recorded model request.
#[derive(Clone, Debug)]
pub struct ModelRequest {
    pub messages: Vec<Message>,
    pub tool_count: usize,
}

/// Model that plays back queued replies. An empty queue is an LLM error.
#[derive(Default)]
pub struct ScriptedChatModel {
    pub replies: Mutex<VecDeque<Result<Message, String>>>,
    pub requests: Mutex<Vec<ModelRequest>>,
}

#[allow(dead_code)]
impl ScriptedChatModel {
    pub fn new(replies: Vec<Message>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push_error(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> ModelRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, messages: &[Message], tools: &[Tool]) -> Result<Message, AppError> {
        self.requests.lock().unwrap().push(ModelRequest {
            messages: messages.to_vec(),
            tool_count: tools.len(),
        });
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(message)) => Ok(message),
            Some(Err(message)) => Err(AppError::Llm(message)),
            None => Err(AppError::Llm("no scripted reply left".to_string())),
        }
    }
}

/// Assistant reply with plain text.
#[allow(dead_code)]
pub fn text_reply(text: &str) -> Message {
    Message::new(Role::Assistant, text)
}

/// Assistant reply requesting one function call.
#[allow(dead_code)]
pub fn function_call_reply(name: &str, arguments: serde_json::Value) -> Message {
    Message::new_tool_call_request(vec![FunctionCall {
        function: FunctionCallFn {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
        id: "call_test_1".to_string(),
        r#type: "function".to_string(),
    }])
}

// ─── Credentials ─────────────────────────────────────────────

/// Credential valid for another hour.
#[allow(dead_code)]
pub fn fresh_credential(access_token: &str) -> OAuthCredential {
    OAuthCredential {
        access_token: access_token.to_string(),
        refresh_token: Some("refresh-token".to_string()),
        expires_at: Utc::now() + Duration::hours(1),
        scopes: vec!["https://www.googleapis.com/auth/calendar".to_string()],
    }
}

/// Credential whose access token has already expired.
#[allow(dead_code)]
pub fn expired_credential(refresh_token: Option<&str>) -> OAuthCredential {
    OAuthCredential {
        access_token: "stale-access".to_string(),
        refresh_token: refresh_token.map(String::from),
        expires_at: Utc::now() - Duration::minutes(5),
        scopes: vec!["https://www.googleapis.com/auth/calendar".to_string()],
    }
}

// ─── App ─────────────────────────────────────────────────────

/// Everything a test may want to poke at after building the app.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryCredentialStore>,
    pub provider: Arc<FakeOAuthProvider>,
    pub calendar: Arc<FakeCalendarApi>,
    pub model: Arc<ScriptedChatModel>,
}

#[allow(dead_code)]
impl TestApp {
    pub fn connect(&self, user_id: &str) {
        self.store.put(user_id, fresh_credential("valid-access"));
    }
}

/// Create a test app with fakes and the given scripted model replies.
#[allow(dead_code)]
pub fn create_test_app(replies: Vec<Message>) -> TestApp {
    create_test_app_with(Config::test_default(), FakeOAuthProvider::default(), replies)
}

#[allow(dead_code)]
pub fn create_test_app_with(
    config: Config,
    provider: FakeOAuthProvider,
    replies: Vec<Message>,
) -> TestApp {
    let store = Arc::new(MemoryCredentialStore::new());
    let provider = Arc::new(provider);
    let calendar = Arc::new(FakeCalendarApi::default());
    let model = Arc::new(ScriptedChatModel::new(replies));

    let state = Arc::new(AppState::new(
        config,
        store.clone(),
        provider.clone(),
        calendar.clone(),
        model.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        provider,
        calendar,
        model,
    }
}
