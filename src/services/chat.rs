// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat orchestration: one user message in, one reply out.
//!
//! A turn is a small state machine:
//!
//! ```text
//! AwaitingFirstReply ──text──────────────────────────────► Done
//!        │
//!   function call
//!        ▼
//!   Dispatching ──NotAuthenticated─────────────────────────► Done
//!        │
//!   tool result (success or error)
//!        ▼
//! AwaitingFinalReply ──────────────────────────────────────► Done
//! ```
//!
//! Nothing is remembered between turns.

use crate::error::AppError;
use crate::services::credentials::CredentialService;
use crate::services::functions::{
    function_specs, outcome_json, FunctionDispatcher, FUNCTION_NAMES,
};
use crate::services::openai::{ChatModel, FunctionCall, Message, Role, Tool};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;

const LLM_FAILURE_REPLY: &str =
    "Sorry, I'm having trouble reaching the assistant right now. Please try again in a moment.";
const EMPTY_REPLY: &str = "Sorry, I don't have an answer for that.";

/// States of a single chat turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatState {
    AwaitingFirstReply,
    Dispatching(FunctionCall),
    AwaitingFinalReply,
    Done(String),
}

/// Drives a chat turn between the user, the model and the calendar.
pub struct ChatOrchestrator {
    model: Arc<dyn ChatModel>,
    dispatcher: FunctionDispatcher,
    credentials: Arc<CredentialService>,
    tools: Vec<Tool>,
    public_url: String,
}

impl ChatOrchestrator {
    pub fn new(
        model: Arc<dyn ChatModel>,
        dispatcher: FunctionDispatcher,
        credentials: Arc<CredentialService>,
        public_url: &str,
    ) -> Self {
        Self {
            model,
            dispatcher,
            credentials,
            tools: function_specs(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Produce exactly one reply for `message`. Never fails: internal errors
    /// become an explanatory reply.
    pub async fn handle(&self, user_id: &str, message: &str) -> String {
        let mut messages = vec![
            Message::new(Role::System, &self.system_prompt(user_id)),
            Message::new(Role::User, message),
        ];
        let mut state = ChatState::AwaitingFirstReply;

        loop {
            state = match state {
                ChatState::AwaitingFirstReply => {
                    match self.model.complete(&messages, &self.tools).await {
                        Ok(reply) => match reply.first_tool_call().cloned() {
                            Some(call) => {
                                // Only the first call is executed, so only it is echoed back.
                                messages.push(Message::new_tool_call_request(vec![call.clone()]));
                                ChatState::Dispatching(call)
                            }
                            None => ChatState::Done(text_or_fallback(reply)),
                        },
                        Err(e) => ChatState::Done(llm_failure(user_id, &e)),
                    }
                }
                ChatState::Dispatching(call)
                    if FUNCTION_NAMES.contains(&call.function.name.as_str())
                        && !self.credentials.is_connected(user_id) =>
                {
                    tracing::info!(user_id, function = %call.function.name, "Calendar not connected");
                    ChatState::Done(self.connect_prompt(user_id))
                }
                ChatState::Dispatching(call) => {
                    let result = self
                        .dispatcher
                        .dispatch(user_id, &call.function.name, &call.function.arguments)
                        .await;

                    match &result {
                        Ok(_) => {
                            tracing::info!(user_id, function = %call.function.name, "Function call succeeded")
                        }
                        Err(e) => tracing::warn!(
                            user_id,
                            function = %call.function.name,
                            kind = e.kind(),
                            error = %e,
                            "Function call failed"
                        ),
                    }

                    if matches!(result, Err(AppError::NotAuthenticated)) {
                        ChatState::Done(self.connect_prompt(user_id))
                    } else {
                        messages.push(Message::new_tool_call_response(
                            &outcome_json(&result),
                            &call.id,
                        ));
                        ChatState::AwaitingFinalReply
                    }
                }
                ChatState::AwaitingFinalReply => match self.model.complete(&messages, &[]).await {
                    Ok(reply) => ChatState::Done(text_or_fallback(reply)),
                    Err(e) => ChatState::Done(llm_failure(user_id, &e)),
                },
                ChatState::Done(reply) => return reply,
            };
        }
    }

    /// Reply telling the user how to connect their calendar.
    pub fn connect_prompt(&self, user_id: &str) -> String {
        format!(
            "To work with your calendar I need access to your Google Calendar first. \
             Please connect it here: {}/auth/google?user_id={}",
            self.public_url,
            urlencoding::encode(user_id)
        )
    }

    fn system_prompt(&self, user_id: &str) -> String {
        let connection = if self.credentials.is_connected(user_id) {
            "You can access the user's Google Calendar."
        } else {
            "The user has not connected their Google Calendar yet."
        };
        format!(
            "You are a helpful assistant. {} The current time is {}.",
            connection,
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

fn text_or_fallback(reply: Message) -> String {
    reply.content.unwrap_or_else(|| EMPTY_REPLY.to_string())
}

fn llm_failure(user_id: &str, err: &AppError) -> String {
    tracing::error!(user_id, error = %err, "Chat completion failed");
    LLM_FAILURE_REPLY.to_string()
}
