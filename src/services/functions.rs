// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Function calling: the functions advertised to the model, parsing of the
//! model's calls into typed operations, and dispatch to the calendar.

use crate::error::AppError;
use crate::models::event::parse_timestamp;
use crate::models::{EventPatch, NewEvent};
use crate::services::calendar::CalendarService;
use crate::services::openai::{Function, Parameters, Property, Tool, ToolType};
use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const LIST_EVENTS: &str = "list_events";
pub const CREATE_EVENT: &str = "create_event";
pub const UPDATE_EVENT: &str = "update_event";
pub const DELETE_EVENT: &str = "delete_event";

/// Every function name the model may call.
pub const FUNCTION_NAMES: [&str; 4] = [LIST_EVENTS, CREATE_EVENT, UPDATE_EVENT, DELETE_EVENT];

// ─── Arguments as sent by the model ──────────────────────────

#[derive(Debug, Deserialize)]
struct ListEventsArgs {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct CreateEventArgs {
    title: String,
    start: String,
    end: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    attendees: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateEventArgs {
    event_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteEventArgs {
    event_id: String,
}

/// A validated calendar operation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarFunction {
    ListEvents {
        time_min: DateTime<FixedOffset>,
        time_max: DateTime<FixedOffset>,
    },
    CreateEvent(NewEvent),
    UpdateEvent {
        event_id: String,
        patch: EventPatch,
    },
    DeleteEvent {
        event_id: String,
    },
}

impl CalendarFunction {
    /// Map a function name and its JSON arguments to an operation.
    ///
    /// Unknown names fail with `UnknownFunction`; arguments of the wrong
    /// shape fail with `Validation`.
    pub fn parse(name: &str, arguments: &str) -> Result<Self, AppError> {
        match name {
            LIST_EVENTS => {
                let args: ListEventsArgs = decode_args(name, arguments)?;
                Ok(Self::ListEvents {
                    time_min: parse_timestamp("start", &args.start)?,
                    time_max: parse_timestamp("end", &args.end)?,
                })
            }
            CREATE_EVENT => {
                let args: CreateEventArgs = decode_args(name, arguments)?;
                Ok(Self::CreateEvent(NewEvent {
                    title: args.title,
                    start: parse_timestamp("start", &args.start)?,
                    end: parse_timestamp("end", &args.end)?,
                    description: non_blank(args.description),
                    location: non_blank(args.location),
                    attendees: args.attendees,
                }))
            }
            UPDATE_EVENT => {
                let args: UpdateEventArgs = decode_args(name, arguments)?;
                Ok(Self::UpdateEvent {
                    event_id: args.event_id,
                    patch: EventPatch {
                        title: non_blank(args.title),
                        start: optional_timestamp("start", args.start)?,
                        end: optional_timestamp("end", args.end)?,
                        description: non_blank(args.description),
                        location: non_blank(args.location),
                    },
                })
            }
            DELETE_EVENT => {
                let args: DeleteEventArgs = decode_args(name, arguments)?;
                Ok(Self::DeleteEvent {
                    event_id: args.event_id,
                })
            }
            other => Err(AppError::UnknownFunction(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListEvents { .. } => LIST_EVENTS,
            Self::CreateEvent(_) => CREATE_EVENT,
            Self::UpdateEvent { .. } => UPDATE_EVENT,
            Self::DeleteEvent { .. } => DELETE_EVENT,
        }
    }
}

fn decode_args<T: DeserializeOwned>(name: &str, arguments: &str) -> Result<T, AppError> {
    // Some models send an empty string for "no arguments".
    let arguments = if arguments.trim().is_empty() {
        "{}"
    } else {
        arguments
    };
    serde_json::from_str(arguments)
        .map_err(|e| AppError::Validation(format!("invalid arguments for {}: {}", name, e)))
}

fn optional_timestamp(
    field: &str,
    value: Option<String>,
) -> Result<Option<DateTime<FixedOffset>>, AppError> {
    non_blank(value)
        .map(|v| parse_timestamp(field, &v))
        .transpose()
}

// Models often send "" for fields they mean to leave alone.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Tool definitions advertised to the model.
pub fn function_specs() -> Vec<Tool> {
    vec![
        tool(
            LIST_EVENTS,
            "List calendar events in a given time window",
            &[
                ("start", Property::string("ISO timestamp for start of time window, e.g. 2023-11-15T00:00:00Z")),
                ("end", Property::string("ISO timestamp for end of time window, e.g. 2023-11-15T23:59:59Z")),
            ],
            &["start", "end"],
        ),
        tool(
            CREATE_EVENT,
            "Create a new calendar event",
            &[
                ("title", Property::string("Title/summary of the event")),
                ("start", Property::string("ISO timestamp for event start, e.g. 2023-11-15T10:00:00Z")),
                ("end", Property::string("ISO timestamp for event end, e.g. 2023-11-15T11:00:00Z")),
                ("description", Property::string("Optional detailed description of the event")),
                ("location", Property::string("Optional location of the event")),
                ("attendees", Property::string_array("Optional email addresses of people to invite")),
            ],
            &["title", "start", "end"],
        ),
        tool(
            UPDATE_EVENT,
            "Update an existing calendar event",
            &[
                ("event_id", Property::string("ID of the event to update")),
                ("title", Property::string("New title/summary of the event")),
                ("start", Property::string("New ISO timestamp for event start")),
                ("end", Property::string("New ISO timestamp for event end")),
                ("description", Property::string("New detailed description of the event")),
                ("location", Property::string("New location of the event")),
            ],
            &["event_id"],
        ),
        tool(
            DELETE_EVENT,
            "Delete a calendar event",
            &[("event_id", Property::string("ID of the event to delete"))],
            &["event_id"],
        ),
    ]
}

fn tool(name: &str, description: &str, properties: &[(&str, Property)], required: &[&str]) -> Tool {
    Tool {
        r#type: ToolType::Function,
        function: Function {
            name: name.to_string(),
            description: description.to_string(),
            parameters: Parameters {
                r#type: String::from("object"),
                properties: properties
                    .iter()
                    .map(|(key, prop)| (key.to_string(), prop.clone()))
                    .collect::<BTreeMap<_, _>>(),
                required: required.iter().map(|r| r.to_string()).collect(),
                additional_properties: false,
            },
        },
    }
}

/// Routes model function calls to the calendar.
pub struct FunctionDispatcher {
    calendar: Arc<CalendarService>,
}

impl FunctionDispatcher {
    pub fn new(calendar: Arc<CalendarService>) -> Self {
        Self { calendar }
    }

    /// Parse and run one function call for `user_id`.
    pub async fn dispatch(
        &self,
        user_id: &str,
        name: &str,
        arguments: &str,
    ) -> Result<Value, AppError> {
        let call = CalendarFunction::parse(name, arguments)?;
        self.execute(user_id, call).await
    }

    pub async fn execute(&self, user_id: &str, call: CalendarFunction) -> Result<Value, AppError> {
        match call {
            CalendarFunction::ListEvents { time_min, time_max } => {
                let events = self.calendar.list_events(user_id, time_min, time_max).await?;
                Ok(json!({ "count": events.len(), "events": events }))
            }
            CalendarFunction::CreateEvent(event) => {
                let created = self.calendar.create_event(user_id, event).await?;
                Ok(json!({ "event": created }))
            }
            CalendarFunction::UpdateEvent { event_id, patch } => {
                let updated = self.calendar.update_event(user_id, &event_id, patch).await?;
                Ok(json!({ "event": updated }))
            }
            CalendarFunction::DeleteEvent { event_id } => {
                self.calendar.delete_event(user_id, &event_id).await?;
                Ok(json!({ "deleted": event_id }))
            }
        }
    }
}

/// Serialize a dispatch outcome as the tool result the model reads.
pub fn outcome_json(result: &Result<Value, AppError>) -> String {
    let value = match result {
        Ok(value) => json!({ "ok": true, "result": value }),
        Err(err) => json!({
            "ok": false,
            "error": err.kind(),
            "message": err.user_message(),
            "details": err.to_string(),
        }),
    };
    value.to_string()
}
