// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Calendar v3 client for the user's primary calendar.
//!
//! Handles:
//! - Event listing (all pages, ordered by start time)
//! - Event insert / patch / delete
//! - Mapping provider status codes onto `AppError`

use crate::config::Config;
use crate::error::AppError;
use crate::models::{CalendarEvent, EventPatch, NewEvent};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const CALENDAR_ID: &str = "primary";
/// Upper bound on pages followed for a single listing.
const MAX_PAGES: usize = 10;

/// Event CRUD against a calendar provider, authenticated per call.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn list_events(
        &self,
        access_token: &str,
        time_min: DateTime<FixedOffset>,
        time_max: DateTime<FixedOffset>,
    ) -> Result<Vec<CalendarEvent>, AppError>;

    async fn insert_event(
        &self,
        access_token: &str,
        event: &NewEvent,
    ) -> Result<CalendarEvent, AppError>;

    async fn patch_event(
        &self,
        access_token: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<CalendarEvent, AppError>;

    async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<(), AppError>;
}

/// Google Calendar API client.
#[derive(Clone)]
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleCalendarClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("failed building Calendar HTTP client")?;

        Ok(Self {
            http,
            base_url: CALENDAR_API_BASE.to_string(),
        })
    }

    /// Override the API base URL (used against mock servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.base_url, CALENDAR_ID)
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(event_id))
    }

    /// Check response status and return error if not successful.
    async fn check_response(
        &self,
        response: reqwest::Response,
        event_id: Option<&str>,
    ) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            // Grant revoked or token rejected
            401 => Err(AppError::NotAuthenticated),
            404 | 410 => Err(AppError::NotFound(format!(
                "event {}",
                event_id.unwrap_or("unknown")
            ))),
            429 => {
                tracing::warn!("Google Calendar rate limit hit (429)");
                Err(AppError::CalendarApi("rate limit exceeded".to_string()))
            }
            400 => Err(AppError::Validation(format!("rejected by Google Calendar: {}", body))),
            _ => Err(AppError::CalendarApi(format!("HTTP {}: {}", status, body))),
        }
    }

    async fn parse_event(&self, response: reqwest::Response) -> Result<CalendarEvent, AppError> {
        let event: GoogleEvent = response
            .json()
            .await
            .map_err(|e| AppError::CalendarApi(format!("JSON parse error: {}", e)))?;
        Ok(event.into())
    }
}

fn send_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::CalendarApi("request timeout".to_string())
    } else {
        AppError::CalendarApi(format!("request failed: {}", e))
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn list_events(
        &self,
        access_token: &str,
        time_min: DateTime<FixedOffset>,
        time_max: DateTime<FixedOffset>,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut request = self
                .http
                .get(self.events_url())
                .bearer_auth(access_token)
                .query(&[
                    ("timeMin", time_min.to_rfc3339()),
                    ("timeMax", time_max.to_rfc3339()),
                    ("singleEvents", "true".to_string()),
                    ("orderBy", "startTime".to_string()),
                ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request.send().await.map_err(send_error)?;
            let page: EventListResponse = self
                .check_response(response, None)
                .await?
                .json()
                .await
                .map_err(|e| AppError::CalendarApi(format!("JSON parse error: {}", e)))?;

            events.extend(page.items.into_iter().map(CalendarEvent::from));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => return Ok(events),
            }
        }

        tracing::warn!(count = events.len(), "Stopped listing events after page limit");
        Ok(events)
    }

    async fn insert_event(
        &self,
        access_token: &str,
        event: &NewEvent,
    ) -> Result<CalendarEvent, AppError> {
        let body = EventBody {
            summary: Some(event.title.clone()),
            description: event.description.clone(),
            location: event.location.clone(),
            start: Some(EventDateTime::at(event.start)),
            end: Some(EventDateTime::at(event.end)),
            attendees: (!event.attendees.is_empty()).then(|| {
                event
                    .attendees
                    .iter()
                    .map(|email| Attendee {
                        email: email.clone(),
                    })
                    .collect()
            }),
        };

        let response = self
            .http
            .post(self.events_url())
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;

        let response = self.check_response(response, None).await?;
        self.parse_event(response).await
    }

    async fn patch_event(
        &self,
        access_token: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<CalendarEvent, AppError> {
        let body = EventBody {
            summary: patch.title.clone(),
            description: patch.description.clone(),
            location: patch.location.clone(),
            start: patch.start.map(EventDateTime::at),
            end: patch.end.map(EventDateTime::at),
            attendees: None,
        };

        let response = self
            .http
            .patch(self.event_url(event_id))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;

        let response = self.check_response(response, Some(event_id)).await?;
        self.parse_event(response).await
    }

    async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<(), AppError> {
        let response = self
            .http
            .delete(self.event_url(event_id))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(send_error)?;

        self.check_response(response, Some(event_id)).await?;
        Ok(())
    }
}

// ─── Wire types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<GoogleEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    start: Option<EventDateTime>,
    #[serde(default)]
    end: Option<EventDateTime>,
    #[serde(default)]
    attendees: Vec<Attendee>,
    #[serde(default)]
    html_link: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    /// All-day events carry a date instead of a date-time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<String>,
}

impl EventDateTime {
    fn at(instant: DateTime<FixedOffset>) -> Self {
        Self {
            date_time: Some(instant.to_rfc3339()),
            date: None,
        }
    }

    fn into_string(self) -> Option<String> {
        self.date_time.or(self.date)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Attendee {
    email: String,
}

/// Request body for insert and patch; absent fields are left untouched by PATCH.
#[derive(Debug, Serialize)]
struct EventBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attendees: Option<Vec<Attendee>>,
}

impl From<GoogleEvent> for CalendarEvent {
    fn from(event: GoogleEvent) -> Self {
        Self {
            id: event.id,
            title: event.summary.unwrap_or_else(|| "(no title)".to_string()),
            start: event.start.and_then(EventDateTime::into_string),
            end: event.end.and_then(EventDateTime::into_string),
            description: event.description,
            location: event.location,
            attendees: event.attendees.into_iter().map(|a| a.email).collect(),
            html_link: event.html_link,
        }
    }
}
