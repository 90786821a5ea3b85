// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar event shapes passed between the dispatcher and the calendar API.
//!
//! Events are never stored locally; these types only carry data for the
//! duration of one chat turn.

use crate::error::AppError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Event as returned by the calendar provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CalendarEvent {
    /// Provider-assigned event ID
    pub id: String,
    /// Event title (Google calls this the summary)
    pub title: String,
    /// Start as RFC3339 date-time, or a plain date for all-day events
    pub start: Option<String>,
    /// End as RFC3339 date-time, or a plain date for all-day events
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Attendee email addresses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,
    /// Link to the event in the Google Calendar UI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
}

/// Fields for a new event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub attendees: Vec<String>,
}

impl NewEvent {
    /// Reject events the provider would refuse or silently mangle.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("event title must not be empty".into()));
        }
        if self.end <= self.start {
            return Err(AppError::Validation(format!(
                "event end {} must be after start {}",
                self.end.to_rfc3339(),
                self.start.to_rfc3339()
            )));
        }
        validate_attendees(&self.attendees)
    }
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.description.is_none()
            && self.location.is_none()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.is_empty() {
            return Err(AppError::Validation("no fields to update".into()));
        }
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Err(AppError::Validation("event title must not be empty".into()));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end <= start {
                return Err(AppError::Validation(format!(
                    "event end {} must be after start {}",
                    end.to_rfc3339(),
                    start.to_rfc3339()
                )));
            }
        }
        Ok(())
    }
}

/// Parse an RFC3339 timestamp supplied by the model, naming the field on error.
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<FixedOffset>, AppError> {
    DateTime::parse_from_rfc3339(value.trim()).map_err(|e| {
        AppError::Validation(format!(
            "{} must be an ISO 8601 timestamp like 2024-05-01T10:00:00Z (got {:?}: {})",
            field, value, e
        ))
    })
}

fn validate_attendees(attendees: &[String]) -> Result<(), AppError> {
    match attendees.iter().find(|a| !a.contains('@')) {
        Some(bad) => Err(AppError::Validation(format!(
            "attendee {:?} is not an email address",
            bad
        ))),
        None => Ok(()),
    }
}
