// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar operations on behalf of a user.

use crate::error::AppError;
use crate::models::{CalendarEvent, EventPatch, NewEvent};
use crate::services::credentials::CredentialService;
use crate::services::google_calendar::CalendarApi;
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

/// The four calendar operations, each keyed by user ID.
///
/// Every call resolves a valid access token first, so a user without a
/// credential fails with `NotAuthenticated` before the provider is contacted.
pub struct CalendarService {
    credentials: Arc<CredentialService>,
    api: Arc<dyn CalendarApi>,
}

impl CalendarService {
    pub fn new(credentials: Arc<CredentialService>, api: Arc<dyn CalendarApi>) -> Self {
        Self { credentials, api }
    }

    /// Events overlapping `[time_min, time_max]`, ordered by start time.
    pub async fn list_events(
        &self,
        user_id: &str,
        time_min: DateTime<FixedOffset>,
        time_max: DateTime<FixedOffset>,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        let token = self.credentials.valid_access_token(user_id).await?;
        if time_min > time_max {
            return Err(AppError::Validation(format!(
                "start {} is after end {}",
                time_min.to_rfc3339(),
                time_max.to_rfc3339()
            )));
        }

        let events = self
            .api
            .list_events(&token, time_min, time_max)
            .await
            .map_err(|e| self.on_api_error(user_id, e))?;

        tracing::debug!(user_id, count = events.len(), "Listed events");
        Ok(events)
    }

    pub async fn create_event(
        &self,
        user_id: &str,
        event: NewEvent,
    ) -> Result<CalendarEvent, AppError> {
        let token = self.credentials.valid_access_token(user_id).await?;
        event.validate()?;

        let created = self
            .api
            .insert_event(&token, &event)
            .await
            .map_err(|e| self.on_api_error(user_id, e))?;

        tracing::info!(user_id, event_id = %created.id, "Created event");
        Ok(created)
    }

    pub async fn update_event(
        &self,
        user_id: &str,
        event_id: &str,
        patch: EventPatch,
    ) -> Result<CalendarEvent, AppError> {
        let token = self.credentials.valid_access_token(user_id).await?;
        require_event_id(event_id)?;
        patch.validate()?;

        let updated = self
            .api
            .patch_event(&token, event_id, &patch)
            .await
            .map_err(|e| self.on_api_error(user_id, e))?;

        tracing::info!(user_id, event_id, "Updated event");
        Ok(updated)
    }

    pub async fn delete_event(&self, user_id: &str, event_id: &str) -> Result<(), AppError> {
        let token = self.credentials.valid_access_token(user_id).await?;
        require_event_id(event_id)?;

        self.api
            .delete_event(&token, event_id)
            .await
            .map_err(|e| self.on_api_error(user_id, e))?;

        tracing::info!(user_id, event_id, "Deleted event");
        Ok(())
    }

    /// A 401 with a freshly validated token means the grant was revoked.
    fn on_api_error(&self, user_id: &str, err: AppError) -> AppError {
        match err {
            AppError::NotAuthenticated => {
                self.credentials.forget(user_id);
                AppError::NotAuthenticated
            }
            AppError::NotFound(_) | AppError::Validation(_) | AppError::CalendarApi(_) => err,
            other => AppError::CalendarApi(other.to_string()),
        }
    }
}

fn require_event_id(event_id: &str) -> Result<(), AppError> {
    if event_id.trim().is_empty() {
        return Err(AppError::Validation("event_id must not be empty".into()));
    }
    Ok(())
}
