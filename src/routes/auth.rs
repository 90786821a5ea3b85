// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth authentication routes.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", get(auth_start))
        .route("/auth/callback", get(auth_callback))
}

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    #[serde(default)]
    user_id: Option<String>,
}

/// Start OAuth flow - redirect to Google authorization.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
) -> Result<Response> {
    let user_id = params
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("user_id is required".to_string()))?;

    let auth_url = state.oauth.begin(&user_id)?;

    Ok((StatusCode::FOUND, [(header::LOCATION, auth_url)]).into_response())
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Authentication outcome.
#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub status: String,
    pub message: String,
}

/// OAuth callback - exchange code for tokens and store the credential.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<AuthResponse>> {
    let oauth_state = params
        .state
        .ok_or_else(|| AppError::BadRequest("state is required".to_string()))?;

    // Check for OAuth errors
    if let Some(error) = params.error {
        return Err(state.oauth.reject(&oauth_state, &error));
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Err(state
            .oauth
            .reject(&oauth_state, "no authorization code returned"));
    };

    tracing::info!("Exchanging authorization code for tokens");
    let user_id = state.oauth.complete(&code, &oauth_state).await?;

    tracing::info!(user_id = %user_id, "Google Calendar connected");
    Ok(Json(AuthResponse {
        status: "success".to_string(),
        message: "Successfully authenticated with Google Calendar".to_string(),
    }))
}
