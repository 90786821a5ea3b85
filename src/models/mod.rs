// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod credential;
pub mod event;

pub use credential::OAuthCredential;
pub use event::{CalendarEvent, EventPatch, NewEvent};
