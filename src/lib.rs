// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wellness Gate - bearer-token gate for the wellness platform services
//!
//! Verifies Cognito-issued JWTs against the pool's published signing keys
//! and exposes the caller's identity to the user, messaging and
//! counsellor HTTP services.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token verification and the signing-key cache
//! - `config` - Environment configuration
//! - `state` - Shared application state

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
