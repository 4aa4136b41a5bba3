// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::KeyStore;
use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// JWKS (signing keys) status: "ok" or "unavailable".
    pub jwks: String,
    /// Number of signing keys currently cached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_count: Option<usize>,
}

/// Liveness handler.
///
/// Always returns 200 with the service's name if the process is running.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = String, content_type = "text/plain")
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, String) {
    (
        StatusCode::OK,
        format!("{} is healthy!", state.service.display_name()),
    )
}

/// Readiness probe handler.
///
/// Returns 200 only if the signing keys can be obtained (from cache or by
/// fetching them now), 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Signing keys unavailable", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let (status, jwks, key_count) = match state.verifier.keys().get().await {
        Ok(keys) => (StatusCode::OK, "ok", Some(keys.len())),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed, JWKS unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable", None)
        }
    };

    let response = ReadyResponse {
        status: if status == StatusCode::OK { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            jwks: jwks.to_string(),
            key_count,
        },
    };

    (status, Json(response))
}
