// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, AuthenticatedUser, ProfileType};

/// Response for GET /v1/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// User's unique ID (Cognito `sub`)
    pub user_id: String,
    /// Customer or counsellor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<ProfileType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Counsellor specialization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    /// Token expiration (Unix timestamp)
    pub expires_at: i64,
}

impl From<AuthenticatedUser> for UserMeResponse {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            user_id: user.user_id,
            profile_type: user.profile_type,
            email: user.email,
            name: user.name,
            specialization: user.specialization,
            expires_at: user.expires_at,
        }
    }
}

/// Get the current authenticated user's information.
///
/// Returns the identity carried by the caller's verified token.
#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(user): Auth) -> Json<UserMeResponse> {
    Json(user.into())
}
