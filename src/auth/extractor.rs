// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::Utc;

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Extract the token from an `Authorization` header value.
///
/// Accepts `Bearer <token>` with a case-insensitive scheme, exactly one
/// space, and a non-empty token containing no whitespace.
pub fn bearer_token(value: &str) -> Result<&str, AuthError> {
    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AuthError::MissingOrMalformedAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer")
        || token.is_empty()
        || token.chars().any(char::is_whitespace)
    {
        return Err(AuthError::MissingOrMalformedAuthHeader);
    }

    Ok(token)
}

/// Verify the bearer token in `headers` and build the user from its claims.
pub(crate) async fn authenticate(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<AuthenticatedUser, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingOrMalformedAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::MissingOrMalformedAuthHeader)?;

    let token = bearer_token(value)?;
    let claims = state.verifier.verify(token, Utc::now()).await?;

    Ok(AuthenticatedUser::from_claims(claims))
}

/// Extractor for authenticated users.
///
/// Uses the user stored by the `require_auth` middleware when present;
/// otherwise verifies the `Authorization` header itself.
///
/// # Example
///
/// ```rust,ignore
/// async fn get_current_user(Auth(user): Auth) -> Json<UserMeResponse> {
///     Json(user.into())
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let user = authenticate(&parts.headers, state).await?;
        Ok(Auth(user))
    }
}
