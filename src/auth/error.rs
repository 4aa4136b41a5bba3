// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! [`VerificationError`] is what the verification core returns. [`AuthError`]
//! is the HTTP-facing rejection: it adds the bearer-header precondition and
//! maps every failure to `401 Unauthorized` with a JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Why a token was rejected by the verification core.
///
/// All variants are terminal. The only automatic retry is the single key-set
/// refresh on an unknown key id, which happens before `UnknownSigningKey` is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Token structure, header or payload could not be decoded
    #[error("Token is malformed")]
    MalformedToken,
    /// The identity provider's key set could not be obtained
    #[error("Signing keys are unavailable: {0}")]
    KeySetUnavailable(String),
    /// No key with this id, even after a forced refresh
    #[error("No signing key matches key id '{0}'")]
    UnknownSigningKey(String),
    /// Cryptographic verification failed
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// `exp` is at or before the verification instant
    #[error("Token has expired")]
    TokenExpired,
    /// `aud` is absent or does not contain the expected audience
    #[error("Token was not issued for this audience")]
    AudienceMismatch,
    /// `iss` differs from the configured issuer
    #[error("Token issuer mismatch")]
    IssuerMismatch,
}

impl VerificationError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            VerificationError::MalformedToken => "malformed_token",
            VerificationError::KeySetUnavailable(_) => "key_set_unavailable",
            VerificationError::UnknownSigningKey(_) => "unknown_signing_key",
            VerificationError::InvalidSignature => "invalid_signature",
            VerificationError::TokenExpired => "token_expired",
            VerificationError::AudienceMismatch => "audience_mismatch",
            VerificationError::IssuerMismatch => "issuer_mismatch",
        }
    }
}

/// Authentication error returned by the extractor and middleware.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Header absent, not UTF-8, or not `Bearer <token>`
    #[error("Missing or invalid Authorization header (expected 'Bearer <token>')")]
    MissingOrMalformedAuthHeader,
    /// The token itself was rejected
    #[error("Token verification failed: {0}")]
    Verification(#[from] VerificationError),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingOrMalformedAuthHeader => "missing_or_malformed_auth_header",
            AuthError::Verification(e) => e.error_code(),
        }
    }

    /// Every authentication failure is reported the same way to clients.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
