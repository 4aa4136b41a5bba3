// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Cognito bearer-token verification shared by the user, messaging and
//! counsellor services.
//!
//! ## Auth Flow
//!
//! 1. The frontend signs the user in with Cognito and receives an ID token
//! 2. The frontend sends `Authorization: Bearer <token>`
//! 3. The service:
//!    - Loads the user pool's JWKS (lazily, cached in-process)
//!    - Verifies the signature, then expiry, audience and issuer
//!    - Extracts:
//!      - `sub` → canonical `user_id`
//!      - `custom:profile_type` → customer or counsellor
//!
//! ## Security
//!
//! - Claims are never trusted before the signature is verified
//! - An unknown key id triggers exactly one JWKS refresh, never a loop
//! - Every failure is a 401; the error code is kept for logs and clients
//! - No clock skew leeway: `exp == now` is already expired

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod keys;
pub mod middleware;
pub mod profile;
pub mod token;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use claims::{AuthenticatedUser, TokenClaims};
pub use error::{AuthError, VerificationError};
pub use extractor::Auth;
pub use jwks::{KeySetCache, KeyStore};
pub use middleware::require_auth;
pub use profile::ProfileType;
pub use verifier::TokenVerifier;
