// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification.
//!
//! ## Order of checks
//!
//! 1. Structure and header (`kid`)
//! 2. Key lookup, with at most one forced refresh on a miss
//! 3. Signature over the literal `header.payload` bytes
//! 4. Payload decode, then `exp`, `aud`, `iss`
//!
//! Claims are attacker-controlled until step 3 succeeds, so no claim is
//! looked at before it.

use chrono::{DateTime, Utc};

use super::claims::TokenClaims;
use super::error::VerificationError;
use super::jwks::{KeySetCache, KeyStore};
use super::keys::SigningKey;
use super::token::RawToken;

/// Verifies tokens from one fixed issuer for one fixed audience.
pub struct TokenVerifier<S = KeySetCache> {
    keys: S,
    issuer: String,
    audience: String,
}

impl<S: KeyStore> TokenVerifier<S> {
    /// Create a verifier. Issuer and audience are validated by the caller.
    pub fn new(keys: S, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    pub fn keys(&self) -> &S {
        &self.keys
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Verify `token` as of `now` and return its claims.
    pub async fn verify(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, VerificationError> {
        let result = self.check(token, now).await;
        match &result {
            Ok(claims) => tracing::debug!(sub = %claims.sub, "Token verified"),
            Err(VerificationError::InvalidSignature) => {
                tracing::warn!("Rejected token with invalid signature")
            }
            Err(VerificationError::KeySetUnavailable(reason)) => {
                tracing::error!(reason = %reason, "Rejected token, signing keys unavailable")
            }
            Err(e) => tracing::debug!(error_code = e.error_code(), "Rejected token"),
        }
        result
    }

    async fn check(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, VerificationError> {
        let raw = RawToken::parse(token)?;
        let header = raw.header()?;

        let key = self.locate_key(&header.kid).await?;

        if header.alg != key.algorithm().as_str() {
            tracing::debug!(
                kid = %header.kid,
                token_alg = %header.alg,
                key_alg = %key.algorithm(),
                "Token algorithm does not match key"
            );
            return Err(VerificationError::InvalidSignature);
        }
        let signature = raw.signature()?;
        if !key.verify(raw.signing_input(), &signature) {
            return Err(VerificationError::InvalidSignature);
        }

        let claims: TokenClaims = raw.payload()?;

        if claims.exp <= now.timestamp() {
            return Err(VerificationError::TokenExpired);
        }

        let audience_ok = claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(&self.audience));
        if !audience_ok {
            return Err(VerificationError::AudienceMismatch);
        }

        if claims.iss.as_deref() != Some(self.issuer.as_str()) {
            return Err(VerificationError::IssuerMismatch);
        }

        Ok(claims)
    }

    /// Find the key for `kid`, refreshing the key set once on a miss.
    async fn locate_key(&self, kid: &str) -> Result<SigningKey, VerificationError> {
        let keys = self.keys.get().await?;
        if let Some(key) = keys.find(kid) {
            return Ok(key.clone());
        }

        tracing::info!(kid = %kid, "Key id not in cached JWKS, refreshing");
        self.keys.invalidate().await;
        let keys = self.keys.refresh().await?;

        keys.find(kid).cloned().ok_or_else(|| {
            tracing::warn!(kid = %kid, "Key id not found in JWKS after refresh");
            VerificationError::UnknownSigningKey(kid.to_string())
        })
    }
}
