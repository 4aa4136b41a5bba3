// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test-only token signing and a fake key store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use serde_json::{json, Value};

use super::error::VerificationError;
use super::jwks::{KeySetCache, KeyStore};
use super::keys::{JwksDocument, KeySet, SigningKey};
use super::verifier::TokenVerifier;
use crate::config::ServiceKind;
use crate::state::AppState;

pub const ISSUER: &str = "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_TestPool";
pub const AUDIENCE: &str = "test-client-id";

/// ECDSA P-256 key pair that signs test tokens.
pub struct TestSigner {
    kid: String,
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
}

impl TestSigner {
    pub fn generate(kid: &str) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng).unwrap();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
                .unwrap();
        Self {
            kid: kid.to_string(),
            key_pair,
            rng,
        }
    }

    pub fn jwk(&self) -> Value {
        // Uncompressed point: 0x04 || x (32 bytes) || y (32 bytes)
        let point = self.key_pair.public_key().as_ref();
        json!({
            "kid": self.kid,
            "kty": "EC",
            "crv": "P-256",
            "alg": "ES256",
            "use": "sig",
            "x": URL_SAFE_NO_PAD.encode(&point[1..33]),
            "y": URL_SAFE_NO_PAD.encode(&point[33..65]),
        })
    }

    pub fn signing_key(&self) -> SigningKey {
        SigningKey::from_jwk(&serde_json::from_value(self.jwk()).unwrap()).unwrap()
    }

    pub fn sign_bytes(&self, message: &[u8]) -> Vec<u8> {
        self.key_pair
            .sign(&self.rng, message)
            .unwrap()
            .as_ref()
            .to_vec()
    }

    /// Sign claims with a standard `ES256` header carrying this signer's kid.
    pub fn sign(&self, claims: &Value) -> String {
        self.sign_with_header(
            &json!({ "alg": "ES256", "kid": self.kid, "typ": "JWT" }),
            claims,
        )
    }

    pub fn sign_with_header(&self, header: &Value, claims: &Value) -> String {
        let message = format!("{}.{}", encode_json(header), encode_json(claims));
        let sig = self.sign_bytes(message.as_bytes());
        format!("{message}.{}", URL_SAFE_NO_PAD.encode(sig))
    }
}

pub fn encode_json(value: &Value) -> String {
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
}

/// Claims that pass every check at `now`.
pub fn valid_claims(now: i64) -> Value {
    json!({
        "sub": "user-123",
        "iss": ISSUER,
        "aud": AUDIENCE,
        "iat": now - 60,
        "exp": now + 3600,
        "token_use": "id",
        "email": "pat@example.com",
        "custom:profile_type": "counsellor",
    })
}

pub fn key_set(signers: &[&TestSigner]) -> KeySet {
    let document: JwksDocument = serde_json::from_value(jwks_body(signers)).unwrap();
    KeySet::from_document(&document, Utc::now())
}

pub fn jwks_body(signers: &[&TestSigner]) -> Value {
    json!({ "keys": signers.iter().map(|s| s.jwk()).collect::<Vec<_>>() })
}

/// App state whose key cache fetches from `jwks_url`.
pub fn test_state(jwks_url: &str) -> AppState {
    let keys = KeySetCache::new(jwks_url, Duration::from_secs(2));
    AppState::new(TokenVerifier::new(keys, ISSUER, AUDIENCE), ServiceKind::User)
}

/// In-memory key store. `refresh` publishes whatever `upstream` holds.
pub struct FakeKeyStore {
    cached: Mutex<Option<Arc<KeySet>>>,
    upstream: Mutex<Result<Arc<KeySet>, VerificationError>>,
    refreshes: AtomicUsize,
}

impl FakeKeyStore {
    pub fn primed(set: KeySet) -> Self {
        let set = Arc::new(set);
        Self {
            cached: Mutex::new(Some(set.clone())),
            upstream: Mutex::new(Ok(set)),
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn empty(upstream: KeySet) -> Self {
        Self {
            cached: Mutex::new(None),
            upstream: Mutex::new(Ok(Arc::new(upstream))),
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn set_upstream(&self, upstream: Result<KeySet, VerificationError>) {
        *self.upstream.lock().unwrap() = upstream.map(Arc::new);
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn cached(&self) -> Option<Arc<KeySet>> {
        self.cached.lock().unwrap().clone()
    }
}

impl KeyStore for FakeKeyStore {
    async fn get(&self) -> Result<Arc<KeySet>, VerificationError> {
        let cached = self.cached.lock().unwrap().clone();
        match cached {
            Some(set) => Ok(set),
            None => self.refresh().await,
        }
    }

    async fn refresh(&self) -> Result<Arc<KeySet>, VerificationError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        let fetched = self.upstream.lock().unwrap().clone()?;
        *self.cached.lock().unwrap() = Some(fetched.clone());
        Ok(fetched)
    }

    async fn invalidate(&self) {
        *self.cached.lock().unwrap() = None;
    }
}
