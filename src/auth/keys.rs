// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing keys published by the identity provider.
//!
//! A [`Jwk`] is the raw JSON entry from the JWKS document. It is converted
//! into a [`SigningKey`] (decoded public material plus a fixed algorithm)
//! when a [`KeySet`] is built. Entries that cannot be used for signature
//! verification are skipped at that point, so a lookup for them later is an
//! ordinary unknown-key miss.

use std::fmt;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use ring::signature::{self, RsaPublicKeyComponents, UnparsedPublicKey};
use serde::Deserialize;

/// JSON Web Key as published on the JWKS endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Key type ("RSA" or "EC").
    pub kty: String,

    /// Algorithm (e.g. "RS256"). Optional in the JWK format.
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,

    /// EC curve name.
    #[serde(default)]
    pub crv: Option<String>,

    /// EC x coordinate (base64url).
    #[serde(default)]
    pub x: Option<String>,

    /// EC y coordinate (base64url).
    #[serde(default)]
    pub y: Option<String>,
}

/// JWKS response body. A body without `keys` fails to deserialize.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksDocument {
    pub keys: Vec<Jwk>,
}

/// Why a JWK could not be turned into a [`SigningKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("unsupported key type '{0}'")]
    UnsupportedKeyType(String),
    #[error("unsupported algorithm '{0}'")]
    UnsupportedAlgorithm(String),
    #[error("unsupported curve '{0}'")]
    UnsupportedCurve(String),
    #[error("key use '{0}' is not 'sig'")]
    NotForSigning(String),
    #[error("missing key field '{0}'")]
    MissingField(&'static str),
    #[error("key field '{0}' is not valid base64url")]
    InvalidEncoding(&'static str),
}

/// Signature algorithms accepted from the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    RS256,
    RS384,
    RS512,
    ES256,
    ES384,
}

impl Algorithm {
    /// JOSE name of the algorithm, as it appears in `alg`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::RS256 => "RS256",
            Algorithm::RS384 => "RS384",
            Algorithm::RS512 => "RS512",
            Algorithm::ES256 => "ES256",
            Algorithm::ES384 => "ES384",
        }
    }

    /// Parse a JOSE algorithm name (case-sensitive, as JOSE requires).
    pub fn from_name(name: &str) -> Option<Algorithm> {
        match name {
            "RS256" => Some(Algorithm::RS256),
            "RS384" => Some(Algorithm::RS384),
            "RS512" => Some(Algorithm::RS512),
            "ES256" => Some(Algorithm::ES256),
            "ES384" => Some(Algorithm::ES384),
            _ => None,
        }
    }

    fn is_rsa(&self) -> bool {
        matches!(self, Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PublicKey {
    Rsa { n: Vec<u8>, e: Vec<u8> },
    /// Uncompressed SEC1 point (`0x04 || x || y`).
    Ec { point: Vec<u8> },
}

/// One verified-usable key from the provider's key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    kid: String,
    algorithm: Algorithm,
    material: PublicKey,
}

impl SigningKey {
    /// Build a signing key from a JWK entry.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, KeyError> {
        if let Some(key_use) = jwk.key_use.as_deref() {
            if key_use != "sig" {
                return Err(KeyError::NotForSigning(key_use.to_string()));
            }
        }

        let (algorithm, material) = match jwk.kty.as_str() {
            "RSA" => {
                let algorithm = match jwk.alg.as_deref() {
                    None => Algorithm::RS256,
                    Some(name) => Algorithm::from_name(name)
                        .filter(Algorithm::is_rsa)
                        .ok_or_else(|| KeyError::UnsupportedAlgorithm(name.to_string()))?,
                };
                let n = decode_field(jwk.n.as_deref(), "n")?;
                let e = decode_field(jwk.e.as_deref(), "e")?;
                (algorithm, PublicKey::Rsa { n, e })
            }
            "EC" => {
                let crv = jwk.crv.as_deref().ok_or(KeyError::MissingField("crv"))?;
                let algorithm = match crv {
                    "P-256" => Algorithm::ES256,
                    "P-384" => Algorithm::ES384,
                    other => return Err(KeyError::UnsupportedCurve(other.to_string())),
                };
                if let Some(name) = jwk.alg.as_deref() {
                    if name != algorithm.as_str() {
                        return Err(KeyError::UnsupportedAlgorithm(name.to_string()));
                    }
                }
                let x = decode_field(jwk.x.as_deref(), "x")?;
                let y = decode_field(jwk.y.as_deref(), "y")?;
                let mut point = Vec::with_capacity(1 + x.len() + y.len());
                point.push(0x04);
                point.extend_from_slice(&x);
                point.extend_from_slice(&y);
                (algorithm, PublicKey::Ec { point })
            }
            other => return Err(KeyError::UnsupportedKeyType(other.to_string())),
        };

        Ok(Self {
            kid: jwk.kid.clone(),
            algorithm,
            material,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Check `signature` over the exact `message` bytes.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match &self.material {
            PublicKey::Rsa { n, e } => {
                let params = match self.algorithm {
                    Algorithm::RS256 => &signature::RSA_PKCS1_2048_8192_SHA256,
                    Algorithm::RS384 => &signature::RSA_PKCS1_2048_8192_SHA384,
                    Algorithm::RS512 => &signature::RSA_PKCS1_2048_8192_SHA512,
                    Algorithm::ES256 | Algorithm::ES384 => return false,
                };
                RsaPublicKeyComponents {
                    n: n.as_slice(),
                    e: e.as_slice(),
                }
                .verify(params, message, signature)
                .is_ok()
            }
            PublicKey::Ec { point } => {
                let params = match self.algorithm {
                    Algorithm::ES256 => &signature::ECDSA_P256_SHA256_FIXED,
                    Algorithm::ES384 => &signature::ECDSA_P384_SHA384_FIXED,
                    Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => return false,
                };
                UnparsedPublicKey::new(params, point)
                    .verify(message, signature)
                    .is_ok()
            }
        }
    }
}

fn decode_field(value: Option<&str>, name: &'static str) -> Result<Vec<u8>, KeyError> {
    let value = value.ok_or(KeyError::MissingField(name))?;
    Base64UrlUnpadded::decode_vec(value).map_err(|_| KeyError::InvalidEncoding(name))
}

/// Snapshot of the provider's keys from one fetch.
///
/// Never mutated after construction; a refresh builds a new one.
#[derive(Debug, Clone)]
pub struct KeySet {
    keys: Vec<SigningKey>,
    fetched_at: DateTime<Utc>,
}

impl KeySet {
    /// Build a key set. Key ids are unique; the first occurrence wins.
    pub fn new(keys: Vec<SigningKey>, fetched_at: DateTime<Utc>) -> Self {
        let mut unique: Vec<SigningKey> = Vec::with_capacity(keys.len());
        for key in keys {
            if unique.iter().any(|k| k.kid == key.kid) {
                tracing::warn!(kid = %key.kid, "Duplicate key id in JWKS, keeping the first");
                continue;
            }
            unique.push(key);
        }
        Self {
            keys: unique,
            fetched_at,
        }
    }

    /// Build a key set from a JWKS document, skipping unusable entries.
    pub fn from_document(document: &JwksDocument, fetched_at: DateTime<Utc>) -> Self {
        let keys = document
            .keys
            .iter()
            .filter_map(|jwk| match SigningKey::from_jwk(jwk) {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::debug!(kid = %jwk.kid, error = %e, "Skipping JWK");
                    None
                }
            })
            .collect();
        Self::new(keys, fetched_at)
    }

    /// Find the key with this id.
    pub fn find(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key ids in fetch order.
    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.kid.as_str())
    }
}
