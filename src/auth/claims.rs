// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::profile::ProfileType;

/// Cognito attribute holding the account's profile type.
pub const PROFILE_TYPE_ATTRIBUTE: &str = "custom:profile_type";

/// Cognito attribute holding a counsellor's specialization.
pub const SPECIALIZATION_ATTRIBUTE: &str = "custom:specialization";

/// `aud` claim: a single identifier or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::One(aud) => aud == audience,
            Audience::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Claims decoded from a token payload.
///
/// Standard claims are typed; everything else the provider adds (`email`,
/// `token_use`, `custom:*` attributes, ...) is kept verbatim in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - the Cognito user id
    pub sub: String,

    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Provider-defined attributes, passed through untouched
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl TokenClaims {
    /// String-valued attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    pub fn profile_type(&self) -> Option<ProfileType> {
        self.attribute(PROFILE_TYPE_ATTRIBUTE)
            .and_then(ProfileType::parse)
    }
}

/// Authenticated user information extracted from a verified token.
///
/// This is the type handlers see; it is only ever built from claims that
/// passed verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Canonical user ID (Cognito `sub` claim)
    pub user_id: String,

    /// Customer or counsellor, when the token carries it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<ProfileType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Counsellor specialization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,

    /// Original issuer (not serialized)
    #[serde(skip)]
    pub issuer: String,

    /// Token expiration (Unix timestamp)
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Create from verified claims.
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            profile_type: claims.profile_type(),
            email: claims.attribute("email").map(str::to_string),
            name: claims.attribute("name").map(str::to_string),
            specialization: claims.attribute(SPECIALIZATION_ATTRIBUTE).map(str::to_string),
            user_id: claims.sub,
            issuer: claims.iss.unwrap_or_default(),
            expires_at: claims.exp,
        }
    }
}
