// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile types carried in the `custom:profile_type` attribute.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of account a user registered as.
///
/// - `Customer` - books sessions and messages counsellors
/// - `Counsellor` - listed in the counsellor directory, has a specialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    Customer,
    Counsellor,
}

impl ProfileType {
    /// Parse profile type from string (case-insensitive).
    pub fn parse(s: &str) -> Option<ProfileType> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Some(ProfileType::Customer),
            "counsellor" => Some(ProfileType::Counsellor),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProfileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileType::Customer => write!(f, "customer"),
            ProfileType::Counsellor => write!(f, "counsellor"),
        }
    }
}
