// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::ServiceKind;

/// Shared state handed to every handler.
///
/// The verifier (and the key cache inside it) is built once per process.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub service: ServiceKind,
}

impl AppState {
    pub fn new(verifier: TokenVerifier, service: ServiceKind) -> Self {
        Self {
            verifier: Arc::new(verifier),
            service,
        }
    }
}
