// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Guards a whole router subtree: requests without a valid bearer token are
//! answered with 401 before any handler runs, and the verified user is
//! stored in request extensions for the `Auth` extractor.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/me", get(get_current_user))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::extractor::authenticate;
use crate::state::AppState;

/// Authentication middleware function.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(request.headers(), &state).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
