// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{auth::require_auth, auth::ProfileType, error, state::AppState};

pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/me", get(users::get_current_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(error::route_not_found)
        .method_not_allowed_fallback(error::method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(health::health, health::readiness, users::get_current_user),
    components(schemas(
        health::ReadyResponse,
        health::HealthChecks,
        users::UserMeResponse,
        ProfileType
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Users", description = "Authenticated user identity")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
