// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wellness_gate::{
    api::router,
    auth::{KeySetCache, TokenVerifier},
    config::{Settings, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let settings = Settings::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        service = %settings.service.display_name(),
        host = %settings.host,
        port = settings.port,
        issuer = %settings.auth.issuer,
        jwks_url = %settings.auth.jwks_url,
        "Configuration loaded"
    );

    let mut keys = KeySetCache::new(&settings.auth.jwks_url, settings.auth.fetch_timeout);
    if let Some(max_age) = settings.auth.max_age {
        keys = keys.with_max_age(max_age);
    }
    let verifier = TokenVerifier::new(keys, &settings.auth.issuer, &settings.auth.audience);
    let app = router(AppState::new(verifier, settings.service));

    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port)).await?;
    info!(
        "{} listening on http://{} (docs at /docs)",
        settings.service.display_name(),
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
