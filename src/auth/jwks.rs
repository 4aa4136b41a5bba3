// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Security
//!
//! - The cached set is only replaced wholesale, so readers never see a
//!   partially updated set
//! - A failed refresh leaves the previous set in place
//! - Every fetch is bounded by the client timeout
//! - Concurrent `get` calls on an empty cache share a single fetch
//!
//! ## Usage
//!
//! Build one `KeySetCache` per process in main.rs and hand it to the
//! `TokenVerifier` stored in `AppState`.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use super::error::VerificationError;
use super::keys::{JwksDocument, KeySet};

/// Default timeout for one JWKS fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Path of the key-set document relative to the issuer.
const WELL_KNOWN_JWKS_PATH: &str = "/.well-known/jwks.json";

/// Key-set URL the provider publishes for `issuer`.
pub fn jwks_url_for_issuer(issuer: &str) -> String {
    format!("{}{WELL_KNOWN_JWKS_PATH}", issuer.trim_end_matches('/'))
}

/// Source of the issuer's signing keys.
///
/// `TokenVerifier` only talks to keys through this trait, so tests can swap in
/// an in-memory store.
pub trait KeyStore: Send + Sync {
    /// Current key set, fetching it if nothing usable is cached.
    fn get(&self) -> impl Future<Output = Result<Arc<KeySet>, VerificationError>> + Send;

    /// Fetch unconditionally and replace the cached set on success.
    fn refresh(&self) -> impl Future<Output = Result<Arc<KeySet>, VerificationError>> + Send;

    /// Drop the cached set.
    fn invalidate(&self) -> impl Future<Output = ()> + Send;
}

/// JWKS cache entry.
struct CacheEntry {
    keys: Arc<KeySet>,
    fetched: Instant,
}

/// JWKS cache backed by the provider's well-known endpoint.
#[derive(Clone)]
pub struct KeySetCache {
    /// JWKS URL (Cognito well-known endpoint)
    jwks_url: String,
    /// Cached sets older than this are treated as absent
    max_age: Option<Duration>,
    /// Cached JWKS
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// Held while `get` fills an empty cache
    fill: Arc<Mutex<()>>,
    /// HTTP client
    client: reqwest::Client,
}

impl KeySetCache {
    /// Create a cache for the key set at `jwks_url`.
    ///
    /// # Arguments
    /// - `jwks_url`: e.g. `https://cognito-idp.us-east-1.amazonaws.com/us-east-1_abc/.well-known/jwks.json`
    /// - `timeout`: upper bound for a single fetch
    pub fn new(jwks_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build JWKS HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url: jwks_url.into(),
            max_age: None,
            cache: Arc::new(RwLock::new(None)),
            fill: Arc::new(Mutex::new(())),
            client,
        }
    }

    /// Create a cache for the well-known key set of `issuer`.
    pub fn for_issuer(issuer: &str, timeout: Duration) -> Self {
        Self::new(jwks_url_for_issuer(issuer), timeout)
    }

    /// Treat cached sets older than `max_age` as absent.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Check if a usable key set is currently cached.
    pub async fn is_cached(&self) -> bool {
        self.cached().await.is_some()
    }

    async fn cached(&self) -> Option<Arc<KeySet>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|entry| self.max_age.is_none_or(|age| entry.fetched.elapsed() < age))
            .map(|entry| entry.keys.clone())
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch(&self) -> Result<KeySet, VerificationError> {
        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %self.jwks_url, error = %e, "Failed to fetch JWKS");
                VerificationError::KeySetUnavailable(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(
                url = %self.jwks_url,
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(VerificationError::KeySetUnavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let document: JwksDocument = response.json().await.map_err(|e| {
            tracing::error!(url = %self.jwks_url, error = %e, "Failed to parse JWKS response");
            VerificationError::KeySetUnavailable(e.to_string())
        })?;

        let keys = KeySet::from_document(&document, Utc::now());
        tracing::info!(key_count = keys.len(), "JWKS fetched");
        Ok(keys)
    }
}

impl KeyStore for KeySetCache {
    async fn get(&self) -> Result<Arc<KeySet>, VerificationError> {
        if let Some(keys) = self.cached().await {
            return Ok(keys);
        }

        let _fill = self.fill.lock().await;
        // Another caller may have filled the cache while we waited.
        if let Some(keys) = self.cached().await {
            return Ok(keys);
        }
        self.refresh().await
    }

    async fn refresh(&self) -> Result<Arc<KeySet>, VerificationError> {
        // Fetch outside the lock; concurrent refreshes race and the last
        // successful one to finish wins.
        let keys = Arc::new(self.fetch().await?);

        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            keys: keys.clone(),
            fetched: Instant::now(),
        });

        Ok(keys)
    }

    async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }
}
