// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the startup validation that
//! has to pass before the verification core is constructed.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SERVICE_NAME` | `user`, `messaging` or `counsellor` | `user` |
//! | `HOST` | Server bind host (IP literal or host name) | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` / `5002` / `5001` by service |
//! | `AWS_REGION` | Cognito user pool region | `us-east-1` |
//! | `COGNITO_USER_POOL_ID` | User pool id, used to derive the issuer | Required unless `AUTH_ISSUER` |
//! | `COGNITO_USER_POOL_CLIENT_ID` | App client id, the expected audience | Required |
//! | `AUTH_ISSUER` | Explicit issuer override | Derived from the pool |
//! | `AUTH_JWKS_URL` | Explicit JWKS URL override | `<issuer>/.well-known/jwks.json` |
//! | `JWKS_FETCH_TIMEOUT_SECS` | Timeout for one JWKS fetch | `5` |
//! | `JWKS_MAX_AGE_SECS` | Refetch cached keys older than this | No expiry |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::IpAddr;
use std::time::Duration;

use url::{Host, Url};

use crate::auth::jwks::{jwks_url_for_issuer, DEFAULT_FETCH_TIMEOUT};

pub const SERVICE_NAME_ENV: &str = "SERVICE_NAME";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const AWS_REGION_ENV: &str = "AWS_REGION";
pub const USER_POOL_ID_ENV: &str = "COGNITO_USER_POOL_ID";
pub const USER_POOL_CLIENT_ID_ENV: &str = "COGNITO_USER_POOL_CLIENT_ID";
pub const ISSUER_ENV: &str = "AUTH_ISSUER";
pub const JWKS_URL_ENV: &str = "AUTH_JWKS_URL";
pub const JWKS_FETCH_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT_SECS";
pub const JWKS_MAX_AGE_ENV: &str = "JWKS_MAX_AGE_SECS";

/// Logging format selector (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_REGION: &str = "us-east-1";

/// Invalid or missing startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },
    #[error("JWKS URL must use https (http is only allowed for loopback hosts): {0}")]
    InsecureJwksUrl(String),
    #[error("{var} has invalid value '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

/// Which of the three services this process runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    User,
    Messaging,
    Counsellor,
}

impl ServiceKind {
    pub fn parse(s: &str) -> Option<ServiceKind> {
        match s.trim().to_lowercase().as_str() {
            "user" | "user-service" => Some(ServiceKind::User),
            "messaging" | "messaging-service" => Some(ServiceKind::Messaging),
            "counsellor" | "counsellor-service" => Some(ServiceKind::Counsellor),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKind::User => "User Service",
            ServiceKind::Messaging => "Messaging Service",
            ServiceKind::Counsellor => "Counsellors Service",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            ServiceKind::User => 5000,
            ServiceKind::Counsellor => 5001,
            ServiceKind::Messaging => 5002,
        }
    }
}

/// What the verification core needs: one issuer, one audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub issuer: String,
    pub audience: String,
    pub jwks_url: String,
    pub fetch_timeout: Duration,
    pub max_age: Option<Duration>,
}

/// Full process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub service: ServiceKind,
    /// IP literal or host name; names are resolved when binding
    pub host: String,
    pub port: u16,
    pub auth: AuthSettings,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings from any name → value lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let service = match get(SERVICE_NAME_ENV) {
            Some(value) => ServiceKind::parse(&value).ok_or(ConfigError::InvalidValue {
                var: SERVICE_NAME_ENV,
                value,
            })?,
            None => ServiceKind::User,
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(value) => parse_number::<u16>(PORT_ENV, value)?,
            None => service.default_port(),
        };
        if host.parse::<IpAddr>().is_err() && Host::parse(&host).is_err() {
            return Err(ConfigError::InvalidValue {
                var: HOST_ENV,
                value: host,
            });
        }

        let (issuer, issuer_var) = match get(ISSUER_ENV) {
            Some(issuer) => (issuer, ISSUER_ENV),
            None => {
                let pool_id = get(USER_POOL_ID_ENV).ok_or(ConfigError::Missing(USER_POOL_ID_ENV))?;
                let region = get(AWS_REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_string());
                (cognito_issuer(&region, &pool_id), USER_POOL_ID_ENV)
            }
        };
        Url::parse(&issuer).map_err(|e| ConfigError::InvalidUrl {
            var: issuer_var,
            reason: e.to_string(),
        })?;

        let audience =
            get(USER_POOL_CLIENT_ID_ENV).ok_or(ConfigError::Missing(USER_POOL_CLIENT_ID_ENV))?;

        let jwks_url = get(JWKS_URL_ENV).unwrap_or_else(|| jwks_url_for_issuer(&issuer));
        validate_jwks_url(&jwks_url)?;

        let fetch_timeout = match get(JWKS_FETCH_TIMEOUT_ENV) {
            Some(value) => Duration::from_secs(parse_number::<u64>(JWKS_FETCH_TIMEOUT_ENV, value)?),
            None => DEFAULT_FETCH_TIMEOUT,
        };
        let max_age = get(JWKS_MAX_AGE_ENV)
            .map(|value| parse_number::<u64>(JWKS_MAX_AGE_ENV, value).map(Duration::from_secs))
            .transpose()?;

        Ok(Self {
            service,
            host,
            port,
            auth: AuthSettings {
                issuer,
                audience,
                jwks_url,
                fetch_timeout,
                max_age,
            },
        })
    }
}

/// Issuer URI of a Cognito user pool.
pub fn cognito_issuer(region: &str, user_pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}")
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
}

fn validate_jwks_url(jwks_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(jwks_url).map_err(|e| ConfigError::InvalidUrl {
        var: JWKS_URL_ENV,
        reason: e.to_string(),
    })?;

    let loopback = matches!(
        url.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]")
    );
    match url.scheme() {
        "https" => Ok(()),
        "http" if loopback => Ok(()),
        _ => Err(ConfigError::InsecureJwksUrl(jwks_url.to_string())),
    }
}
