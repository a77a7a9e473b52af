//! Daemon configuration from the environment.
//!
//! `main.rs` loads `.env.local` (if present) before calling
//! [`DaemonConfig::from_env`]. Parsing itself goes through
//! [`DaemonConfig::from_lookup`] so tests never touch process env.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, CorsLayer};

/// Full bind address, e.g. `127.0.0.1:8080`. Wins over `PORT`.
pub const ENV_ADDR: &str = "DESK_DAEMON_ADDR";
/// Port to bind on all interfaces when `DESK_DAEMON_ADDR` is unset.
pub const ENV_PORT: &str = "PORT";
/// Comma-separated CORS origin allow-list.
pub const ENV_ALLOWED_ORIGINS: &str = "DESK_ALLOWED_ORIGINS";

pub const DEFAULT_PORT: u16 = 3001;

/// Dashboard front-ends allowed to call the API when no allow-list is set.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://dashboardzerodha-1.onrender.com",
    "http://localhost:5174",
    "https://backendzerodha-3xet.onrender.com",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub addr: SocketAddr,
    /// Postgres URL. `None` runs the daemon on the in-memory store.
    pub database_url: Option<String>,
    pub allowed_origins: Vec<String>,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let addr = match (var(ENV_ADDR), var(ENV_PORT)) {
            (Some(a), _) => a
                .parse::<SocketAddr>()
                .with_context(|| format!("invalid {ENV_ADDR}: {a:?}"))?,
            (None, Some(p)) => {
                let port = p
                    .parse::<u16>()
                    .with_context(|| format!("invalid {ENV_PORT}: {p:?}"))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        };

        let allowed_origins = match var(ENV_ALLOWED_ORIGINS) {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            addr,
            database_url: var(desk_db::ENV_DB_URL),
            allowed_origins,
        })
    }

    /// CORS: allow-listed origins only, with credentials (session cookies).
    ///
    /// Request headers are mirrored because a wildcard is not permitted
    /// together with credentials.
    pub fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    }
}
