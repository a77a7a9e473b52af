//! desk-daemon entry point.
//!
//! Thin on purpose: load config, set up tracing, pick the storage backend,
//! wire middleware and serve. Handlers live in `routes.rs`.

use std::sync::Arc;

use anyhow::Context;
use desk_daemon::{config::DaemonConfig, routes, state::AppState};
use desk_db::PgStore;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cfg = DaemonConfig::from_env()?;

    // A configured database that cannot be reached is fatal.
    let shared = Arc::new(match &cfg.database_url {
        Some(url) => {
            let pool = desk_db::connect(url).await?;
            desk_db::migrate(&pool).await?;
            info!("connected to Postgres");
            AppState::new(Arc::new(PgStore::new(pool)), "postgres")
        }
        None => {
            warn!(
                "{} not set; serving from the in-memory store (lost on restart)",
                desk_db::ENV_DB_URL
            );
            AppState::in_memory()
        }
    });

    let app = routes::build_router(shared)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cfg.cors_layer());

    info!("desk-daemon listening on http://{}", cfg.addr);

    axum::serve(tokio::net::TcpListener::bind(cfg.addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler failed; shutting down");
    }
    info!("shutdown requested");
}
