// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Service entry point: configuration, pool construction, HTTP serving, and
//! graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use portico_gateway::application::forwarder::GraphqlForwarder;
use portico_gateway::application::lifecycle::SessionManager;
use portico_gateway::config::Settings;
use portico_gateway::infrastructure::db::Database;
use portico_gateway::infrastructure::postgres::PgSessionFactory;
use portico_gateway::presentation::api::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let settings = Settings::from_env().context("invalid configuration")?;
    info!(
        "starting {} v{}",
        settings.project_name, settings.api_version
    );

    let db = Database::connect(&settings)
        .await
        .context("failed to connect to database")?;

    let factory = Arc::new(PgSessionFactory::new(db.clone(), settings.database_echo));
    let sessions = SessionManager::new(factory, settings.database_role.clone());
    let forwarder = Arc::new(GraphqlForwarder::new(sessions));

    let state = AppState {
        forwarder,
        variant: settings.graphql_variant,
        service: settings.project_name.clone(),
        version: settings.api_version.clone(),
        started_at: Instant::now(),
    };
    let app = api::app(state, &settings);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    info!(
        "listening on {} (variant: {}, mount: {:?})",
        settings.bind_addr, settings.graphql_variant, settings.mount_path
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    db.close().await;
    info!("shutdown complete");
    Ok(())
}

fn init_logging() {
    let level = std::env::var("SERVICE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, starting graceful shutdown");
}
