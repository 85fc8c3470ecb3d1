// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL connection pool
//!
//! Wraps `sqlx::postgres::PgPool` in a thin `Database` newtype that is
//! injected into the session factory rather than reached through global
//! state. Pool geometry follows the configuration: the base size is kept as
//! idle minimum, overflow raises the hard ceiling, and every checkout is
//! liveness-checked before use.

use sqlx::postgres::{PgPool, PgPoolOptions, Postgres};
use sqlx::Transaction;
use tracing::info;

use crate::config::Settings;
use crate::error::GatewayError;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connects at process start. An unreachable database is a boot failure,
    /// not something to retry here.
    pub async fn connect(settings: &Settings) -> Result<Self, GatewayError> {
        let options = PgPoolOptions::new()
            .min_connections(settings.database_pool_size)
            .max_connections(settings.database_pool_size + settings.database_max_overflow)
            .acquire_timeout(settings.database_pool_timeout)
            .test_before_acquire(true);
        let pool = options
            .connect(&settings.database_url())
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        info!(
            pool_size = settings.database_pool_size,
            max_overflow = settings.database_max_overflow,
            timeout_secs = settings.database_pool_timeout.as_secs(),
            "database pool ready"
        );
        Ok(Self { pool })
    }

    /// Wraps an already-built pool; used by tests that manage their own.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begins one transaction on one checked-out connection. Waiting past the
    /// acquisition timeout is pool exhaustion; anything else at this stage is
    /// a connectivity failure.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, GatewayError> {
        self.pool.begin().await.map_err(GatewayError::from_acquire)
    }

    /// Drains the pool at shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
