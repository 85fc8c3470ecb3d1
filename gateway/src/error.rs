// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Gateway error taxonomy.
//!
//! Every fallible operation in the crate surfaces a [`GatewayError`]. The
//! variants map one-to-one onto the failure domains of the session protocol;
//! HTTP status mapping lives in the presentation layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The database was unreachable, either at pool construction (a boot
    /// failure) or when a fresh physical connection was needed later.
    #[error("database connection failed: {0}")]
    Connection(String),

    /// No pooled connection became available within the acquisition timeout.
    #[error("connection pool exhausted: {0}")]
    PoolExhausted(String),

    /// The identity bootstrap query found no account record to act as.
    #[error("identity bootstrap failed: {0}")]
    IdentityNotFound(String),

    /// A session was driven past a terminal state. This indicates a defect in
    /// the lifecycle code, never a runtime condition, and propagates unmasked.
    #[error("session state violation: {0}")]
    SessionState(String),

    /// A statement failed at the database level. The database's own message is
    /// carried verbatim.
    #[error("remote execution failed: {0}")]
    RemoteExecution(String),

    /// The request envelope could not be serialized for forwarding.
    #[error("invalid request envelope: {0}")]
    Envelope(String),
}

impl GatewayError {
    /// Maps driver errors raised while acquiring a session from the pool.
    ///
    /// A timed-out acquisition means the pool is saturated; everything else at
    /// this stage is a connectivity problem.
    pub fn from_acquire(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => GatewayError::PoolExhausted(err.to_string()),
            other => GatewayError::Connection(other.to_string()),
        }
    }

    /// Maps driver errors raised while executing statements on an active
    /// session.
    pub fn from_execution(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(e) => GatewayError::Connection(e.to_string()),
            sqlx::Error::PoolClosed => GatewayError::Connection(err.to_string()),
            sqlx::Error::Database(e) => GatewayError::RemoteExecution(e.to_string()),
            other => GatewayError::RemoteExecution(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_maps_to_exhaustion() {
        let err = GatewayError::from_acquire(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, GatewayError::PoolExhausted(_)));
    }

    #[test]
    fn test_acquire_io_failure_maps_to_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = GatewayError::from_acquire(sqlx::Error::Io(io));
        assert!(matches!(err, GatewayError::Connection(_)));
    }

    #[test]
    fn test_execution_failure_maps_to_remote_execution() {
        let err = GatewayError::from_execution(sqlx::Error::Protocol("bad frame".into()));
        assert!(matches!(err, GatewayError::RemoteExecution(_)));
    }

    #[test]
    fn test_execution_io_failure_maps_to_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err = GatewayError::from_execution(sqlx::Error::Io(io));
        assert!(matches!(err, GatewayError::Connection(_)));
    }
}
