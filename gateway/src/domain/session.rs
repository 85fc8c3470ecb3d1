// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Session lifecycle
//!
//! A [`Session`] is one logical unit of work bound to one pooled database
//! connection for its whole lifetime. It drives the state machine below over
//! an abstract [`SessionBackend`], which keeps this module free of sqlx and
//! lets the protocol be exercised without a database.
//!
//! ```text
//!   ACQUIRED ──(user variant)──> ROLE_ESCALATED ──┐
//!       │                                         │
//!       └──(admin / anonymous)──────> IN_USE <────┘
//!                                        │
//!              ┌─────────────────────────┤
//!              v                         v
//!        (user: ROLE_RESET)        (user: ROLE_RESET, best effort)
//!              │                         │
//!           COMMITTED               ROLLED_BACK
//! ```
//!
//! Closing is fused with the terminal transition: committing or rolling back
//! consumes the backend and returns the connection to the pool. Dropping an
//! unterminated session rolls the transaction back, which also covers request
//! cancellation.
//!
//! ## Invariants
//! - Exactly one of commit/rollback happens per session, followed by exactly
//!   one close. A session is never committed after an error occurred on it.
//! - The user variant escalates to the restricted role before any caller work
//!   and resets it (`RESET ROLE`, then `RESET ALL`) before the terminal
//!   action, on both the success and the error path.
//! - Driving a finalized session is a [`GatewayError::SessionState`] defect,
//!   never a recoverable condition.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::envelope::ResolveCall;
use crate::domain::identity::{SessionIdentity, SESSION_IDENTITY_KEY};
use crate::domain::role::{RoleName, RoleScope};
use crate::error::GatewayError;

/// Progression of one session through its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Acquired,
    RoleEscalated,
    InUse,
    RoleReset,
    Committed,
    RolledBack,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Committed | SessionState::RolledBack)
    }
}

/// One open transaction on one pooled connection.
///
/// Statement-level surface consumed by [`Session`]; implemented over Postgres
/// in the infrastructure layer and by a recording fake in tests.
#[async_trait]
pub trait SessionBackend: Send {
    /// `SET ROLE` to the restricted role.
    async fn escalate_role(&mut self, role: &RoleName) -> Result<(), GatewayError>;

    /// `RESET ROLE` followed by `RESET ALL`.
    async fn reset_role(&mut self) -> Result<(), GatewayError>;

    /// Sets a transaction-scoped configuration value.
    async fn apply_setting(&mut self, key: &str, value: &str) -> Result<(), GatewayError>;

    /// Invokes the resolution procedure and returns its scalar JSON result.
    async fn resolve(&mut self, call: &ResolveCall) -> Result<Value, GatewayError>;

    /// Commits the transaction and releases the connection.
    async fn commit(self: Box<Self>) -> Result<(), GatewayError>;

    /// Rolls the transaction back and releases the connection.
    async fn rollback(self: Box<Self>) -> Result<(), GatewayError>;
}

/// Produces one backend per session from the injected pool.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn SessionBackend>, GatewayError>;
}

/// A scoped database session. Constructed by the lifecycle manager; callers
/// receive it for the duration of their unit of work only.
pub struct Session {
    backend: Option<Box<dyn SessionBackend>>,
    state: SessionState,
    scope: RoleScope,
}

impl Session {
    /// Acquires a backend and applies the role-scoping policy for `scope`.
    ///
    /// If role escalation fails the session is rolled back and closed here;
    /// the caller's work never runs.
    pub async fn open(
        factory: &dyn SessionFactory,
        scope: RoleScope,
        restricted_role: &RoleName,
    ) -> Result<Self, GatewayError> {
        let backend = factory.begin().await?;
        let mut session = Session {
            backend: Some(backend),
            state: SessionState::Acquired,
            scope,
        };
        if scope.escalates() {
            match session.backend_mut("escalate role")?.escalate_role(restricted_role).await {
                Ok(()) => session.state = SessionState::RoleEscalated,
                Err(err) => {
                    session.close_rolled_back().await;
                    return Err(err);
                }
            }
        }
        session.state = SessionState::InUse;
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn scope(&self) -> RoleScope {
        self.scope
    }

    /// Sets the transaction-scoped identity key to the stringified identity,
    /// or to the empty string when none was discovered. Must run on the same
    /// session as the main query.
    pub async fn apply_identity(
        &mut self,
        identity: Option<&SessionIdentity>,
    ) -> Result<(), GatewayError> {
        let value = identity.map(SessionIdentity::as_str).unwrap_or_default();
        self.backend_mut("apply identity")?
            .apply_setting(SESSION_IDENTITY_KEY, value)
            .await
    }

    /// Forwards one call to the resolution procedure on this session.
    pub async fn resolve(&mut self, call: &ResolveCall) -> Result<Value, GatewayError> {
        self.backend_mut("resolve")?.resolve(call).await
    }

    /// Success path: reset the role if this session escalated, then commit.
    ///
    /// A failed reset must never be committed over; the session takes the
    /// rollback path and the reset error propagates.
    pub async fn finish(&mut self) -> Result<(), GatewayError> {
        if self.state != SessionState::InUse {
            return Err(GatewayError::SessionState(format!(
                "commit requested in state {:?}",
                self.state
            )));
        }
        if self.scope.escalates() {
            match self.backend_mut("reset role")?.reset_role().await {
                Ok(()) => self.state = SessionState::RoleReset,
                Err(err) => {
                    self.close_rolled_back().await;
                    return Err(err);
                }
            }
        }
        let backend = self.take_backend("commit")?;
        match backend.commit().await {
            Ok(()) => {
                self.state = SessionState::Committed;
                Ok(())
            }
            Err(err) => {
                // The driver discards the connection on a failed commit; the
                // transaction did not take effect.
                self.state = SessionState::RolledBack;
                Err(err)
            }
        }
    }

    /// Error path: best-effort role reset, then rollback. Errors raised here
    /// are logged and swallowed so the caller's original failure propagates.
    pub async fn abort(&mut self) {
        if self.state.is_terminal() {
            warn!(state = ?self.state, "abort requested on a finalized session");
            return;
        }
        if self.scope.escalates() {
            if let Some(backend) = self.backend.as_deref_mut() {
                match backend.reset_role().await {
                    Ok(()) => self.state = SessionState::RoleReset,
                    Err(err) => {
                        // Normal when the transaction is already aborted; the
                        // rollback below reverts the role as well.
                        warn!(error = %err, "role reset on the error path failed");
                    }
                }
            }
        }
        self.close_rolled_back().await;
    }

    fn backend_mut(
        &mut self,
        action: &str,
    ) -> Result<&mut (dyn SessionBackend + 'static), GatewayError> {
        if self.state.is_terminal() {
            return Err(GatewayError::SessionState(format!(
                "{action} requested in state {:?}",
                self.state
            )));
        }
        self.backend
            .as_deref_mut()
            .ok_or_else(|| GatewayError::SessionState(format!("{action} on a closed session")))
    }

    fn take_backend(&mut self, action: &str) -> Result<Box<dyn SessionBackend>, GatewayError> {
        self.backend
            .take()
            .ok_or_else(|| GatewayError::SessionState(format!("{action} on a closed session")))
    }

    async fn close_rolled_back(&mut self) {
        if let Some(backend) = self.backend.take() {
            if let Err(err) = backend.rollback().await {
                warn!(error = %err, "session rollback failed; connection is discarded");
            }
        }
        self.state = SessionState::RolledBack;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.backend.is_some() && !self.state.is_terminal() {
            // Dropping the backend rolls the transaction back.
            debug!(scope = %self.scope, "session dropped before finalizing");
        }
    }
}
