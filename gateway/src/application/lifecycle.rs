// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Session lifecycle service
//!
//! [`SessionManager`] is the single place where the commit/rollback decision
//! is made. Every database interaction in the gateway goes through
//! [`SessionManager::with_session`]: it opens a scoped session under the
//! requested role variant, runs one unit of work, then finalizes the session
//! with exactly one terminal action.
//!
//! The pool is dependency-injected through the [`SessionFactory`] seam rather
//! than reached through process-global state; tests substitute a recording
//! factory, and nothing prevents multiple managers over distinct pools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::envelope::ResolveCall;
use crate::domain::identity::SessionIdentity;
use crate::domain::role::{RoleName, RoleScope};
use crate::domain::session::{Session, SessionFactory};
use crate::error::GatewayError;

/// One unit of work executed inside a scoped session. The session is only
/// valid for the duration of `execute`; the manager finalizes it afterwards.
#[async_trait]
pub trait SessionWork: Send {
    type Output: Send;

    async fn execute(self, session: &mut Session) -> Result<Self::Output, GatewayError>;
}

/// Hands out scoped sessions with the role policy applied.
#[derive(Clone)]
pub struct SessionManager {
    factory: Arc<dyn SessionFactory>,
    restricted_role: RoleName,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn SessionFactory>, restricted_role: RoleName) -> Self {
        SessionManager {
            factory,
            restricted_role,
        }
    }

    /// Runs `work` inside one session acquired under `scope`.
    ///
    /// On success the session is committed then closed; on failure it is
    /// rolled back then closed and the work's error propagates. Rollback
    /// failures are logged and swallowed so they never mask the original
    /// error.
    pub async fn with_session<W>(&self, scope: RoleScope, work: W) -> Result<W::Output, GatewayError>
    where
        W: SessionWork,
    {
        let mut session =
            Session::open(self.factory.as_ref(), scope, &self.restricted_role).await?;
        match work.execute(&mut session).await {
            Ok(output) => {
                session.finish().await?;
                Ok(output)
            }
            Err(err) => {
                session.abort().await;
                Err(err)
            }
        }
    }
}

/// The gateway's one production unit of work: optionally run the
/// session-variable injector, then forward a call to the resolution
/// procedure.
pub struct ResolveWork<'a> {
    call: &'a ResolveCall,
    identity: Option<&'a SessionIdentity>,
    inject_identity: bool,
}

impl<'a> ResolveWork<'a> {
    /// Forward the call as-is (admin and anonymous variants, bootstrap,
    /// schema export).
    pub fn plain(call: &'a ResolveCall) -> Self {
        ResolveWork {
            call,
            identity: None,
            inject_identity: false,
        }
    }

    /// Inject the bootstrapped identity before forwarding (user variant).
    /// A missing identity is injected as the empty string.
    pub fn scoped(call: &'a ResolveCall, identity: Option<&'a SessionIdentity>) -> Self {
        ResolveWork {
            call,
            identity,
            inject_identity: true,
        }
    }
}

#[async_trait]
impl SessionWork for ResolveWork<'_> {
    type Output = Value;

    async fn execute(self, session: &mut Session) -> Result<Value, GatewayError> {
        if self.inject_identity {
            session.apply_identity(self.identity).await?;
        }
        session.resolve(self.call).await
    }
}
