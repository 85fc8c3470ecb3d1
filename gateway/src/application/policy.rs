// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Identity bootstrap policy
//!
//! "Become the first account": before a user-scoped request runs, a separate
//! admin-privileged session asks the resolution procedure for the first
//! account record and the request proceeds as that account.
//!
//! This is a development bootstrapping shortcut, not authentication. The
//! discovered identity is whatever record happens to be visible first. It
//! must not be generalized into a security boundary; production deployments
//! replace it with a real authentication mechanism before relying on the
//! session-variable injector for access control.

use serde_json::Value;

use crate::application::lifecycle::{ResolveWork, SessionManager};
use crate::domain::envelope::ResolveCall;
use crate::domain::identity::SessionIdentity;
use crate::domain::role::RoleScope;
use crate::error::GatewayError;

/// Fixed bootstrap query; the shape of the `account` collection is part of
/// the deployed schema contract.
pub const FIRST_ACCOUNT_QUERY: &str =
    "{ accountCollection(first: 1) { edges { node { id } } } }";

const IDENTITY_POINTER: &str = "/data/accountCollection/edges/0/node/id";

/// Discovers the implicit identity on its own admin session, keeping its
/// failure domain separate from the request's main session.
pub async fn become_first_account(
    sessions: &SessionManager,
) -> Result<SessionIdentity, GatewayError> {
    let call = ResolveCall::query_only(FIRST_ACCOUNT_QUERY);
    let result = sessions
        .with_session(RoleScope::Admin, ResolveWork::plain(&call))
        .await?;
    extract_identity(&result)
}

fn extract_identity(result: &Value) -> Result<SessionIdentity, GatewayError> {
    result
        .pointer(IDENTITY_POINTER)
        .and_then(Value::as_str)
        .map(SessionIdentity::new)
        .ok_or_else(|| {
            GatewayError::IdentityNotFound(
                "bootstrap query returned no account record".to_string(),
            )
        })
}
