// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Role scoping for database sessions.
//!
//! A [`RoleScope`] selects which privilege wrapper a session gets: `Admin`
//! runs on the pool credential untouched, `User` escalates to a restricted
//! role for the duration of the session, `Anonymous` is admin-equivalent in
//! privilege handling but reserved for unauthenticated traffic.
//!
//! ## Invariants
//! - The restricted role is interpolated into `SET ROLE` as a quoted
//!   identifier, so [`RoleName`] only accepts values from
//!   [`KNOWN_RESTRICTED_ROLES`] that are also bare SQL identifiers. Role names
//!   never come from request data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Roles the user variant is allowed to assume. Extending this list is a code
/// change on purpose.
pub const KNOWN_RESTRICTED_ROLES: &[&str] = &["app_user"];

#[derive(Debug, Error)]
#[error("invalid role configuration {value:?}: {reason}")]
pub struct InvalidRole {
    pub value: String,
    pub reason: &'static str,
}

/// Which privilege wrapper a session runs under. A route-time choice, never a
/// value carried on request data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleScope {
    Admin,
    User,
    Anonymous,
}

impl RoleScope {
    /// The user variant escalates to the restricted role after acquisition
    /// and resets it before the terminal action.
    pub fn escalates(self) -> bool {
        matches!(self, RoleScope::User)
    }

    /// The session-variable injector runs only for the user variant.
    pub fn injects_identity(self) -> bool {
        matches!(self, RoleScope::User)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoleScope::Admin => "admin",
            RoleScope::User => "user",
            RoleScope::Anonymous => "anonymous",
        }
    }
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleScope {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(RoleScope::Admin),
            "user" => Ok(RoleScope::User),
            "anonymous" => Ok(RoleScope::Anonymous),
            _ => Err(InvalidRole {
                value: s.to_string(),
                reason: "expected one of admin, user, anonymous",
            }),
        }
    }
}

/// A validated restricted database role for `SET ROLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleName(String);

impl RoleName {
    pub fn new(value: &str) -> Result<Self, InvalidRole> {
        if !is_sql_identifier(value) {
            return Err(InvalidRole {
                value: value.to_string(),
                reason: "role names must be bare SQL identifiers",
            });
        }
        if !KNOWN_RESTRICTED_ROLES.contains(&value) {
            return Err(InvalidRole {
                value: value.to_string(),
                reason: "role is not in the known restricted role list",
            });
        }
        Ok(RoleName(value.to_string()))
    }

    /// The default restricted role, `app_user`.
    pub fn default_restricted() -> Self {
        RoleName(KNOWN_RESTRICTED_ROLES[0].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_sql_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if value.len() > 63 {
        return false;
    }
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
