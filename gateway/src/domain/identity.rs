// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Request-scoped identity.
//!
//! The identity discovered by the bootstrap policy lives only in memory for
//! one request; the session-variable injector writes it into the transaction
//! under [`SESSION_IDENTITY_KEY`] so database-side row-level-security logic
//! can read it.

use std::fmt;

/// Transaction-scoped configuration key read by database-side policies.
pub const SESSION_IDENTITY_KEY: &str = "auth.session.id";

/// Opaque identifier (UUID-shaped in practice) for the acting account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity(String);

impl SessionIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        SessionIdentity(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
