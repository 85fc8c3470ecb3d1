// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # portico-gateway
//!
//! A minimal HTTP gateway that forwards GraphQL requests to a
//! database-resident resolution function (`graphql.resolve`), layering
//! per-request session identity onto each call: one pooled connection and one
//! transaction per request, role escalation/reset around user-scoped work,
//! and a transaction-scoped identity variable for database-side row-level
//! security.
//!
//! # Architecture
//!
//! - **domain** — envelope/identity/role types and the session state machine
//!   behind backend/factory seams
//! - **application** — the session lifecycle runner (one commit/rollback
//!   decision point), the identity bootstrap policy, the request forwarder
//! - **infrastructure** — the Postgres pool wrapper and session backend
//! - **presentation** — axum routes, middleware, error mapping

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

pub use error::GatewayError;
