// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! GraphQL request envelope and its outbound form.
//!
//! [`GraphqlRequest`] is the inbound JSON body; [`ResolveCall`] is what the
//! session backend binds onto the resolution procedure. Variables and
//! extensions are serialized to their textual JSON form exactly once, at the
//! envelope-to-call conversion. Sections that are absent or empty (an empty
//! `operationName`, an empty `variables` or `extensions` document) are passed
//! as SQL nulls so the procedure applies its own defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;

/// Inbound `POST /graphql` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlRequest {
    #[serde(
        rename = "operationName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub operation_name: Option<String>,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// Parameters for one invocation of the resolution procedure. `variables` and
/// `extensions` are pre-serialized JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveCall {
    pub query: String,
    pub operation_name: Option<String>,
    pub variables: Option<String>,
    pub extensions: Option<String>,
}

impl ResolveCall {
    /// A call carrying only query text, as used by the identity bootstrap and
    /// the schema export.
    pub fn query_only(query: impl Into<String>) -> Self {
        ResolveCall {
            query: query.into(),
            operation_name: None,
            variables: None,
            extensions: None,
        }
    }
}

/// An empty document carries nothing the procedure could use; it collapses to
/// SQL null so the procedure-side defaults stay in force.
fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

impl TryFrom<&GraphqlRequest> for ResolveCall {
    type Error = GatewayError;

    fn try_from(request: &GraphqlRequest) -> Result<Self, Self::Error> {
        let operation_name = request
            .operation_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        let variables = request
            .variables
            .as_ref()
            .filter(|v| has_content(v))
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| GatewayError::Envelope(format!("variables: {e}")))?;
        let extensions = request
            .extensions
            .as_ref()
            .filter(|v| has_content(v))
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| GatewayError::Envelope(format!("extensions: {e}")))?;
        Ok(ResolveCall {
            query: request.query.clone(),
            operation_name,
            variables,
            extensions,
        })
    }
}
