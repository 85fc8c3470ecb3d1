//! # Request forwarder
//!
//! One forwarding path for all three role-scoping variants. The variant
//! decides the policy hooks: the user variant first discovers an identity on
//! a separate admin session (two sequential scoped acquisitions, so a
//! bootstrap failure never touches the main session), then injects it into
//! its own session before the call.

use serde_json::Value;

use crate::application::lifecycle::{ResolveWork, SessionManager};
use crate::application::policy;
use crate::domain::envelope::{GraphqlRequest, ResolveCall};
use crate::domain::role::RoleScope;
use crate::error::GatewayError;

/// Marshals HTTP envelopes into resolution-procedure calls.
pub struct GraphqlForwarder {
    sessions: SessionManager,
}

impl GraphqlForwarder {
    pub fn new(sessions: SessionManager) -> Self {
        GraphqlForwarder { sessions }
    }

    /// Forwards one envelope under the given role-scoping variant and returns
    /// the procedure's JSON result verbatim. GraphQL-level errors are part of
    /// that JSON, not transport failures.
    pub async fn forward(
        &self,
        scope: RoleScope,
        request: &GraphqlRequest,
    ) -> Result<Value, GatewayError> {
        let identity = if scope.injects_identity() {
            Some(policy::become_first_account(&self.sessions).await?)
        } else {
            None
        };
        let call = ResolveCall::try_from(request)?;
        let work = if scope.injects_identity() {
            ResolveWork::scoped(&call, identity.as_ref())
        } else {
            ResolveWork::plain(&call)
        };
        self.sessions.with_session(scope, work).await
    }

    /// Runs the standard introspection document with administrative privilege
    /// and returns it for export. Fails when the result carries no schema.
    pub async fn export_schema(&self) -> Result<Value, GatewayError> {
        let call = ResolveCall::query_only(INTROSPECTION_QUERY);
        let document = self
            .sessions
            .with_session(RoleScope::Admin, ResolveWork::plain(&call))
            .await?;
        match document.pointer("/data/__schema") {
            Some(schema) if !schema.is_null() => Ok(document),
            _ => Err(GatewayError::RemoteExecution(format!(
                "introspection returned no schema: {document}"
            ))),
        }
    }
}

/// Standard GraphQL introspection document.
pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types {
      ...FullType
    }
    directives {
      name
      description
      locations
      args {
        ...InputValue
      }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args {
      ...InputValue
    }
    type {
      ...TypeRef
    }
    isDeprecated
    deprecationReason
  }
  inputFields {
    ...InputValue
  }
  interfaces {
    ...TypeRef
  }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes {
    ...TypeRef
  }
}

fragment InputValue on __InputValue {
  name
  description
  type {
    ...TypeRef
  }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
              }
            }
          }
        }
      }
    }
  }
}
"#;
