//! Postgres implementation of the session seams.
//!
//! One [`PgSessionBackend`] owns one `sqlx` transaction for the lifetime of a
//! session. Commit and rollback consume the transaction, which returns the
//! connection to the pool; a backend dropped mid-flight rolls back through
//! the driver's transaction guard.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::Postgres;
use sqlx::{Row, Transaction};
use tracing::debug;

use crate::domain::envelope::ResolveCall;
use crate::domain::role::RoleName;
use crate::domain::session::{SessionBackend, SessionFactory};
use crate::error::GatewayError;
use crate::infrastructure::db::Database;

/// Fixed call to the database-resident resolver. The casts are always
/// present: the wire protocol types every parameter, and a SQL null cast to
/// `jsonb` is a `jsonb` null, so absent arguments reach the procedure exactly
/// as plain nulls.
const RESOLVE_STATEMENT: &str =
    "select graphql.resolve(($1)::text, ($2)::jsonb, ($3)::text, ($4)::jsonb)";

/// Begins one transaction per session on the injected pool.
pub struct PgSessionFactory {
    db: Database,
    echo: bool,
}

impl PgSessionFactory {
    pub fn new(db: Database, echo: bool) -> Self {
        PgSessionFactory { db, echo }
    }
}

#[async_trait]
impl SessionFactory for PgSessionFactory {
    async fn begin(&self) -> Result<Box<dyn SessionBackend>, GatewayError> {
        let tx = self.db.begin().await?;
        Ok(Box::new(PgSessionBackend {
            tx,
            echo: self.echo,
        }))
    }
}

pub struct PgSessionBackend {
    tx: Transaction<'static, Postgres>,
    echo: bool,
}

impl PgSessionBackend {
    fn trace(&self, statement: &str) {
        if self.echo {
            debug!(statement, "session statement");
        }
    }
}

#[async_trait]
impl SessionBackend for PgSessionBackend {
    async fn escalate_role(&mut self, role: &RoleName) -> Result<(), GatewayError> {
        // Identifiers cannot be bound as parameters; RoleName is validated
        // against the fixed allowlist before it gets here.
        let statement = format!(r#"SET ROLE "{}""#, role.as_str());
        self.trace(&statement);
        sqlx::query(&statement)
            .execute(&mut *self.tx)
            .await
            .map_err(GatewayError::from_execution)?;
        Ok(())
    }

    async fn reset_role(&mut self) -> Result<(), GatewayError> {
        for statement in ["RESET ROLE", "RESET ALL"] {
            self.trace(statement);
            sqlx::query(statement)
                .execute(&mut *self.tx)
                .await
                .map_err(GatewayError::from_execution)?;
        }
        Ok(())
    }

    async fn apply_setting(&mut self, key: &str, value: &str) -> Result<(), GatewayError> {
        let statement = "select set_config($1, $2, true)";
        self.trace(statement);
        sqlx::query(statement)
            .bind(key)
            .bind(value)
            .execute(&mut *self.tx)
            .await
            .map_err(GatewayError::from_execution)?;
        Ok(())
    }

    async fn resolve(&mut self, call: &ResolveCall) -> Result<Value, GatewayError> {
        self.trace(RESOLVE_STATEMENT);
        let row = sqlx::query(RESOLVE_STATEMENT)
            .bind(&call.query)
            .bind(call.variables.as_deref())
            .bind(call.operation_name.as_deref())
            .bind(call.extensions.as_deref())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(GatewayError::from_execution)?;
        let value: Option<Value> = row.try_get(0).map_err(GatewayError::from_execution)?;
        Ok(value.unwrap_or(Value::Null))
    }

    async fn commit(self: Box<Self>) -> Result<(), GatewayError> {
        self.trace("COMMIT");
        self.tx.commit().await.map_err(GatewayError::from_execution)
    }

    async fn rollback(self: Box<Self>) -> Result<(), GatewayError> {
        self.trace("ROLLBACK");
        self.tx
            .rollback()
            .await
            .map_err(GatewayError::from_execution)
    }
}
