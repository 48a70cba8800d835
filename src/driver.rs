//! Database driver contract
//!
//! The boundary to the wire-level database client: parameterized statement
//! execution plus transaction primitives. The executor and scanner are
//! written against this trait; [`mysql::MySqlDriver`] is the sqlx-backed
//! implementation.

pub mod mysql;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub use mysql::MySqlDriver;

/// Result of executing one statement: decoded rows, field names in
/// selection order, and the affected-row count for mutations.
#[derive(Debug, Clone, Default)]
pub struct StatementResult {
    /// One JSON object per result row
    pub rows: Vec<Value>,
    /// Column names of the result set
    pub fields: Vec<String>,
    pub rows_affected: u64,
}

/// Parameterized execution and transaction primitives.
///
/// `run` consumes one parameter per `?` placeholder in order. An object
/// parameter expands to `column = ?, ..` assignment pairs with its values
/// bound in key order; scalar parameters bind as-is. Implementations never
/// interpolate values into statement text.
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    async fn run(&self, statement: &str, params: &[Value]) -> Result<StatementResult>;

    /// Open a transaction on the connection. At most one transaction is
    /// open at a time; subsequent `run` calls execute inside it until
    /// `commit` or `rollback`.
    async fn begin(&self) -> Result<()>;

    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;
}
