//! sqlx-backed MySQL driver
//!
//! Implements [`DatabaseDriver`] on top of a MySQL connection pool.
//! Statement templates arrive with `?` placeholders and JSON parameter
//! values; object parameters are expanded client-side into assignment
//! lists before handing the statement to sqlx.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlArguments, MySqlPool, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Row, Transaction};
use tokio::sync::Mutex;

use crate::driver::{DatabaseDriver, StatementResult};
use crate::error::{DataHookError, Result};

/// MySQL driver over an sqlx connection pool.
///
/// Plain statements run against the pool; between `begin` and
/// `commit`/`rollback` they run on the transaction's dedicated connection.
pub struct MySqlDriver {
    pool: MySqlPool,
    transaction: Mutex<Option<Transaction<'static, MySql>>>,
}

impl MySqlDriver {
    /// Connect a new pool to the given MySQL URL
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(|e| DataHookError::driver(format!("database connection failed: {e}")))?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool
    ///
    /// Use this when the surrounding process already manages a pool and
    /// wants to share it with the middleware.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self {
            pool,
            transaction: Mutex::new(None),
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl DatabaseDriver for MySqlDriver {
    async fn run(&self, statement: &str, params: &[Value]) -> Result<StatementResult> {
        let (statement, params) = expand_placeholders(statement, params)?;

        let mut query = sqlx::query(&statement);
        for param in &params {
            query = bind_value(query, param)?;
        }

        let mut guard = self.transaction.lock().await;
        if is_row_returning(&statement) {
            let rows = match guard.as_mut() {
                Some(tx) => query.fetch_all(&mut **tx).await?,
                None => query.fetch_all(&self.pool).await?,
            };
            Ok(rows_to_result(&rows))
        } else {
            let outcome = match guard.as_mut() {
                Some(tx) => query.execute(&mut **tx).await?,
                None => query.execute(&self.pool).await?,
            };
            Ok(StatementResult {
                rows: Vec::new(),
                fields: Vec::new(),
                rows_affected: outcome.rows_affected(),
            })
        }
    }

    async fn begin(&self) -> Result<()> {
        let mut guard = self.transaction.lock().await;
        if guard.is_some() {
            return Err(DataHookError::driver("transaction already open"));
        }
        *guard = Some(self.pool.begin().await?);
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let mut guard = self.transaction.lock().await;
        match guard.take() {
            Some(tx) => Ok(tx.commit().await?),
            None => Err(DataHookError::driver("commit without an open transaction")),
        }
    }

    async fn rollback(&self) -> Result<()> {
        let mut guard = self.transaction.lock().await;
        match guard.take() {
            Some(tx) => Ok(tx.rollback().await?),
            None => Err(DataHookError::driver("rollback without an open transaction")),
        }
    }
}

fn is_row_returning(statement: &str) -> bool {
    statement
        .trim_start()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("SELECT"))
}

/// Expand object parameters into `column = ?, ..` assignment pairs and
/// flatten the parameter list to scalars.
fn expand_placeholders(statement: &str, params: &[Value]) -> Result<(String, Vec<Value>)> {
    let mut text = String::with_capacity(statement.len());
    let mut flat = Vec::new();
    let mut values = params.iter();

    for ch in statement.chars() {
        if ch != '?' {
            text.push(ch);
            continue;
        }
        let Some(value) = values.next() else {
            return Err(DataHookError::driver(
                "statement has more placeholders than parameters",
            ));
        };
        match value {
            Value::Object(map) => {
                let assignments = map
                    .keys()
                    .map(|key| format!("{key} = ?"))
                    .collect::<Vec<_>>()
                    .join(", ");
                text.push_str(&assignments);
                flat.extend(map.values().cloned());
            }
            scalar => {
                text.push('?');
                flat.push(scalar.clone());
            }
        }
    }
    Ok((text, flat))
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q Value,
) -> Result<Query<'q, MySql, MySqlArguments>> {
    Ok(match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                return Err(DataHookError::driver(format!("cannot bind number {n}")));
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => {
            return Err(DataHookError::driver(format!(
                "cannot bind non-scalar parameter {other}"
            )));
        }
    })
}

fn rows_to_result(rows: &[MySqlRow]) -> StatementResult {
    let fields = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|column| column.name().to_string())
                .collect()
        })
        .unwrap_or_default();

    let decoded = rows.iter().map(row_to_json).collect();

    StatementResult {
        rows: decoded,
        fields,
        rows_affected: 0,
    }
}

fn row_to_json(row: &MySqlRow) -> Value {
    let mut object = serde_json::Map::new();
    for column in row.columns() {
        object.insert(column.name().to_string(), decode_column(row, column.ordinal()));
    }
    Value::Object(object)
}

/// Decode one column into JSON by probing the driver's typed getters,
/// widest numeric first. Types outside the simplified mapping decode as
/// null rather than failing the whole row.
fn decode_column(row: &MySqlRow, index: usize) -> Value {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<u64>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index) {
        return value
            .map(|ts| Value::String(ts.to_rfc3339()))
            .unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<chrono::NaiveDateTime>, _>(index) {
        return value
            .map(|ts| Value::String(ts.and_utc().to_rfc3339()))
            .unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_placeholders_pass_through() {
        let params = vec![json!(5), json!("hello")];
        let (text, flat) =
            expand_placeholders("SELECT a FROM t WHERE id = ? AND name = ?", &params).unwrap();

        assert_eq!(text, "SELECT a FROM t WHERE id = ? AND name = ?");
        assert_eq!(flat, params);
    }

    #[test]
    fn test_object_parameter_expands_to_assignments() {
        let params = vec![json!({"title": "Hello", "content": "World"})];
        let (text, flat) = expand_placeholders("INSERT INTO article SET ?", &params).unwrap();

        assert_eq!(text, "INSERT INTO article SET content = ?, title = ?");
        assert_eq!(flat, vec![json!("World"), json!("Hello")]);
    }

    #[test]
    fn test_object_and_scalar_mix() {
        let params = vec![json!({"title": "Hi"}), json!(5)];
        let (text, flat) =
            expand_placeholders("UPDATE article SET ? WHERE article.id = ?", &params).unwrap();

        assert_eq!(text, "UPDATE article SET title = ? WHERE article.id = ?");
        assert_eq!(flat, vec![json!("Hi"), json!(5)]);
    }

    #[test]
    fn test_too_many_placeholders_fails() {
        let err = expand_placeholders("SELECT ? FROM ?", &[json!(1)]).unwrap_err();
        assert!(err.to_string().contains("placeholders"));
    }

    #[test]
    fn test_row_returning_detection() {
        assert!(is_row_returning("SELECT 1"));
        assert!(is_row_returning("  select a from t"));
        assert!(!is_row_returning("INSERT INTO t SET a = ?"));
        assert!(!is_row_returning("DELETE FROM t"));
    }
}
