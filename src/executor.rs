//! Plan execution
//!
//! Runs a compiled plan against the database driver: a single statement
//! executes directly, a multi-statement plan executes inside one
//! transaction, strictly in plan order, all-or-nothing.

use crate::driver::{DatabaseDriver, StatementResult};
use crate::error::{DataHookError, Result};
use crate::sql::plan::QueryPlan;

/// Per-statement results in plan order. Only fully successful executions
/// produce one; partial success is never surfaced.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    pub results: Vec<StatementResult>,
}

/// Executes query plans against a driver.
pub struct TransactionExecutor<'a> {
    driver: &'a dyn DatabaseDriver,
}

impl<'a> TransactionExecutor<'a> {
    pub fn new(driver: &'a dyn DatabaseDriver) -> Self {
        Self { driver }
    }

    /// Execute the plan.
    ///
    /// Statement failures are surfaced verbatim, wrapped with the failing
    /// statement's resource type. In the multi-statement case any failure
    /// (including commit failure) triggers a rollback before the error is
    /// returned and the remaining statements never execute. Statements are
    /// never retried.
    pub async fn execute(&self, plan: &QueryPlan) -> Result<ExecutionResult> {
        match plan.statements.as_slice() {
            [] => Ok(ExecutionResult::default()),
            [statement] => {
                let result = self
                    .driver
                    .run(&statement.statement, &statement.params)
                    .await
                    .map_err(|e| wrap(&statement.resource_type, e))?;
                Ok(ExecutionResult {
                    results: vec![result],
                })
            }
            statements => {
                self.driver.begin().await?;

                let mut results = Vec::with_capacity(statements.len());
                for statement in statements {
                    match self
                        .driver
                        .run(&statement.statement, &statement.params)
                        .await
                    {
                        Ok(result) => results.push(result),
                        Err(e) => {
                            self.abort().await;
                            return Err(wrap(&statement.resource_type, e));
                        }
                    }
                }

                if let Err(e) = self.driver.commit().await {
                    self.abort().await;
                    return Err(e);
                }
                Ok(ExecutionResult { results })
            }
        }
    }

    async fn abort(&self) {
        if let Err(e) = self.driver.rollback().await {
            tracing::warn!(error = %e, "rollback failed");
        }
    }
}

fn wrap(resource_type: &str, source: DataHookError) -> DataHookError {
    DataHookError::Execution {
        resource: resource_type.to_string(),
        source: Box::new(source),
    }
}
