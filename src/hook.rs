//! DataHook - main entry point for the translation pipeline
//!
//! Wires configuration, driver, schema store and the
//! validate → compile → execute pipeline into one handle the HTTP boundary
//! calls per request.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::HookConfig;
use crate::driver::{DatabaseDriver, MySqlDriver};
use crate::error::Result;
use crate::executor::{ExecutionResult, TransactionExecutor};
use crate::request::{Method, RequestDescriptor};
use crate::schema::SchemaModel;
use crate::schema::store::{Bootstrap, SchemaStore};
use crate::sql::compile;
use crate::validate::validate;

/// Outcome of process startup.
///
/// `Scaffolded` means a fresh structure snapshot was written; the process
/// should stop so the operator can annotate it (mark restricted columns,
/// select modifiers, rename relationship aliases) before the next run.
pub enum Startup {
    Ready(DataHook),
    Scaffolded { path: PathBuf },
}

/// Schema-driven request-to-query middleware over one database.
///
/// Holds the one-time schema model and the shared driver; everything per
/// request (descriptor, validation, plan) is request-local, so concurrent
/// requests validate and compile fully in parallel.
pub struct DataHook {
    config: HookConfig,
    driver: Arc<dyn DatabaseDriver>,
    model: Arc<SchemaModel>,
}

impl DataHook {
    /// Connect to the configured database and bootstrap the schema.
    pub async fn connect(config: HookConfig) -> Result<Startup> {
        let driver = Arc::new(MySqlDriver::connect(&config.database_url).await?);
        Self::from_driver(driver, config).await
    }

    /// Bootstrap with an injected driver.
    ///
    /// Use this when the surrounding process already owns a driver, or to
    /// run the pipeline against a stub.
    pub async fn from_driver(driver: Arc<dyn DatabaseDriver>, config: HookConfig) -> Result<Startup> {
        match SchemaStore::open(&config, driver.as_ref()).await? {
            Bootstrap::Ready(store) => Ok(Startup::Ready(Self {
                model: store.model(),
                driver,
                config,
            })),
            Bootstrap::Scaffolded { path } => Ok(Startup::Scaffolded { path }),
        }
    }

    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    /// The ready schema model, shared read-only.
    pub fn model(&self) -> Arc<SchemaModel> {
        Arc::clone(&self.model)
    }

    /// Run one request through the pipeline: validate the descriptor
    /// against the schema, compile the plan, execute it.
    ///
    /// Validation failures surface as client errors
    /// ([`crate::DataHookError::status_code`] maps them to 422); execution
    /// failures carry the failing statement's resource type.
    pub async fn handle(
        &self,
        method: Method,
        request: &RequestDescriptor,
    ) -> Result<ExecutionResult> {
        tracing::debug!(
            method = %method,
            resource = %request.resource_type,
            "handling request"
        );

        validate(&self.model, method, request)?;
        let plan = compile(&self.model, method, request)?;
        TransactionExecutor::new(self.driver.as_ref())
            .execute(&plan)
            .await
    }
}
