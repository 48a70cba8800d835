//! # datahook
//!
//! Schema-driven JSON:API to SQL translation middleware for MySQL.
//!
//! This crate translates structured JSON:API-style requests into
//! parameterized SQL statements, validated against a schema model scanned
//! from the database's information schema. The scanned structure is
//! persisted as an operator-editable snapshot; requests are validated and
//! compiled against the in-memory model and executed as a single statement
//! or an atomic multi-statement transaction.
//!
//! ## Pipeline
//!
//! - **Scan**: the structure scanner reads the information schema once and
//!   folds it into a [`SchemaModel`] of tables, columns and mirrored
//!   relationships. The result is persisted as a snapshot the operator
//!   annotates (restricted columns, select modifiers, relationship
//!   aliases) before the first production run.
//! - **Validate**: each request descriptor (resource type, relationship,
//!   includes, sparse fieldsets, sort, pagination, body attributes) is
//!   checked against the model.
//! - **Compile**: validated requests compile deterministically into a
//!   [`QueryPlan`] of parameterized statements; user values are only ever
//!   bound, never interpolated.
//! - **Execute**: single-statement plans run directly; larger plans run in
//!   order inside one transaction, rolled back on any failure.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use datahook::{DataHook, HookConfig, Method, RequestDescriptor, Startup};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HookConfig::builder("mysql://localhost/blog", "blog")
//!         .snapshot_path("data.structure.json")
//!         .build();
//!
//!     let hook = match DataHook::connect(config).await? {
//!         Startup::Ready(hook) => hook,
//!         Startup::Scaffolded { path } => {
//!             eprintln!("structure snapshot scaffolded to {}", path.display());
//!             eprintln!("annotate it and restart");
//!             return Ok(());
//!         }
//!     };
//!
//!     // GET /article/5 as delivered by the query-string parser.
//!     let request = RequestDescriptor::new("article").with_identifier("5");
//!     let result = hook.handle(Method::Get, &request).await?;
//!     println!("{} rows", result.results[0].rows.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Boundaries
//!
//! The HTTP listener, the JSON:API query-string parser, and subscriber
//! setup for logging are external collaborators. The wire-level database
//! access sits behind the [`DatabaseDriver`] trait; [`MySqlDriver`] is the
//! bundled sqlx-backed implementation.

pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod hook;
pub mod request;
pub mod schema;
pub mod sql;
pub mod types;
pub mod validate;

// Re-export main types for convenience
pub use config::{DatabaseEngine, HookConfig, HookConfigBuilder};
pub use driver::{DatabaseDriver, MySqlDriver, StatementResult};
pub use error::{DataHookError, Result};
pub use executor::{ExecutionResult, TransactionExecutor};
pub use hook::{DataHook, Startup};
pub use request::{Attributes, Method, Page, RequestDescriptor};
pub use schema::scanner::{RawSchemaRows, StructureScanner};
pub use schema::store::{Bootstrap, SchemaStore, Snapshot};
pub use schema::{Cardinality, Column, Direction, Relationship, SchemaModel, Table};
pub use sql::{CompiledStatement, QueryPlan, compile};
pub use types::SimplifiedType;
pub use validate::validate;
