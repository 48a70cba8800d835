//! Schema snapshot lifecycle
//!
//! Owns the transition from process start to a ready, immutable
//! [`SchemaModel`]: load a persisted snapshot when one exists for the
//! configured engine, or scan the live database once and persist the
//! scaffold for the operator to annotate.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{DatabaseEngine, HookConfig};
use crate::driver::DatabaseDriver;
use crate::error::{DataHookError, Result};
use crate::schema::SchemaModel;
use crate::schema::scanner::StructureScanner;

/// Persisted form of the schema model, tagged with the engine it was
/// scanned from. The file is meant to be edited by hand: `isRestricted`,
/// `selectModifier` and `relates` are operator annotations, and the
/// scaffolded relationship aliases are meant to be renamed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub engine: DatabaseEngine,
    pub tables: SchemaModel,
}

/// Outcome of schema bootstrap.
///
/// `Scaffolded` means a fresh snapshot was written from a live scan; the
/// caller is expected to stop the process so the operator can review and
/// annotate the file before the next run.
#[derive(Debug)]
pub enum Bootstrap {
    Ready(SchemaStore),
    Scaffolded { path: PathBuf },
}

/// Holds the ready schema model and hands it out read-only.
#[derive(Debug)]
pub struct SchemaStore {
    model: Arc<SchemaModel>,
}

impl SchemaStore {
    /// Load the persisted snapshot, or scan the live database and persist
    /// a scaffold.
    ///
    /// A snapshot tagged with a different engine than the configuration
    /// requests is fatal rather than a trigger to rescan: rescanning would
    /// silently clobber operator edits. A present-but-unparseable snapshot
    /// is fatal for the same reason; only a missing file starts a scan.
    pub async fn open(config: &HookConfig, driver: &dyn DatabaseDriver) -> Result<Bootstrap> {
        if let Some(model) = Self::load_snapshot(config)? {
            model.verify_integrity()?;
            tracing::info!(
                path = %config.snapshot_path.display(),
                tables = model.tables.len(),
                "structure snapshot loaded"
            );
            return Ok(Bootstrap::Ready(Self {
                model: Arc::new(model),
            }));
        }

        tracing::info!(
            path = %config.snapshot_path.display(),
            "no existing structure snapshot found, now scaffolding"
        );
        let scanner = StructureScanner::new(driver, &config.database_name);
        let model = scanner.scan_model().await?;
        Self::persist_snapshot(config, &model)?;
        tracing::info!(
            path = %config.snapshot_path.display(),
            "structure snapshot saved; rename the scaffolded aliases and restart"
        );
        Ok(Bootstrap::Scaffolded {
            path: config.snapshot_path.clone(),
        })
    }

    /// The ready model, shared read-only.
    pub fn model(&self) -> Arc<SchemaModel> {
        Arc::clone(&self.model)
    }

    fn load_snapshot(config: &HookConfig) -> Result<Option<SchemaModel>> {
        let raw = match std::fs::read_to_string(&config.snapshot_path) {
            Ok(raw) => raw,
            Err(_) => return Ok(None),
        };

        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| {
            DataHookError::snapshot(format!(
                "cannot parse `{}`: {e}",
                config.snapshot_path.display()
            ))
        })?;

        if snapshot.engine != config.engine {
            return Err(DataHookError::SchemaMismatch {
                expected: config.engine.tag().to_string(),
                found: snapshot.engine.tag().to_string(),
            });
        }

        Ok(Some(snapshot.tables))
    }

    fn persist_snapshot(config: &HookConfig, model: &SchemaModel) -> Result<()> {
        let snapshot = Snapshot {
            engine: config.engine,
            tables: model.clone(),
        };

        let indent = " ".repeat(config.snapshot_indent);
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        snapshot.serialize(&mut serializer)?;

        std::fs::write(&config.snapshot_path, buffer).map_err(|e| {
            DataHookError::snapshot(format!(
                "cannot write `{}`: {e}",
                config.snapshot_path.display()
            ))
        })
    }
}
