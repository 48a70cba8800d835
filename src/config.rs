//! Configuration for the DataHook pipeline
//!
//! Provides a builder pattern for configuring the middleware.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Database engine the structure scan and statement dialect target.
///
/// Only MySQL is implemented; the variant list is the extension point for
/// further engines and doubles as the engine tag recorded in the schema
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatabaseEngine {
    MySql,
    Postgres,
}

impl DatabaseEngine {
    /// Tag string recorded in (and compared against) the snapshot file.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::MySql => "MYSQL",
            Self::Postgres => "POSTGRES",
        }
    }
}

impl std::fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Configuration for the middleware
#[derive(Debug, Clone)]
pub struct HookConfig {
    /// Database connection URL
    pub database_url: String,
    /// Engine the scan and dialect target
    pub engine: DatabaseEngine,
    /// Name of the database/schema whose structure is scanned
    pub database_name: String,
    /// Location of the persisted structure snapshot
    pub snapshot_path: PathBuf,
    /// Indentation width for the scaffolded snapshot JSON
    pub snapshot_indent: usize,
}

impl HookConfig {
    /// Create a new configuration builder
    pub fn builder(
        database_url: impl Into<String>,
        database_name: impl Into<String>,
    ) -> HookConfigBuilder {
        HookConfigBuilder::new(database_url, database_name)
    }
}

/// Builder for HookConfig
#[derive(Debug)]
pub struct HookConfigBuilder {
    database_url: String,
    engine: DatabaseEngine,
    database_name: String,
    snapshot_path: PathBuf,
    snapshot_indent: usize,
}

impl HookConfigBuilder {
    /// Create a new builder with the connection URL and scanned database name
    pub fn new(database_url: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            engine: DatabaseEngine::MySql,
            database_name: database_name.into(),
            snapshot_path: PathBuf::from("data.structure.json"),
            snapshot_indent: 2,
        }
    }

    /// Set the target engine (default: MySQL)
    pub fn engine(mut self, engine: DatabaseEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Set the snapshot file location (default: `data.structure.json`)
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }

    /// Set the snapshot JSON indentation width (default: 2)
    pub fn snapshot_indent(mut self, indent: usize) -> Self {
        self.snapshot_indent = indent;
        self
    }

    /// Build the configuration
    pub fn build(self) -> HookConfig {
        HookConfig {
            database_url: self.database_url,
            engine: self.engine,
            database_name: self.database_name,
            snapshot_path: self.snapshot_path,
            snapshot_indent: self.snapshot_indent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HookConfig::builder("mysql://localhost/blog", "blog").build();

        assert_eq!(config.database_url, "mysql://localhost/blog");
        assert_eq!(config.database_name, "blog");
        assert_eq!(config.engine, DatabaseEngine::MySql);
        assert_eq!(config.snapshot_path, PathBuf::from("data.structure.json"));
        assert_eq!(config.snapshot_indent, 2);
    }

    #[test]
    fn test_custom_snapshot_path() {
        let config = HookConfig::builder("mysql://localhost/blog", "blog")
            .snapshot_path("/etc/datahook/structure.json")
            .build();

        assert_eq!(
            config.snapshot_path,
            PathBuf::from("/etc/datahook/structure.json")
        );
    }

    #[test]
    fn test_engine_override() {
        let config = HookConfig::builder("postgres://localhost/blog", "public")
            .engine(DatabaseEngine::Postgres)
            .build();

        assert_eq!(config.engine, DatabaseEngine::Postgres);
    }

    #[test]
    fn test_engine_tag() {
        assert_eq!(DatabaseEngine::MySql.tag(), "MYSQL");
        assert_eq!(DatabaseEngine::Postgres.tag(), "POSTGRES");
        assert_eq!(DatabaseEngine::MySql.to_string(), "MYSQL");
    }

    #[test]
    fn test_engine_serialization() {
        let json = serde_json::to_string(&DatabaseEngine::MySql).unwrap();
        assert_eq!(json, r#""MYSQL""#);
        let back: DatabaseEngine = serde_json::from_str(r#""POSTGRES""#).unwrap();
        assert_eq!(back, DatabaseEngine::Postgres);
    }

    #[test]
    fn test_builder_order_independence() {
        let config1 = HookConfig::builder("mysql://localhost/a", "a")
            .snapshot_indent(4)
            .snapshot_path("s.json")
            .build();
        let config2 = HookConfig::builder("mysql://localhost/a", "a")
            .snapshot_path("s.json")
            .snapshot_indent(4)
            .build();

        assert_eq!(config1.snapshot_path, config2.snapshot_path);
        assert_eq!(config1.snapshot_indent, config2.snapshot_indent);
    }
}
