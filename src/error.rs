//! Error types for the request-to-query pipeline

use thiserror::Error;

/// Errors that can occur during schema bootstrap, validation, compilation
/// and execution.
///
/// Schema-bootstrap errors (`StructureIntegrity`, `SchemaMismatch`,
/// `UnknownType`, `Snapshot`) are unrecoverable within the process and
/// require operator intervention. Validation errors map to a 4xx response
/// and never terminate the process.
#[derive(Debug, Error)]
pub enum DataHookError {
    #[error("structure scan integrity failure: {0}")]
    StructureIntegrity(String),

    #[error("schema snapshot engine mismatch: snapshot is tagged `{found}` but configuration requests `{expected}`; check your configuration or remove the snapshot file and restart")]
    SchemaMismatch { expected: String, found: String },

    #[error("no simplified type mapping for native type `{0}`")]
    UnknownType(String),

    #[error("unknown resource type `{0}`")]
    UnknownResource(String),

    #[error("unknown relationship alias `{alias}` on resource `{resource}`")]
    UnknownRelationship { resource: String, alias: String },

    #[error("unknown resource attribute `{attribute}` on resource `{resource}`")]
    UnknownAttribute { resource: String, attribute: String },

    #[error("missing resource attribute `{attribute}` on resource `{resource}`")]
    MissingAttribute { resource: String, attribute: String },

    #[error("cannot compile {method} statement for `{resource}` without an identifier")]
    MissingIdentifier { resource: String, method: String },

    #[error("schema snapshot error: {0}")]
    Snapshot(String),

    #[error("statement for resource `{resource}` failed: {source}")]
    Execution {
        resource: String,
        #[source]
        source: Box<DataHookError>,
    },

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("driver error: {0}")]
    Driver(String),
}

impl DataHookError {
    pub fn structure_integrity(msg: impl Into<String>) -> Self {
        Self::StructureIntegrity(msg.into())
    }

    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }

    pub fn driver(msg: impl Into<String>) -> Self {
        Self::Driver(msg.into())
    }

    /// Whether this error was caused by client input rather than by the
    /// process or its configuration.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownResource(_)
                | Self::UnknownRelationship { .. }
                | Self::UnknownAttribute { .. }
                | Self::MissingAttribute { .. }
        )
    }

    /// HTTP status code equivalent for the response boundary.
    ///
    /// Client-input failures map to 422 Unprocessable Entity; everything
    /// else is a server fault.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() { 422 } else { 500 }
    }
}

pub type Result<T> = std::result::Result<T, DataHookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_client_errors() {
        let err = DataHookError::UnknownResource("article".into());
        assert!(err.is_client_error());
        assert_eq!(err.status_code(), 422);

        let err = DataHookError::MissingAttribute {
            resource: "article".into(),
            attribute: "title".into(),
        };
        assert!(err.is_client_error());
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_bootstrap_errors_are_server_faults() {
        let err = DataHookError::StructureIntegrity("dangling key".into());
        assert!(!err.is_client_error());
        assert_eq!(err.status_code(), 500);

        let err = DataHookError::SchemaMismatch {
            expected: "MYSQL".into(),
            found: "POSTGRES".into(),
        };
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_missing_identifier_is_server_fault() {
        let err = DataHookError::MissingIdentifier {
            resource: "article".into(),
            method: "patch".into(),
        };
        assert!(!err.is_client_error());
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_execution_error_names_resource() {
        let err = DataHookError::Execution {
            resource: "article".into(),
            source: Box::new(DataHookError::driver("duplicate entry")),
        };
        assert!(err.to_string().contains("article"));
    }
}
