//! Simplified column type mapping
//!
//! Maps MySQL native column type names onto the small set of semantic types
//! the rest of the pipeline works with.

use serde::{Deserialize, Serialize};

use crate::error::{DataHookError, Result};

const BOOLEAN_TYPES: &[&str] = &["BOOL", "BOOLEAN"];
const NUMBER_TYPES: &[&str] = &["TINYINT", "SMALLINT", "MEDIUMINT", "BIGINT", "INTEGER", "INT"];
const FLOAT_TYPES: &[&str] = &["DECIMAL", "FLOAT", "DEC", "DOUBLE", "DOUBLE_PRECISION"];
const TIMESTAMP_TYPES: &[&str] = &["DATE", "DATETIME", "TIMESTAMP"];
const STRING_TYPES: &[&str] = &["TEXT", "MEDIUMTEXT", "CHAR", "VARCHAR", "TINYTEXT"];

/// Semantic column type derived from a native MySQL data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimplifiedType {
    String,
    Number,
    Boolean,
    Float,
    Timestamp,
}

impl SimplifiedType {
    /// Map a native MySQL data type name to its simplified type
    /// (`"INT"` → `Number`, `"MEDIUMTEXT"` → `String`, ..).
    ///
    /// The lookup is case-insensitive. A native type outside the fixed
    /// category lists fails with [`DataHookError::UnknownType`]; the
    /// operator is expected to extend the mapping before the scan can
    /// succeed.
    pub fn from_native(native: &str) -> Result<Self> {
        let native = native.to_uppercase();
        let lookup = [
            (Self::Boolean, BOOLEAN_TYPES),
            (Self::Number, NUMBER_TYPES),
            (Self::Float, FLOAT_TYPES),
            (Self::Timestamp, TIMESTAMP_TYPES),
            (Self::String, STRING_TYPES),
        ];
        for (simplified, natives) in lookup {
            if natives.contains(&native.as_str()) {
                return Ok(simplified);
            }
        }
        Err(DataHookError::UnknownType(native))
    }
}
