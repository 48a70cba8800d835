//! In-memory schema model
//!
//! Typed representation of every table, column and relationship found by the
//! structure scan. The model is constructed once (by the scanner or the
//! snapshot loader), verified, and then treated as read-only for the rest of
//! the process lifetime.

pub mod scanner;
pub mod store;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DataHookError, Result};
use crate::types::SimplifiedType;

/// Identifier shape accepted for table, column and alias names that end up
/// concatenated into statement text. Snapshot edits are re-checked against
/// this on load.
const IDENTIFIER_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_]*$";

/// A single column as recorded by the structure scan.
///
/// `is_restricted` and `select_modifier` default to off; they exist for the
/// operator to annotate in the persisted snapshot between the scaffold run
/// and the first production run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Native data type name as reported by the engine
    pub data_type: String,
    /// Semantic type derived from the native type
    pub simplified_type: SimplifiedType,
    /// Raw SQL expression substituted for the plain column reference in
    /// SELECT lists (operator-supplied)
    #[serde(default)]
    pub select_modifier: Option<String>,
    pub is_nullable: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    /// Excluded from default selection (operator-supplied)
    #[serde(default)]
    pub is_restricted: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
}

impl Column {
    pub fn new(data_type: impl Into<String>, simplified_type: SimplifiedType, nullable: bool) -> Self {
        Self {
            data_type: data_type.into(),
            simplified_type,
            select_modifier: None,
            is_nullable: nullable,
            is_primary_key: false,
            is_restricted: false,
            is_foreign_key: false,
        }
    }

    /// Whether clients may supply this column as a body attribute.
    pub fn is_writable(&self) -> bool {
        !self.is_primary_key && !self.is_foreign_key
    }

    /// Whether a mutation creating a new row must supply this column.
    pub fn is_required(&self) -> bool {
        !self.is_nullable && self.is_writable()
    }
}

/// Direction of a relationship entry relative to its owning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Direct,
    Inverse,
}

/// Cardinality marker carried through for response shaping.
///
/// The scan cannot derive it from constraint metadata alone, so scaffolded
/// snapshots record `UNRESOLVED` until the operator edits it. Validation
/// does not consult it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    ToOne,
    ToMany,
    Unresolved,
}

/// A foreign-key-based link between two tables, stored under a
/// client-facing alias.
///
/// A direct relationship on the referencing table is always mirrored by
/// exactly one inverse relationship on the referenced table; the pair is
/// created together at scan time and never independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub direction: Direction,
    /// Column on the owning table participating in the constraint
    pub column: String,
    /// Constraint name as reported by the engine
    pub constraint: String,
    /// The other side of the link: the referenced table for a direct
    /// relationship, the referencing table for an inverse one
    pub related_table: String,
    pub related_column: String,
    pub relates: Cardinality,
}

/// A table with its columns and relationship maps.
///
/// Column order is scan order (not semantically significant, but kept
/// stable so compiled statements and snapshots are deterministic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    pub columns: IndexMap<String, Column>,
    #[serde(default)]
    pub relationships: IndexMap<String, Relationship>,
    #[serde(default)]
    pub inverse_relationships: IndexMap<String, Relationship>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
            relationships: IndexMap::new(),
            inverse_relationships: IndexMap::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Name of the primary-key column, when the table has one.
    pub fn primary_key(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|(_, column)| column.is_primary_key)
            .map(|(name, _)| name.as_str())
    }

    /// Whether the table exposes a relationship (direct or inverse) under
    /// the given alias.
    pub fn has_relationship(&self, alias: &str) -> bool {
        self.relationships.contains_key(alias) || self.inverse_relationships.contains_key(alias)
    }

    /// Look up a relationship by alias, direct entries first.
    pub fn relationship(&self, alias: &str) -> Option<&Relationship> {
        self.relationships
            .get(alias)
            .or_else(|| self.inverse_relationships.get(alias))
    }

    /// Resource type reached by following the aliased relationship.
    pub fn related_resource_type(&self, alias: &str) -> Option<&str> {
        self.relationship(alias)
            .map(|relationship| relationship.related_table.as_str())
    }

    /// Columns a mutation creating a new row must supply.
    pub fn required_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|(_, column)| column.is_required())
            .map(|(name, _)| name.as_str())
    }

    /// Qualified selector list for a SELECT against this table.
    ///
    /// Primary keys, foreign keys and restricted columns are excluded from
    /// default selection. When the request carries a non-empty sparse
    /// fieldset for this table, only the named columns survive. A column
    /// with a select-modifier contributes its expression instead of its
    /// qualified name.
    pub fn select_list(&self, fieldset: Option<&[String]>) -> Vec<String> {
        let fieldset = fieldset.filter(|columns| !columns.is_empty());
        let mut selectors = Vec::new();
        for (name, column) in &self.columns {
            if column.is_primary_key || column.is_foreign_key || column.is_restricted {
                continue;
            }
            if let Some(columns) = fieldset {
                if !columns.iter().any(|selected| selected == name) {
                    continue;
                }
            }
            match &column.select_modifier {
                Some(modifier) => selectors.push(modifier.clone()),
                None => selectors.push(format!("{}.{}", self.name, name)),
            }
        }
        selectors
    }
}

/// The full scanned structure: table name → table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaModel {
    pub tables: IndexMap<String, Table>,
}

impl SchemaModel {
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Verify the structural invariants the pipeline depends on.
    ///
    /// Checked after every construction path that does not guarantee them,
    /// the snapshot loader in particular, since the snapshot file is
    /// operator-edited text:
    /// - every identifier that gets concatenated into statement text has a
    ///   plain identifier shape;
    /// - every foreign-key column has a direct relationship on its table;
    /// - every direct relationship is mirrored by an inverse entry on the
    ///   related table, and vice versa.
    pub fn verify_integrity(&self) -> Result<()> {
        let identifier = Regex::new(IDENTIFIER_PATTERN).unwrap();

        for (table_name, table) in &self.tables {
            if !identifier.is_match(table_name) {
                return Err(DataHookError::structure_integrity(format!(
                    "invalid table name `{table_name}`"
                )));
            }
            for (column_name, column) in &table.columns {
                if !identifier.is_match(column_name) {
                    return Err(DataHookError::structure_integrity(format!(
                        "invalid column name `{column_name}` on table `{table_name}`"
                    )));
                }
                if column.is_foreign_key
                    && !table
                        .relationships
                        .values()
                        .any(|relationship| relationship.column == *column_name)
                {
                    return Err(DataHookError::structure_integrity(format!(
                        "foreign-key column `{table_name}.{column_name}` has no relationship entry"
                    )));
                }
            }
            for (alias, relationship) in table
                .relationships
                .iter()
                .chain(table.inverse_relationships.iter())
            {
                if !identifier.is_match(alias) {
                    return Err(DataHookError::structure_integrity(format!(
                        "invalid relationship alias `{alias}` on table `{table_name}`"
                    )));
                }
                self.verify_mirror(table_name, alias, relationship)?;
            }
        }
        Ok(())
    }

    fn verify_mirror(&self, owner: &str, alias: &str, relationship: &Relationship) -> Result<()> {
        let related = self.table(&relationship.related_table).ok_or_else(|| {
            DataHookError::structure_integrity(format!(
                "relationship `{alias}` on table `{owner}` references unknown table `{}`",
                relationship.related_table
            ))
        })?;
        if !related.has_column(&relationship.related_column) {
            return Err(DataHookError::structure_integrity(format!(
                "relationship `{alias}` on table `{owner}` references unknown column `{}.{}`",
                relationship.related_table, relationship.related_column
            )));
        }

        let mirrors = match relationship.direction {
            Direction::Direct => &related.inverse_relationships,
            Direction::Inverse => &related.relationships,
        };
        let mirrored = mirrors.values().any(|mirror| {
            mirror.constraint == relationship.constraint
                && mirror.related_table == *owner
                && mirror.related_column == relationship.column
                && mirror.column == relationship.related_column
        });
        if !mirrored {
            return Err(DataHookError::structure_integrity(format!(
                "relationship `{alias}` on table `{owner}` has no mirror entry on table `{}`",
                relationship.related_table
            )));
        }
        Ok(())
    }
}
