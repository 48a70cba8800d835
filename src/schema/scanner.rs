//! Live database structure scan
//!
//! Issues the two information-schema queries and folds the raw rows into a
//! [`SchemaModel`]. The fold is a pure transform; any integrity failure
//! discards the whole scan, never a partially built model.

use serde::Deserialize;
use serde_json::Value;

use crate::driver::DatabaseDriver;
use crate::error::{DataHookError, Result};
use crate::schema::{Cardinality, Column, Direction, Relationship, SchemaModel, Table};
use crate::types::SimplifiedType;

/// Constraint name MySQL reports for primary keys
const PRIMARY_KEY_CONSTRAINT: &str = "PRIMARY";

const COLUMN_SCAN: &str = "SELECT TABLE_NAME, COLUMN_NAME, DATA_TYPE, IS_NULLABLE \
     FROM INFORMATION_SCHEMA.COLUMNS WHERE TABLE_SCHEMA = ? \
     ORDER BY TABLE_NAME, ORDINAL_POSITION";

const KEY_SCAN: &str = "SELECT TABLE_NAME, COLUMN_NAME, CONSTRAINT_NAME, \
     REFERENCED_TABLE_NAME, REFERENCED_COLUMN_NAME \
     FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE WHERE TABLE_SCHEMA = ?";

/// One row of the column listing
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnRow {
    #[serde(rename = "TABLE_NAME")]
    pub table: String,
    #[serde(rename = "COLUMN_NAME")]
    pub column: String,
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    /// `YES` or `NO`, as the engine reports it
    #[serde(rename = "IS_NULLABLE")]
    pub is_nullable: String,
}

/// One row of the key/constraint listing
#[derive(Debug, Clone, Deserialize)]
pub struct KeyRow {
    #[serde(rename = "TABLE_NAME")]
    pub table: String,
    #[serde(rename = "COLUMN_NAME")]
    pub column: String,
    #[serde(rename = "CONSTRAINT_NAME")]
    pub constraint: String,
    /// Absent for primary keys and plain unique/index entries
    #[serde(rename = "REFERENCED_TABLE_NAME")]
    pub referenced_table: Option<String>,
    #[serde(rename = "REFERENCED_COLUMN_NAME")]
    pub referenced_column: Option<String>,
}

/// Raw output of the two metadata queries
#[derive(Debug, Clone, Default)]
pub struct RawSchemaRows {
    pub columns: Vec<ColumnRow>,
    pub keys: Vec<KeyRow>,
}

/// Scans a live database's structural metadata.
pub struct StructureScanner<'a> {
    driver: &'a dyn DatabaseDriver,
    database: String,
}

impl<'a> StructureScanner<'a> {
    pub fn new(driver: &'a dyn DatabaseDriver, database: impl Into<String>) -> Self {
        Self {
            driver,
            database: database.into(),
        }
    }

    /// Run the two metadata queries scoped to the configured database.
    pub async fn scan(&self) -> Result<RawSchemaRows> {
        let params = [Value::String(self.database.clone())];

        let columns = self.driver.run(COLUMN_SCAN, &params).await?;
        let keys = self.driver.run(KEY_SCAN, &params).await?;

        let columns = columns
            .rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<ColumnRow>, _>>()?;
        let keys = keys
            .rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<KeyRow>, _>>()?;

        tracing::debug!(
            database = %self.database,
            columns = columns.len(),
            keys = keys.len(),
            "structure scan complete"
        );
        Ok(RawSchemaRows { columns, keys })
    }

    /// Scan and fold into a model in one step.
    pub async fn scan_model(&self) -> Result<SchemaModel> {
        Self::build_model(self.scan().await?)
    }

    /// Fold raw metadata rows into a [`SchemaModel`].
    ///
    /// All column rows are processed before any key row, since key
    /// processing requires the referenced tables and columns to exist.
    /// Key rows without a referenced table are unique/index entries, not
    /// foreign keys, and create no relationship. Each foreign key inserts
    /// a direct relationship on the referencing table and its mirrored
    /// inverse on the referenced table, under scaffold aliases the
    /// operator is expected to rename in the snapshot.
    pub fn build_model(rows: RawSchemaRows) -> Result<SchemaModel> {
        let mut model = SchemaModel::default();

        for row in &rows.columns {
            let table = model
                .tables
                .entry(row.table.clone())
                .or_insert_with(|| Table::new(row.table.clone()));
            table.columns.insert(
                row.column.clone(),
                Column::new(
                    row.data_type.clone(),
                    SimplifiedType::from_native(&row.data_type)?,
                    row.is_nullable.eq_ignore_ascii_case("YES"),
                ),
            );
        }

        for row in &rows.keys {
            if !column_exists(&model, &row.table, &row.column) {
                return Err(DataHookError::structure_integrity(format!(
                    "table or column not found for constraint `{}`. table: `{}` column: `{}`",
                    row.constraint, row.table, row.column
                )));
            }

            if row.constraint == PRIMARY_KEY_CONSTRAINT {
                if let Some(column) = column_mut(&mut model, &row.table, &row.column) {
                    column.is_primary_key = true;
                }
                continue;
            }

            let (Some(referenced_table), Some(referenced_column)) =
                (row.referenced_table.clone(), row.referenced_column.clone())
            else {
                continue;
            };

            if !column_exists(&model, &referenced_table, &referenced_column) {
                return Err(DataHookError::structure_integrity(format!(
                    "referenced table or column not found for constraint `{}`. table: `{}` column: `{}`",
                    row.constraint, referenced_table, referenced_column
                )));
            }

            if let Some(column) = column_mut(&mut model, &row.table, &row.column) {
                column.is_foreign_key = true;
            }

            if let Some(table) = model.tables.get_mut(&row.table) {
                table.relationships.insert(
                    scaffold_alias(&referenced_table, &referenced_column),
                    Relationship {
                        direction: Direction::Direct,
                        column: row.column.clone(),
                        constraint: row.constraint.clone(),
                        related_table: referenced_table.clone(),
                        related_column: referenced_column.clone(),
                        relates: Cardinality::Unresolved,
                    },
                );
            }
            if let Some(table) = model.tables.get_mut(&referenced_table) {
                table.inverse_relationships.insert(
                    scaffold_alias(&row.table, &row.column),
                    Relationship {
                        direction: Direction::Inverse,
                        column: referenced_column.clone(),
                        constraint: row.constraint.clone(),
                        related_table: row.table.clone(),
                        related_column: row.column.clone(),
                        relates: Cardinality::Unresolved,
                    },
                );
            }
        }

        Ok(model)
    }
}

/// Placeholder relationship alias derived from the other side of the link;
/// renamed by the operator before first production use.
fn scaffold_alias(table: &str, column: &str) -> String {
    format!("alias_for_{table}_{column}")
}

fn column_exists(model: &SchemaModel, table: &str, column: &str) -> bool {
    model.table(table).is_some_and(|t| t.has_column(column))
}

fn column_mut<'m>(model: &'m mut SchemaModel, table: &str, column: &str) -> Option<&'m mut Column> {
    model.tables.get_mut(table)?.columns.get_mut(column)
}
