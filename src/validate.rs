//! Request validation against the schema model
//!
//! Pure checks, run in order and short-circuiting at the first failure.
//! Validation never mutates the model or the descriptor; the only output
//! is the result.

use crate::error::{DataHookError, Result};
use crate::request::{Method, RequestDescriptor};
use crate::schema::{SchemaModel, Table};

/// Validate a request descriptor against the schema model.
///
/// Check order: resource type, addressed relationship alias, include
/// chains, sparse fieldsets, sort keys, body attributes. Body attribute
/// keys must be writable (non-key) columns; POST additionally requires
/// every required column to be present, while PATCH is a pure partial
/// update and requires none.
pub fn validate(model: &SchemaModel, method: Method, request: &RequestDescriptor) -> Result<()> {
    let table = model
        .table(&request.resource_type)
        .ok_or_else(|| DataHookError::UnknownResource(request.resource_type.clone()))?;

    if let Some(alias) = &request.relationship_type {
        if !table.has_relationship(alias) {
            return Err(DataHookError::UnknownRelationship {
                resource: request.resource_type.clone(),
                alias: alias.clone(),
            });
        }
    }

    for entry in &request.include {
        validate_include_chain(model, table, entry)?;
    }

    for (table_name, columns) in &request.fields {
        let target = model
            .table(table_name)
            .ok_or_else(|| DataHookError::UnknownResource(table_name.clone()))?;
        for column in columns {
            if !target.has_column(column) {
                return Err(DataHookError::UnknownAttribute {
                    resource: table_name.clone(),
                    attribute: column.clone(),
                });
            }
        }
    }

    for key in &request.sort {
        let column = key.strip_prefix('-').unwrap_or(key);
        if !table.has_column(column) {
            return Err(DataHookError::UnknownAttribute {
                resource: request.resource_type.clone(),
                attribute: column.to_string(),
            });
        }
    }

    if method.is_mutation() {
        validate_attributes(table, method, request)?;
    }

    Ok(())
}

/// Walk a dotted include entry left to right, resolving each segment as a
/// relationship on the table reached so far.
fn validate_include_chain(model: &SchemaModel, start: &Table, entry: &str) -> Result<()> {
    let mut current = start;
    for segment in entry.split('.') {
        let Some(relationship) = current.relationship(segment) else {
            return Err(DataHookError::UnknownRelationship {
                resource: current.name.clone(),
                alias: segment.to_string(),
            });
        };
        current = model.table(&relationship.related_table).ok_or_else(|| {
            DataHookError::structure_integrity(format!(
                "relationship `{segment}` on table `{}` points at unknown table `{}`",
                current.name, relationship.related_table
            ))
        })?;
    }
    Ok(())
}

fn validate_attributes(table: &Table, method: Method, request: &RequestDescriptor) -> Result<()> {
    if let Some(attributes) = &request.attributes {
        for key in attributes.keys() {
            match table.column(key) {
                Some(column) if column.is_writable() => {}
                _ => {
                    return Err(DataHookError::UnknownAttribute {
                        resource: table.name.clone(),
                        attribute: key.clone(),
                    });
                }
            }
        }
    }

    if method == Method::Post {
        for name in table.required_columns() {
            let present = request
                .attributes
                .as_ref()
                .is_some_and(|attributes| attributes.contains_key(name));
            if !present {
                return Err(DataHookError::MissingAttribute {
                    resource: table.name.clone(),
                    attribute: name.to_string(),
                });
            }
        }
    }

    Ok(())
}
