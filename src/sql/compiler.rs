//! Statement compiler
//!
//! Deterministically compiles a validated request descriptor plus a method
//! into a [`QueryPlan`]. All literal values travel as bound parameters;
//! only trusted model identifiers are concatenated into statement text.
//! Compiling the same descriptor against the same model twice yields
//! byte-identical plans.

use serde_json::Value;

use crate::error::{DataHookError, Result};
use crate::request::{Method, RequestDescriptor};
use crate::schema::{Column, SchemaModel, Table};
use crate::sql::plan::{CompiledStatement, QueryPlan};
use crate::types::SimplifiedType;

/// Compile the base statement for the request's primary resource type.
pub fn compile(model: &SchemaModel, method: Method, request: &RequestDescriptor) -> Result<QueryPlan> {
    let table = model
        .table(&request.resource_type)
        .ok_or_else(|| DataHookError::UnknownResource(request.resource_type.clone()))?;

    let statement = match method {
        Method::Get => compile_get(table, request)?,
        Method::Post => compile_post(table, request),
        Method::Patch => compile_patch(table, request)?,
        Method::Delete => compile_delete(table, request)?,
    };

    Ok(QueryPlan::single(statement))
}

fn compile_get(table: &Table, request: &RequestDescriptor) -> Result<CompiledStatement> {
    let fieldset = request.fields.get(&table.name).map(Vec::as_slice);
    let selectors = table.select_list(fieldset);
    if selectors.is_empty() {
        return Err(DataHookError::structure_integrity(format!(
            "no selectable columns for resource `{}`",
            table.name
        )));
    }

    let mut text = format!("SELECT {} FROM {}", selectors.join(", "), table.name);
    let mut params = Vec::new();

    if let Some(identifier) = &request.identifier {
        let key = primary_key(table)?;
        text.push_str(&format!(" WHERE {}.{} = ?", table.name, key));
        params.push(cast_identifier(table.column(key), identifier));
    }

    if !request.sort.is_empty() {
        let mut entries = Vec::with_capacity(request.sort.len());
        for key in &request.sort {
            let (column, direction) = match key.strip_prefix('-') {
                Some(column) => (column, "DESC"),
                None => (key.as_str(), "ASC"),
            };
            if !table.has_column(column) {
                return Err(DataHookError::UnknownAttribute {
                    resource: table.name.clone(),
                    attribute: column.to_string(),
                });
            }
            entries.push(format!("{}.{} {}", table.name, column, direction));
        }
        text.push_str(" ORDER BY ");
        text.push_str(&entries.join(", "));
    }

    if let Some(page) = &request.page {
        text.push_str(" LIMIT ? OFFSET ?");
        params.push(page.limit.into());
        params.push(page.offset.into());
    }

    Ok(CompiledStatement::new(text, params, &table.name))
}

fn compile_post(table: &Table, request: &RequestDescriptor) -> CompiledStatement {
    let attributes = request.attributes.clone().unwrap_or_default();
    CompiledStatement::new(
        format!("INSERT INTO {} SET ?", table.name),
        vec![Value::Object(attributes)],
        &table.name,
    )
}

fn compile_patch(table: &Table, request: &RequestDescriptor) -> Result<CompiledStatement> {
    let identifier = required_identifier(table, request, Method::Patch)?;
    let key = primary_key(table)?;
    let attributes = request.attributes.clone().unwrap_or_default();

    Ok(CompiledStatement::new(
        format!("UPDATE {} SET ? WHERE {}.{} = ?", table.name, table.name, key),
        vec![
            Value::Object(attributes),
            cast_identifier(table.column(key), identifier),
        ],
        &table.name,
    ))
}

fn compile_delete(table: &Table, request: &RequestDescriptor) -> Result<CompiledStatement> {
    let identifier = required_identifier(table, request, Method::Delete)?;
    let key = primary_key(table)?;

    Ok(CompiledStatement::new(
        format!("DELETE FROM {} WHERE {}.{} = ?", table.name, table.name, key),
        vec![cast_identifier(table.column(key), identifier)],
        &table.name,
    ))
}

fn required_identifier<'r>(
    table: &Table,
    request: &'r RequestDescriptor,
    method: Method,
) -> Result<&'r str> {
    request
        .identifier
        .as_deref()
        .ok_or_else(|| DataHookError::MissingIdentifier {
            resource: table.name.clone(),
            method: method.as_str().to_string(),
        })
}

fn primary_key(table: &Table) -> Result<&str> {
    table.primary_key().ok_or_else(|| {
        DataHookError::structure_integrity(format!(
            "table `{}` has no primary key column",
            table.name
        ))
    })
}

/// Cast the URL identifier string to the primary-key column's simplified
/// type so it binds with the right parameter type. An identifier that does
/// not parse binds as the raw string and fails at execution time.
fn cast_identifier(column: Option<&Column>, identifier: &str) -> Value {
    let simplified = match column {
        Some(column) => column.simplified_type,
        None => SimplifiedType::String,
    };
    match simplified {
        SimplifiedType::Number | SimplifiedType::Timestamp => identifier
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(identifier.to_string())),
        SimplifiedType::Float => identifier
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(identifier.to_string())),
        SimplifiedType::Boolean => match identifier.to_lowercase().trim() {
            "true" | "yes" | "1" => Value::Bool(true),
            "false" | "no" | "0" => Value::Bool(false),
            _ => Value::String(identifier.to_string()),
        },
        SimplifiedType::String => Value::String(identifier.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::blog_model;
    use serde_json::json;

    fn attributes(value: serde_json::Value) -> crate::request::Attributes {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_get_by_identifier() {
        let model = blog_model();
        let request = RequestDescriptor::new("article").with_identifier("5");

        let plan = compile(&model, Method::Get, &request).unwrap();
        assert_eq!(plan.len(), 1);

        let statement = &plan.statements[0];
        assert_eq!(
            statement.statement,
            "SELECT article.title, article.content FROM article WHERE article.id = ?"
        );
        assert_eq!(statement.params, vec![json!(5)]);
        assert_eq!(statement.resource_type, "article");
    }

    #[test]
    fn test_get_collection_has_no_where_clause() {
        let model = blog_model();
        let request = RequestDescriptor::new("article");

        let plan = compile(&model, Method::Get, &request).unwrap();
        let statement = &plan.statements[0];
        assert_eq!(statement.statement, "SELECT article.title, article.content FROM article");
        assert!(statement.params.is_empty());
    }

    #[test]
    fn test_get_applies_fieldset_and_sort() {
        let model = blog_model();
        let request = RequestDescriptor::new("article")
            .with_fields("article", vec!["title".into()])
            .with_sort("-title")
            .with_sort("content");

        let plan = compile(&model, Method::Get, &request).unwrap();
        assert_eq!(
            plan.statements[0].statement,
            "SELECT article.title FROM article ORDER BY article.title DESC, article.content ASC"
        );
    }

    #[test]
    fn test_get_appends_pagination_params() {
        let model = blog_model();
        let request = RequestDescriptor::new("article")
            .with_identifier("5")
            .with_page(20, 50);

        let plan = compile(&model, Method::Get, &request).unwrap();
        let statement = &plan.statements[0];
        assert_eq!(
            statement.statement,
            "SELECT article.title, article.content FROM article WHERE article.id = ? LIMIT ? OFFSET ?"
        );
        assert_eq!(statement.params, vec![json!(5), json!(20), json!(50)]);
    }

    #[test]
    fn test_get_uses_select_modifier() {
        let mut model = blog_model();
        model
            .tables
            .get_mut("article")
            .unwrap()
            .columns
            .get_mut("title")
            .unwrap()
            .select_modifier = Some("UPPER(article.title) AS title".into());

        let request = RequestDescriptor::new("article");
        let plan = compile(&model, Method::Get, &request).unwrap();
        assert_eq!(
            plan.statements[0].statement,
            "SELECT UPPER(article.title) AS title, article.content FROM article"
        );
    }

    #[test]
    fn test_post_binds_attribute_object() {
        let model = blog_model();
        let request = RequestDescriptor::new("article")
            .with_attributes(attributes(json!({"title": "Hello", "content": "World"})));

        let plan = compile(&model, Method::Post, &request).unwrap();
        let statement = &plan.statements[0];
        assert_eq!(statement.statement, "INSERT INTO article SET ?");
        assert_eq!(
            statement.params,
            vec![json!({"title": "Hello", "content": "World"})]
        );
    }

    #[test]
    fn test_patch_requires_identifier() {
        let model = blog_model();
        let request = RequestDescriptor::new("article")
            .with_attributes(attributes(json!({"title": "Hello"})));

        let err = compile(&model, Method::Patch, &request).unwrap_err();
        assert!(matches!(
            err,
            DataHookError::MissingIdentifier { method, .. } if method == "patch"
        ));
    }

    #[test]
    fn test_patch_binds_attributes_and_identifier() {
        let model = blog_model();
        let request = RequestDescriptor::new("article")
            .with_identifier("5")
            .with_attributes(attributes(json!({"title": "Hello"})));

        let plan = compile(&model, Method::Patch, &request).unwrap();
        let statement = &plan.statements[0];
        assert_eq!(
            statement.statement,
            "UPDATE article SET ? WHERE article.id = ?"
        );
        assert_eq!(statement.params, vec![json!({"title": "Hello"}), json!(5)]);
    }

    #[test]
    fn test_delete_requires_identifier() {
        let model = blog_model();
        let request = RequestDescriptor::new("article");

        let err = compile(&model, Method::Delete, &request).unwrap_err();
        assert!(matches!(
            err,
            DataHookError::MissingIdentifier { method, .. } if method == "delete"
        ));
    }

    #[test]
    fn test_delete_statement() {
        let model = blog_model();
        let request = RequestDescriptor::new("article").with_identifier("5");

        let plan = compile(&model, Method::Delete, &request).unwrap();
        let statement = &plan.statements[0];
        assert_eq!(statement.statement, "DELETE FROM article WHERE article.id = ?");
        assert_eq!(statement.params, vec![json!(5)]);
    }

    #[test]
    fn test_string_primary_key_binds_as_string() {
        let mut model = blog_model();
        {
            let article = model.tables.get_mut("article").unwrap();
            let id = article.columns.get_mut("id").unwrap();
            id.data_type = "VARCHAR".into();
            id.simplified_type = SimplifiedType::String;
        }

        let request = RequestDescriptor::new("article").with_identifier("abc-123");
        let plan = compile(&model, Method::Get, &request).unwrap();
        assert_eq!(plan.statements[0].params, vec![json!("abc-123")]);
    }

    #[test]
    fn test_compilation_is_idempotent() {
        let model = blog_model();
        let request = RequestDescriptor::new("article")
            .with_identifier("5")
            .with_fields("article", vec!["title".into()])
            .with_sort("-title")
            .with_page(10, 0);

        let first = compile(&model, Method::Get, &request).unwrap();
        let second = compile(&model, Method::Get, &request).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.statements[0].statement, second.statements[0].statement);
    }

    #[test]
    fn test_fieldset_of_only_hidden_columns_fails() {
        let mut model = blog_model();
        model
            .tables
            .get_mut("article")
            .unwrap()
            .columns
            .get_mut("title")
            .unwrap()
            .is_restricted = true;
        model
            .tables
            .get_mut("article")
            .unwrap()
            .columns
            .get_mut("content")
            .unwrap()
            .is_restricted = true;

        let request = RequestDescriptor::new("article");
        let err = compile(&model, Method::Get, &request).unwrap_err();
        assert!(err.to_string().contains("no selectable columns"));
    }
}
