//! Compiled statement plan types

use serde_json::Value;

/// One parameterized statement: template text with `?` placeholders, the
/// values bound to them, and the resource type it targets. Statement text
/// never contains interpolated user values; identifiers come only from the
/// trusted schema model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub statement: String,
    pub params: Vec<Value>,
    pub resource_type: String,
}

impl CompiledStatement {
    pub fn new(
        statement: impl Into<String>,
        params: Vec<Value>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            statement: statement.into(),
            params,
            resource_type: resource_type.into(),
        }
    }
}

/// Ordered sequence of statements produced for one request.
///
/// Kept as a sequence so relationship include joins can become additional
/// statements without a breaking change; today every plan holds the base
/// statement for the primary resource type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPlan {
    pub statements: Vec<CompiledStatement>,
}

impl QueryPlan {
    pub fn single(statement: CompiledStatement) -> Self {
        Self {
            statements: vec![statement],
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
