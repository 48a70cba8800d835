//! Structured request descriptor
//!
//! The shape delivered by the external JSON:API query-string parser, plus
//! the body attributes the HTTP boundary attaches for mutations. Constructed
//! once per inbound request, consumed read-only by validation and statement
//! compilation, discarded after the request completes.

use indexmap::IndexMap;
use serde_json::Value;

/// HTTP-style method driving the statement template family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }

    /// Whether this method may carry body attributes.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Post | Self::Patch | Self::Delete)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pagination window (`page[limit]` / `page[offset]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

/// Body attributes of a mutation: attribute name → JSON value.
pub type Attributes = serde_json::Map<String, Value>;

/// Parsed request as delivered by the query-string parsing collaborator.
///
/// `fields` maps table name → ordered column selection; an empty column
/// list means no restriction. Sort entries carry an optional leading `-`
/// for descending order. `filter` has no representation here: the filter
/// grammar is out of scope and the parser always delivers it empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDescriptor {
    /// Logical entity name, corresponding to a table
    pub resource_type: String,
    /// Identifier for single-resource requests
    pub identifier: Option<String>,
    /// Whether this is a relationships-only request (`/relationships/...`)
    pub relationships: bool,
    /// Relationship alias addressed by the request path
    pub relationship_type: Option<String>,
    /// Include entries; dotted entries are relationship chains
    pub include: Vec<String>,
    /// Sparse fieldsets: table name → ordered column names
    pub fields: IndexMap<String, Vec<String>>,
    /// Sort column references, `-` prefix meaning descending
    pub sort: Vec<String>,
    pub page: Option<Page>,
    /// Body attributes attached by the HTTP boundary for mutations
    pub attributes: Option<Attributes>,
}

impl RequestDescriptor {
    /// Create a descriptor for the given resource type
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..Self::default()
        }
    }

    /// Set the resource identifier
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Address a relationship, optionally as a relationships-only request
    pub fn with_relationship(mut self, alias: impl Into<String>, relationships_only: bool) -> Self {
        self.relationship_type = Some(alias.into());
        self.relationships = relationships_only;
        self
    }

    /// Add an include entry (possibly a dotted chain)
    pub fn with_include(mut self, entry: impl Into<String>) -> Self {
        self.include.push(entry.into());
        self
    }

    /// Add a sparse fieldset for a table
    pub fn with_fields(mut self, table: impl Into<String>, columns: Vec<String>) -> Self {
        self.fields.insert(table.into(), columns);
        self
    }

    /// Add a sort key (`-` prefix for descending)
    pub fn with_sort(mut self, key: impl Into<String>) -> Self {
        self.sort.push(key.into());
        self
    }

    /// Set the pagination window
    pub fn with_page(mut self, limit: u64, offset: u64) -> Self {
        self.page = Some(Page { limit, offset });
        self
    }

    /// Attach body attributes
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_strings() {
        assert_eq!(Method::Get.as_str(), "get");
        assert_eq!(Method::Patch.to_string(), "patch");
    }

    #[test]
    fn test_mutation_methods() {
        assert!(!Method::Get.is_mutation());
        assert!(Method::Post.is_mutation());
        assert!(Method::Patch.is_mutation());
        assert!(Method::Delete.is_mutation());
    }

    #[test]
    fn test_descriptor_builder() {
        let request = RequestDescriptor::new("article")
            .with_identifier("5")
            .with_include("comments.author")
            .with_fields("article", vec!["title".into(), "content".into()])
            .with_sort("-createdOn")
            .with_page(20, 50);

        assert_eq!(request.resource_type, "article");
        assert_eq!(request.identifier.as_deref(), Some("5"));
        assert_eq!(request.include, vec!["comments.author"]);
        assert_eq!(request.fields["article"], vec!["title", "content"]);
        assert_eq!(request.sort, vec!["-createdOn"]);
        assert_eq!(request.page, Some(Page { limit: 20, offset: 50 }));
        assert!(request.attributes.is_none());
        assert!(!request.relationships);
    }

    #[test]
    fn test_relationship_request() {
        let request = RequestDescriptor::new("article")
            .with_identifier("5")
            .with_relationship("comments", true);

        assert_eq!(request.relationship_type.as_deref(), Some("comments"));
        assert!(request.relationships);
    }
}
