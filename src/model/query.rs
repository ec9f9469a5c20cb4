//! Query builder for chainable model lookups.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a named relation is included in a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Attach the related rows to the result.
    With,
    /// Attach the related rows and let the relation take part in
    /// filtering and sorting of the main query.
    JoinWith,
}

/// A single equality condition, `column == value`.
///
/// A dotted column (`author.name`) targets a joined relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub value: Value,
}

/// A relation requested alongside the main rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub relation: String,
    pub kind: RelationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// A query builder for chainable lookups against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    pub collection: String,
    pub conditions: Vec<Condition>,
    pub includes: Vec<Include>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit_val: Option<usize>,
}

impl QueryBuilder {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            conditions: Vec::new(),
            includes: Vec::new(),
            order_by: None,
            limit_val: None,
        }
    }

    /// Add an equality condition.
    pub fn and_where(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Eager-load a relation.
    pub fn with(self, relation: impl Into<String>) -> Self {
        self.include(relation, RelationKind::With)
    }

    /// Eager-load a relation and make it available to conditions and sorting.
    pub fn join_with(self, relation: impl Into<String>) -> Self {
        self.include(relation, RelationKind::JoinWith)
    }

    /// Include a relation. Re-including a relation upgrades `With` to
    /// `JoinWith` but never downgrades it.
    pub fn include(mut self, relation: impl Into<String>, kind: RelationKind) -> Self {
        let relation = relation.into();
        match self.includes.iter_mut().find(|inc| inc.relation == relation) {
            Some(existing) => {
                if kind == RelationKind::JoinWith {
                    existing.kind = RelationKind::JoinWith;
                }
            }
            None => self.includes.push(Include { relation, kind }),
        }
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit_val = Some(limit);
        self
    }

    /// Kind of the named include, if requested.
    pub fn include_kind(&self, relation: &str) -> Option<RelationKind> {
        self.includes
            .iter()
            .find(|inc| inc.relation == relation)
            .map(|inc| inc.kind)
    }

    pub fn include_names(&self) -> Vec<&str> {
        self.includes.iter().map(|inc| inc.relation.as_str()).collect()
    }

    /// Strip a qualifier naming the queried collection itself, so that
    /// `posts.id` on a `posts` query reads `id` from the row.
    pub fn local_column<'a>(&self, column: &'a str) -> &'a str {
        column
            .strip_prefix(self.collection.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(column)
    }

    /// Build the document query string and its bind variables.
    pub fn build_query(&self) -> (String, IndexMap<String, Value>) {
        let mut query = format!("FOR doc IN {}", self.collection);
        let mut bind_vars = IndexMap::new();

        if !self.conditions.is_empty() {
            let clauses: Vec<String> = self
                .conditions
                .iter()
                .map(|cond| {
                    let name = bind_name(&cond.column, &bind_vars);
                    let path = document_path(self.local_column(&cond.column));
                    let clause = format!("{} == @{}", path, name);
                    bind_vars.insert(name, cond.value.clone());
                    clause
                })
                .collect();
            query.push_str(&format!(" FILTER {}", clauses.join(" AND ")));
        }

        if let Some((column, direction)) = &self.order_by {
            let dir = match direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            let path = document_path(self.local_column(column));
            query.push_str(&format!(" SORT {} {}", path, dir));
        }

        if let Some(limit) = self.limit_val {
            query.push_str(&format!(" LIMIT {}", limit));
        }

        query.push_str(" RETURN doc");

        (query, bind_vars)
    }
}

/// `title` reads from the document, `author.name` from the joined relation.
fn document_path(column: &str) -> String {
    if column.contains('.') {
        column.to_string()
    } else {
        format!("doc.{}", column)
    }
}

fn bind_name(column: &str, taken: &IndexMap<String, Value>) -> String {
    let base: String = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if !taken.contains_key(&base) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}", base, n);
        if !taken.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_query() {
        let qb = QueryBuilder::new("posts")
            .and_where("id", 42)
            .and_where("author.name", "ada")
            .order_by("created_at", SortDirection::Desc)
            .limit(1);
        let (query, binds) = qb.build_query();
        assert_eq!(
            query,
            "FOR doc IN posts FILTER doc.id == @id AND author.name == @author_name SORT doc.created_at DESC LIMIT 1 RETURN doc"
        );
        assert_eq!(binds.get("id"), Some(&json!(42)));
        assert_eq!(binds.get("author_name"), Some(&json!("ada")));
    }

    #[test]
    fn test_collection_qualified_column() {
        let qb = QueryBuilder::new("posts")
            .join_with("author")
            .and_where("posts.id", 42)
            .order_by("posts.created_at", SortDirection::Asc);
        let (query, binds) = qb.build_query();
        assert_eq!(
            query,
            "FOR doc IN posts FILTER doc.id == @posts_id SORT doc.created_at ASC RETURN doc"
        );
        assert_eq!(binds.get("posts_id"), Some(&json!(42)));
        assert_eq!(qb.local_column("postscript.id"), "postscript.id");
        assert_eq!(qb.local_column("author.name"), "author.name");
    }

    #[test]
    fn test_build_query_without_filter() {
        let (query, binds) = QueryBuilder::new("users").build_query();
        assert_eq!(query, "FOR doc IN users RETURN doc");
        assert!(binds.is_empty());
    }

    #[test]
    fn test_duplicate_columns_get_distinct_binds() {
        let (query, binds) = QueryBuilder::new("posts")
            .and_where("status", "draft")
            .and_where("status", "review")
            .build_query();
        assert!(query.contains("doc.status == @status AND doc.status == @status_1"));
        assert_eq!(binds.len(), 2);
    }

    #[test]
    fn test_include_upgrades_but_never_downgrades() {
        let qb = QueryBuilder::new("posts")
            .with("author")
            .join_with("author")
            .with("author")
            .with("comments");
        assert_eq!(qb.include_names(), vec!["author", "comments"]);
        assert_eq!(qb.include_kind("author"), Some(RelationKind::JoinWith));
        assert_eq!(qb.include_kind("comments"), Some(RelationKind::With));
        assert_eq!(qb.include_kind("tags"), None);
    }
}
