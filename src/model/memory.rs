//! In-memory model store.
//!
//! Rows are plain JSON objects grouped by collection. Relations are declared
//! per collection and resolved at query time, so the store can answer the
//! same lookups a model-loading controller sends to a real database.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use super::query::{QueryBuilder, RelationKind, SortDirection};
use super::{ModelStore, Row};
use crate::error::StoreError;

/// How a relation links rows of one collection to another.
///
/// A related row matches when `related[foreign_key] == row[local_key]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    pub collection: String,
    pub foreign_key: String,
    pub local_key: String,
    pub many: bool,
}

impl RelationDef {
    /// `posts.author_id -> users.id`
    pub fn belongs_to(collection: impl Into<String>, local_key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            foreign_key: "id".to_string(),
            local_key: local_key.into(),
            many: false,
        }
    }

    /// `users.id -> profiles.user_id`, first match only.
    pub fn has_one(collection: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            foreign_key: foreign_key.into(),
            local_key: "id".to_string(),
            many: false,
        }
    }

    /// `posts.id -> comments.post_id`, all matches.
    pub fn has_many(collection: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            many: true,
            ..Self::has_one(collection, foreign_key)
        }
    }
}

/// Number of executed queries the store remembers.
pub const QUERY_LOG_LIMIT: usize = 256;

/// Rows and relations held in memory.
///
/// The store keeps the most recent [`QUERY_LOG_LIMIT`] queries for
/// inspection in tests and debugging. Older entries are dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Row>>,
    relations: HashMap<String, HashMap<String, RelationDef>>,
    executed: Mutex<VecDeque<QueryBuilder>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row to a collection, creating the collection if needed.
    pub fn insert(&mut self, collection: &str, row: Row) -> &mut Self {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(row);
        self
    }

    /// Declare an empty collection.
    pub fn create_collection(&mut self, collection: &str) -> &mut Self {
        self.collections.entry(collection.to_string()).or_default();
        self
    }

    pub fn define_relation(&mut self, collection: &str, name: &str, def: RelationDef) -> &mut Self {
        self.relations
            .entry(collection.to_string())
            .or_default()
            .insert(name.to_string(), def);
        self
    }

    /// The remembered queries, oldest first.
    pub fn executed(&self) -> Vec<QueryBuilder> {
        self.log().iter().cloned().collect()
    }

    pub fn query_count(&self) -> usize {
        self.log().len()
    }

    pub fn last_query(&self) -> Option<QueryBuilder> {
        self.log().back().cloned()
    }

    pub fn clear_log(&self) {
        self.log().clear();
    }

    fn log(&self) -> MutexGuard<'_, VecDeque<QueryBuilder>> {
        self.executed.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, query: &QueryBuilder) {
        let mut log = self.log();
        if log.len() == QUERY_LOG_LIMIT {
            log.pop_front();
        }
        log.push_back(query.clone());
    }

    /// Execute a query and return every matching row with its includes attached.
    pub fn find_all(&self, query: &QueryBuilder) -> Result<Vec<Row>, StoreError> {
        self.record(query);

        let rows = self
            .collections
            .get(&query.collection)
            .ok_or_else(|| StoreError::UnknownCollection(query.collection.clone()))?;

        let mut defs = Vec::with_capacity(query.includes.len());
        for include in &query.includes {
            let def = self
                .relations
                .get(&query.collection)
                .and_then(|rels| rels.get(&include.relation))
                .ok_or_else(|| StoreError::UnknownRelation {
                    collection: query.collection.clone(),
                    relation: include.relation.clone(),
                })?;
            defs.push((include.relation.as_str(), def));
        }

        let sort_column = query.order_by.as_ref().map(|(column, _)| column.as_str());
        let referenced = query
            .conditions
            .iter()
            .map(|cond| cond.column.as_str())
            .chain(sort_column);
        for column in referenced {
            if let Some((relation, _)) = query.local_column(column).split_once('.') {
                if query.include_kind(relation) != Some(RelationKind::JoinWith) {
                    return Err(StoreError::RelationNotJoined {
                        relation: relation.to_string(),
                        column: column.to_string(),
                    });
                }
            }
        }

        let mut matched = Vec::new();
        for row in rows {
            let mut row = row.clone();
            for (name, def) in &defs {
                let related = self.related(&row, def);
                if let Value::Object(map) = &mut row {
                    map.insert(name.to_string(), related);
                }
            }
            let holds = query.conditions.iter().all(|cond| {
                lookup(&row, query.local_column(&cond.column))
                    .into_iter()
                    .any(|value| values_match(value, &cond.value))
            });
            if holds {
                matched.push(row);
            }
        }

        if let Some((column, direction)) = &query.order_by {
            let column = query.local_column(column);
            matched.sort_by(|a, b| {
                let ord = compare_values(
                    lookup(a, column).first().copied(),
                    lookup(b, column).first().copied(),
                );
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit_val {
            matched.truncate(limit);
        }

        tracing::trace!(
            collection = %query.collection,
            matched = matched.len(),
            "memory store query executed"
        );

        Ok(matched)
    }

    fn related(&self, row: &Row, def: &RelationDef) -> Value {
        let key = match row.get(&def.local_key) {
            Some(key) if !key.is_null() => key,
            _ => return if def.many { Value::Array(Vec::new()) } else { Value::Null },
        };

        let mut hits = self
            .collections
            .get(&def.collection)
            .into_iter()
            .flatten()
            .filter(|candidate| {
                candidate
                    .get(&def.foreign_key)
                    .is_some_and(|fk| values_match(fk, key))
            })
            .cloned();

        if def.many {
            Value::Array(hits.collect())
        } else {
            hits.next().unwrap_or(Value::Null)
        }
    }
}

impl ModelStore for MemoryStore {
    type Model = Row;

    fn find_one(&self, query: &QueryBuilder) -> Result<Option<Row>, StoreError> {
        Ok(self.find_all(query)?.into_iter().next())
    }
}

/// Values a column resolves to. `author.name` reads through an attached
/// relation and yields one value per related row.
fn lookup<'a>(row: &'a Value, column: &str) -> Vec<&'a Value> {
    match column.split_once('.') {
        Some((relation, field)) => match row.get(relation) {
            Some(Value::Array(items)) => items.iter().filter_map(|item| item.get(field)).collect(),
            Some(related @ Value::Object(_)) => related.get(field).into_iter().collect(),
            _ => Vec::new(),
        },
        None => row.get(column).into_iter().collect(),
    }
}

/// Equality that tolerates request parameters arriving as strings.
fn values_match(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || x.as_f64() == y.as_f64(),
        (Value::String(s), other) | (other, Value::String(s))
            if matches!(other, Value::Number(_) | Value::Bool(_)) =>
        {
            other.to_string() == *s
        }
        _ => a == b,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blog() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .insert("users", json!({"id": 1, "name": "ada"}))
            .insert("users", json!({"id": 2, "name": "grace"}))
            .insert("posts", json!({"id": 10, "title": "Engines", "author_id": 1}))
            .insert("posts", json!({"id": 11, "title": "Compilers", "author_id": 2}))
            .insert("comments", json!({"id": 100, "post_id": 10, "body": "first"}))
            .insert("comments", json!({"id": 101, "post_id": 10, "body": "second"}))
            .define_relation("posts", "author", RelationDef::belongs_to("users", "author_id"))
            .define_relation("posts", "comments", RelationDef::has_many("comments", "post_id"));
        store
    }

    #[test]
    fn test_find_one_by_id() {
        let store = blog();
        let row = store
            .find_one(&QueryBuilder::new("posts").and_where("id", 11))
            .unwrap()
            .unwrap();
        assert_eq!(row["title"], "Compilers");
    }

    #[test]
    fn test_string_param_matches_numeric_id() {
        let store = blog();
        let row = store
            .find_one(&QueryBuilder::new("posts").and_where("id", "10"))
            .unwrap();
        assert_eq!(row.unwrap()["id"], 10);
    }

    #[test]
    fn test_no_match_is_none() {
        let store = blog();
        let row = store
            .find_one(&QueryBuilder::new("posts").and_where("id", 99))
            .unwrap();
        assert!(row.is_none());
    }

    #[test]
    fn test_with_attaches_relations() {
        let store = blog();
        let row = store
            .find_one(
                &QueryBuilder::new("posts")
                    .and_where("id", 10)
                    .with("author")
                    .with("comments"),
            )
            .unwrap()
            .unwrap();
        assert_eq!(row["author"]["name"], "ada");
        assert_eq!(row["comments"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_join_with_allows_relation_filter() {
        let store = blog();
        let row = store
            .find_one(
                &QueryBuilder::new("posts")
                    .join_with("author")
                    .and_where("author.name", "grace"),
            )
            .unwrap()
            .unwrap();
        assert_eq!(row["id"], 11);
    }

    #[test]
    fn test_filter_on_unjoined_relation_fails() {
        let store = blog();
        let err = store
            .find_one(
                &QueryBuilder::new("posts")
                    .with("author")
                    .and_where("author.name", "grace"),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::RelationNotJoined { .. }));
    }

    #[test]
    fn test_collection_qualified_column_reads_row() {
        let store = blog();
        let row = store
            .find_one(
                &QueryBuilder::new("posts")
                    .join_with("author")
                    .and_where("posts.id", "11")
                    .and_where("author.name", "grace"),
            )
            .unwrap()
            .unwrap();
        assert_eq!(row["title"], "Compilers");

        let rows = store
            .find_all(&QueryBuilder::new("posts").order_by("posts.title", SortDirection::Desc))
            .unwrap();
        assert_eq!(rows[0]["title"], "Engines");
    }

    #[test]
    fn test_unknown_relation_and_collection() {
        let store = blog();
        assert!(matches!(
            store.find_one(&QueryBuilder::new("posts").with("tags")),
            Err(StoreError::UnknownRelation { .. })
        ));
        assert!(matches!(
            store.find_one(&QueryBuilder::new("pages")),
            Err(StoreError::UnknownCollection(_))
        ));
    }

    #[test]
    fn test_order_and_limit() {
        let store = blog();
        let rows = store
            .find_all(
                &QueryBuilder::new("posts")
                    .order_by("title", SortDirection::Asc)
                    .limit(1),
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Compilers");
    }

    #[test]
    fn test_executed_log() {
        let store = blog();
        assert_eq!(store.query_count(), 0);
        let _ = store.find_one(&QueryBuilder::new("posts").and_where("id", 10));
        assert_eq!(store.query_count(), 1);
        assert_eq!(store.last_query().unwrap().collection, "posts");
        store.clear_log();
        assert!(store.executed().is_empty());
    }

    #[test]
    fn test_executed_log_is_capped() {
        let store = blog();
        for id in 0..QUERY_LOG_LIMIT + 10 {
            let _ = store.find_one(&QueryBuilder::new("posts").and_where("id", id));
        }
        assert_eq!(store.query_count(), QUERY_LOG_LIMIT);
        let oldest = &store.executed()[0];
        assert_eq!(oldest.conditions[0].value, serde_json::json!(10));
        let newest = store.last_query().unwrap();
        assert_eq!(newest.conditions[0].value, serde_json::json!(QUERY_LOG_LIMIT + 9));
    }
}
