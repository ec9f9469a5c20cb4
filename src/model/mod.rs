//! Data access seam used by model-loading controllers.
//!
//! The controller never talks to a database directly. It hands a
//! [`QueryBuilder`] to a [`ModelStore`] and expects zero or one model back.

mod memory;
mod query;

pub use memory::{MemoryStore, RelationDef, QUERY_LOG_LIMIT};
pub use query::{Condition, Include, QueryBuilder, RelationKind, SortDirection};

use crate::error::StoreError;

/// A single row, as stored by [`MemoryStore`].
pub type Row = serde_json::Value;

/// Executes lookups for model-loading controllers.
pub trait ModelStore {
    type Model;

    /// Execute `query` and return the first matching model, if any.
    fn find_one(&self, query: &QueryBuilder) -> Result<Option<Self::Model>, StoreError>;
}

impl<S: ModelStore + ?Sized> ModelStore for &S {
    type Model = S::Model;

    fn find_one(&self, query: &QueryBuilder) -> Result<Option<Self::Model>, StoreError> {
        (**self).find_one(query)
    }
}
