//! The capability a feature controller provides to get its model loaded.
//!
//! A controller supplies the base lookup query and, optionally, which
//! actions are exempt from loading, which relations each action needs,
//! where the identifier lives, and how load errors are answered.
//!
//! ```
//! use model_controller::controller::{LoadExceptions, LoadPolicy, ModelController};
//! use model_controller::model::QueryBuilder;
//!
//! struct PostsController;
//!
//! impl ModelController for PostsController {
//!     fn model_load_query(&self, _action: &str) -> QueryBuilder {
//!         QueryBuilder::new("posts")
//!     }
//!
//!     fn model_load_exceptions(&self) -> LoadExceptions {
//!         LoadExceptions::from([
//!             ("index".to_string(), LoadPolicy::Skip),
//!             ("search".to_string(), LoadPolicy::Optional),
//!         ])
//!     }
//! }
//!
//! assert_eq!(PostsController.load_policy("index"), LoadPolicy::Skip);
//! assert_eq!(PostsController.load_policy("view"), LoadPolicy::Required);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::flow::Flow;
use crate::config::LoadConfig;
use crate::error::LoadError;
use crate::model::{QueryBuilder, RelationKind};

pub const DEFAULT_ID_COLUMN: &str = "id";
pub const DEFAULT_PARAM_NAME: &str = "id";

/// Whether an action needs its model loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// The identifier must be supplied and must match a row.
    #[default]
    Required,
    /// Load only when the identifier is supplied.
    Optional,
    /// Never load.
    Skip,
}

/// Action → policy. Actions not listed are `Required`.
pub type LoadExceptions = IndexMap<String, LoadPolicy>;

/// Action → (relation → kind), applied in insertion order.
pub type RelationHints = IndexMap<String, IndexMap<String, RelationKind>>;

pub trait ModelController {
    /// Base lookup for `action`. The identifier condition and the action's
    /// relation hints are added on top of it.
    fn model_load_query(&self, action: &str) -> QueryBuilder;

    fn model_load_exceptions(&self) -> LoadExceptions {
        LoadExceptions::new()
    }

    fn required_relations(&self) -> RelationHints {
        RelationHints::new()
    }

    fn id_column_name(&self) -> &str {
        DEFAULT_ID_COLUMN
    }

    fn param_name(&self) -> &str {
        DEFAULT_PARAM_NAME
    }

    fn load_policy(&self, action: &str) -> LoadPolicy {
        self.model_load_exceptions()
            .get(action)
            .copied()
            .unwrap_or_default()
    }

    fn relations_for(&self, action: &str) -> Vec<(String, RelationKind)> {
        self.required_relations()
            .shift_remove(action)
            .map(|hints| hints.into_iter().collect())
            .unwrap_or_default()
    }

    /// Answer a load error. Returning [`Flow::Halt`] keeps the action from
    /// running; returning [`Flow::Continue`] runs it without a model.
    fn handle_error(&self, error: LoadError) -> Flow {
        tracing::debug!(kind = ?error.kind(), "model load failed: {}", error);
        Flow::halt(error)
    }
}

/// A controller described entirely by a [`LoadConfig`] and a base query.
pub struct ConfiguredController<F> {
    config: LoadConfig,
    base_query: F,
}

impl<F> ConfiguredController<F>
where
    F: Fn(&str) -> QueryBuilder,
{
    pub fn new(config: LoadConfig, base_query: F) -> Self {
        Self { config, base_query }
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }
}

impl<F> ModelController for ConfiguredController<F>
where
    F: Fn(&str) -> QueryBuilder,
{
    fn model_load_query(&self, action: &str) -> QueryBuilder {
        (self.base_query)(action)
    }

    fn model_load_exceptions(&self) -> LoadExceptions {
        self.config.exceptions.clone()
    }

    fn required_relations(&self) -> RelationHints {
        self.config.relations.clone()
    }

    fn id_column_name(&self) -> &str {
        &self.config.id_column
    }

    fn param_name(&self) -> &str {
        &self.config.param_name
    }

    fn load_policy(&self, action: &str) -> LoadPolicy {
        self.config.policy(action)
    }

    fn relations_for(&self, action: &str) -> Vec<(String, RelationKind)> {
        self.config.relations_for(action)
    }
}
