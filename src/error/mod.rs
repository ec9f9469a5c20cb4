//! Error types for model loading, data access, configuration and URL generation.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// The two ways loading a model before an action can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadErrorKind {
    /// The identifier parameter was required but not supplied.
    MissingParameter,
    /// The identifier was supplied but matched no row.
    NotFound,
}

impl LoadErrorKind {
    /// Conventional HTTP status the host pipeline answers with.
    pub fn status(self) -> u16 {
        match self {
            Self::MissingParameter => 400,
            Self::NotFound => 404,
        }
    }
}

/// Model loading errors, handed to the controller's error hook.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("Missing required parameter '{param}'")]
    MissingParameter { param: String },

    #[error("No model found where {column} = {id}")]
    NotFound { column: String, id: Value },
}

impl LoadError {
    pub fn missing_parameter(param: impl Into<String>) -> Self {
        Self::MissingParameter {
            param: param.into(),
        }
    }

    pub fn not_found(column: impl Into<String>, id: Value) -> Self {
        Self::NotFound {
            column: column.into(),
            id,
        }
    }

    pub fn kind(&self) -> LoadErrorKind {
        match self {
            Self::MissingParameter { .. } => LoadErrorKind::MissingParameter,
            Self::NotFound { .. } => LoadErrorKind::NotFound,
        }
    }

    pub fn status(&self) -> u16 {
        self.kind().status()
    }
}

/// Data access errors. These are never treated as "not found".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unknown collection '{0}'")]
    UnknownCollection(String),

    #[error("Unknown relation '{relation}' on collection '{collection}'")]
    UnknownRelation {
        collection: String,
        relation: String,
    },

    #[error("Cannot filter on '{column}': relation '{relation}' is not joined")]
    RelationNotJoined { relation: String, column: String },

    #[error("Query failed: {0}")]
    Query(String),
}

impl StoreError {
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

/// URL generation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Route '{route}' requires parameter '{param}'")]
    MissingRouteParam { route: String, param: String },

    #[error("Cannot build a '{scheme}' URL without host info")]
    NoHostInfo { scheme: String },
}

/// Unified error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Url(#[from] UrlError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
