//! Model-loading controllers and model-aware URLs for MVC request pipelines.
//!
//! - [`controller`]: loads the record an action works on before the action
//!   runs, driven by per-action [`LoadPolicy`](controller::LoadPolicy).
//! - [`url`]: builds links that carry the loaded record's identifier.
//! - [`model`]: the lookup query and the store seam it runs against.
//! - [`config`]: declarative, serde-backed load configuration.

#![allow(clippy::module_inception)]

pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod model;
pub mod url;

pub use config::LoadConfig;
pub use controller::{
    ActionOutcome, ConfiguredController, Flow, Halt, LoadOutcome, LoadPolicy, ModelController,
    ModelLoadingController, Response,
};
pub use error::{Error, LoadError, LoadErrorKind, Result};
pub use model::{MemoryStore, ModelStore, QueryBuilder, RelationKind};
pub use url::{ModelUrl, Scheme, UrlGenerator, UrlManager, UrlTarget};

/// Request parameters, in the order they were supplied.
pub type Params = indexmap::IndexMap<String, serde_json::Value>;
