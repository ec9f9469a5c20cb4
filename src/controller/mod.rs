//! Model-loading controllers.
//!
//! A feature controller implements [`ModelController`] (or is built from a
//! [`LoadConfig`](crate::config::LoadConfig) via [`ConfiguredController`]),
//! and each request wraps it in a [`ModelLoadingController`] together with
//! the store to load from.

mod controller;
mod flow;
mod loader;

pub use controller::{
    ConfiguredController, LoadExceptions, LoadPolicy, ModelController, RelationHints,
    DEFAULT_ID_COLUMN, DEFAULT_PARAM_NAME,
};
pub use flow::{ActionOutcome, Flow, Halt, Response};
pub use loader::{LoadOutcome, ModelLoadingController};
