//! Per-request model loading around an action.
//!
//! One [`ModelLoadingController`] is created per request. It resolves the
//! action's [`LoadPolicy`], runs the lookup, keeps the loaded model for the
//! action body, and primes the request's [`ModelUrl`] with the identifier:
//!
//! ```text
//! START → policy resolved → skipped
//!                         → optional, no id
//!                         → query executed → found → url context set
//!                                          → not found → error hook
//!       → action run | halted
//! ```

use serde_json::Value;

use super::controller::{LoadPolicy, ModelController};
use super::flow::{ActionOutcome, Flow};
use crate::error::{LoadError, StoreError};
use crate::model::ModelStore;
use crate::url::{ModelUrl, UrlGenerator};
use crate::Params;

/// Where the before-action hook ended for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Skipped,
    OptionalNoId,
    Found,
    MissingParameter,
    NotFound,
}

pub struct ModelLoadingController<C, S: ModelStore> {
    controller: C,
    store: S,
    model_id: Option<Value>,
    model: Option<S::Model>,
    outcome: Option<LoadOutcome>,
}

impl<C, S> ModelLoadingController<C, S>
where
    C: ModelController,
    S: ModelStore,
{
    pub fn new(controller: C, store: S) -> Self {
        Self {
            controller,
            store,
            model_id: None,
            model: None,
            outcome: None,
        }
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The model loaded for this request, if any.
    pub fn model(&self) -> Option<&S::Model> {
        self.model.as_ref()
    }

    /// Move the loaded model out, e.g. to hand it to a view.
    pub fn take_model(&mut self) -> Option<S::Model> {
        self.model.take()
    }

    /// The identifier taken from the request parameters.
    pub fn model_id(&self) -> Option<&Value> {
        self.model_id.as_ref()
    }

    pub fn outcome(&self) -> Option<LoadOutcome> {
        self.outcome
    }

    /// Run `action`: capture the identifier, load the model, then call
    /// `body` unless loading halted the pipeline.
    ///
    /// Data access failures are returned as errors, never as "not found".
    pub fn run_action<G, R, F>(
        &mut self,
        action: &str,
        params: &Params,
        urls: &mut ModelUrl<G>,
        body: F,
    ) -> Result<ActionOutcome<R>, StoreError>
    where
        G: UrlGenerator,
        F: FnOnce(&Self, &ModelUrl<G>) -> R,
    {
        self.capture_model_id(action, params);

        match self.before_action(action, urls)? {
            Flow::Continue => Ok(ActionOutcome::Ran(body(&*self, &*urls))),
            Flow::Halt(halt) => {
                tracing::debug!(action, status = halt.status(), "action halted");
                Ok(ActionOutcome::Halted(halt))
            }
        }
    }

    /// Reset per-request state and take the identifier from `params`,
    /// unless the action never loads. A `null` parameter counts as absent.
    pub fn capture_model_id(&mut self, action: &str, params: &Params) {
        self.model = None;
        self.model_id = None;
        self.outcome = None;

        if self.controller.load_policy(action) == LoadPolicy::Skip {
            return;
        }
        self.model_id = params
            .get(self.controller.param_name())
            .filter(|value| !value.is_null())
            .cloned();
    }

    /// Load the model for `action` using the captured identifier.
    pub fn before_action<G: UrlGenerator>(
        &mut self,
        action: &str,
        urls: &mut ModelUrl<G>,
    ) -> Result<Flow, StoreError> {
        let policy = self.controller.load_policy(action);
        tracing::debug!(action, policy = ?policy, "model load policy resolved");

        if policy == LoadPolicy::Skip {
            self.outcome = Some(LoadOutcome::Skipped);
            return Ok(Flow::Continue);
        }

        let Some(id) = self.model_id.clone() else {
            if policy == LoadPolicy::Optional {
                self.outcome = Some(LoadOutcome::OptionalNoId);
                return Ok(Flow::Continue);
            }
            self.outcome = Some(LoadOutcome::MissingParameter);
            let error = LoadError::missing_parameter(self.controller.param_name());
            return Ok(self.controller.handle_error(error));
        };

        let id_column = self.controller.id_column_name();
        let mut query = self
            .controller
            .model_load_query(action)
            .and_where(id_column, id.clone());
        for (relation, kind) in self.controller.relations_for(action) {
            query = query.include(relation, kind);
        }

        tracing::debug!(
            action,
            collection = %query.collection,
            id = %id,
            includes = ?query.include_names(),
            "loading model"
        );
        self.model = self.store.find_one(&query)?;

        if self.model.is_none() {
            self.outcome = Some(LoadOutcome::NotFound);
            let error = LoadError::not_found(id_column, id);
            return Ok(self.controller.handle_error(error));
        }

        self.outcome = Some(LoadOutcome::Found);
        urls.set_up(self.controller.param_name(), id);
        Ok(Flow::Continue)
    }
}
