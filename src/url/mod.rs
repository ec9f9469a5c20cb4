//! Model-aware URL building.
//!
//! [`ModelUrl`] wraps a [`UrlGenerator`] and remembers the identifier of the
//! model loaded for the current request. Every structured target built
//! afterwards carries that identifier, unless the caller already supplied
//! the parameter:
//!
//! ```
//! use model_controller::url::{ModelUrl, Scheme, UrlManager, UrlTarget};
//! use serde_json::json;
//!
//! let mut urls = ModelUrl::new(UrlManager::new());
//! urls.set_up("id", json!(42));
//!
//! let edit = urls.to(UrlTarget::route("/edit"), Scheme::Relative).unwrap();
//! assert_eq!(edit, "/edit?id=42");
//! ```
//!
//! A `ModelUrl` belongs to one request. It is created with the request and
//! dropped with it, so identifiers never leak between requests.

mod router;

pub use router::UrlManager;

use serde_json::Value;

use crate::error::UrlError;
use crate::Params;

/// What to build a URL for.
#[derive(Debug, Clone, PartialEq)]
pub enum UrlTarget {
    /// A literal path or URL, used as-is.
    Path(String),
    /// A route name plus parameters.
    Route { route: String, params: Params },
}

impl UrlTarget {
    pub fn route(route: impl Into<String>) -> Self {
        Self::Route {
            route: route.into(),
            params: Params::new(),
        }
    }

    pub fn route_with(route: impl Into<String>, params: Params) -> Self {
        Self::Route {
            route: route.into(),
            params,
        }
    }

    /// Add a parameter. Has no effect on a plain path.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Self::Route { params, .. } = &mut self {
            params.insert(key.into(), value.into());
        }
        self
    }

    pub fn params(&self) -> Option<&Params> {
        match self {
            Self::Path(_) => None,
            Self::Route { params, .. } => Some(params),
        }
    }
}

impl From<&str> for UrlTarget {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for UrlTarget {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

/// Scheme handling for generated URLs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scheme {
    /// Path only, e.g. `/posts/1`.
    #[default]
    Relative,
    /// Prefixed with the configured host info.
    Absolute,
    /// Prefixed with the host info, using this scheme (`https`, `ws`, ...).
    /// Targets that are already absolute URLs get their scheme replaced.
    Explicit(String),
}

/// The link-building collaborator wrapped by [`ModelUrl`].
pub trait UrlGenerator {
    fn create_url(&self, target: &UrlTarget, scheme: &Scheme) -> Result<String, UrlError>;
}

impl<G: UrlGenerator + ?Sized> UrlGenerator for &G {
    fn create_url(&self, target: &UrlTarget, scheme: &Scheme) -> Result<String, UrlError> {
        (**self).create_url(target, scheme)
    }
}

/// The identifier injected into generated links.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlContext {
    pub param_name: String,
    pub model_id: Value,
}

/// Request-scoped URL builder that injects the loaded model's identifier.
#[derive(Debug, Clone)]
pub struct ModelUrl<G = UrlManager> {
    generator: G,
    context: Option<UrlContext>,
}

impl<G: UrlGenerator> ModelUrl<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            context: None,
        }
    }

    /// Record the parameter name and model id, replacing any previous pair.
    pub fn set_up(&mut self, param_name: impl Into<String>, model_id: Value) {
        let context = UrlContext {
            param_name: param_name.into(),
            model_id,
        };
        tracing::trace!(
            param = %context.param_name,
            id = %context.model_id,
            "url context set"
        );
        self.context = Some(context);
    }

    pub fn context(&self) -> Option<&UrlContext> {
        self.context.as_ref()
    }

    pub fn clear(&mut self) {
        self.context = None;
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Apply the stored context to `target` without building a URL.
    ///
    /// A parameter explicitly set to `null` counts as absent.
    pub fn prepare(&self, target: UrlTarget) -> UrlTarget {
        match (target, &self.context) {
            (UrlTarget::Route { route, mut params }, Some(ctx)) => {
                if params.get(&ctx.param_name).map_or(true, Value::is_null) {
                    params.insert(ctx.param_name.clone(), ctx.model_id.clone());
                }
                UrlTarget::Route { route, params }
            }
            (target, _) => target,
        }
    }

    /// Build a URL, injecting the model id into structured targets.
    pub fn to(&self, target: impl Into<UrlTarget>, scheme: Scheme) -> Result<String, UrlError> {
        let target = self.prepare(target.into());
        self.generator.create_url(&target, &scheme)
    }
}
