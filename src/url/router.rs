//! Route table and URL generation.
//!
//! Routes map a name to a path pattern:
//! - `posts/index` → `/posts`
//! - `posts/edit` → `/posts/:id/edit`
//!
//! `:name` segments are filled from the target's parameters; whatever is
//! left over becomes the query string. Names that are not registered are
//! used as the path itself, so `UrlTarget::route("/edit")` builds `/edit`.

use indexmap::IndexMap;
use serde_json::Value;

use super::{Scheme, UrlGenerator, UrlTarget};
use crate::error::UrlError;
use crate::Params;

#[derive(Debug, Clone, Default)]
pub struct UrlManager {
    routes: IndexMap<String, String>,
    base_url: String,
    host_info: Option<String>,
}

impl UrlManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host used for absolute URLs, e.g. `https://example.com`.
    pub fn with_host_info(mut self, host_info: impl Into<String>) -> Self {
        self.host_info = Some(host_info.into().trim_end_matches('/').to_string());
        self
    }

    /// Prefix for every generated path, e.g. `/app`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn add_route(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        let name = name.into().trim_matches('/').to_string();
        self.routes.insert(name, pattern.into());
        self
    }

    /// Register the conventional actions of a resource controller.
    ///
    /// `resource("posts")` registers `posts/index` → `/posts`,
    /// `posts/show` → `/posts/:id`, `posts/edit` → `/posts/:id/edit`, and so
    /// on. The `home` resource lives at `/`.
    pub fn resource(mut self, name: &str) -> Self {
        let base = resource_base_path(name);
        for action in ["index", "show", "new", "create", "edit", "update", "destroy"] {
            let pattern = action_path(&base, action);
            self.routes.insert(format!("{}/{}", name, action), pattern);
        }
        self
    }

    pub fn pattern(&self, route: &str) -> Option<&str> {
        self.routes.get(route.trim_matches('/')).map(String::as_str)
    }

    fn apply_scheme(&self, path: String, scheme: &Scheme) -> Result<String, UrlError> {
        let explicit = match scheme {
            Scheme::Relative => return Ok(path),
            Scheme::Absolute => None,
            Scheme::Explicit(s) => Some(s.as_str()),
        };
        if !path.starts_with('/') || path.starts_with("//") {
            return Ok(match explicit {
                Some(s) => ensure_scheme(&path, s),
                None => path,
            });
        }

        let host = self.host_info.as_deref().ok_or_else(|| UrlError::NoHostInfo {
            scheme: explicit.unwrap_or("absolute").to_string(),
        })?;
        let host = match (explicit, host.split_once("://")) {
            (Some(s), Some((_, rest))) => format!("{}://{}", s, rest),
            (Some(s), None) => format!("{}://{}", s, host.trim_start_matches('/')),
            (None, _) => host.to_string(),
        };
        Ok(format!("{}{}", host, path))
    }

    fn route_path(&self, route: &str, params: &Params) -> Result<String, UrlError> {
        let fallback;
        let pattern = match self.pattern(route) {
            Some(pattern) => pattern,
            None => {
                fallback = format!("/{}", route.trim_start_matches('/'));
                fallback.as_str()
            }
        };

        let mut remaining = params.clone();
        let mut segments = Vec::new();
        for segment in pattern.split('/') {
            match segment.strip_prefix(':') {
                Some(name) => {
                    let value = remaining
                        .shift_remove(name)
                        .filter(|v| !v.is_null())
                        .ok_or_else(|| UrlError::MissingRouteParam {
                            route: route.to_string(),
                            param: name.to_string(),
                        })?;
                    segments.push(urlencoding::encode(&scalar(&value)).into_owned());
                }
                None => segments.push(segment.to_string()),
            }
        }

        let mut path = format!("{}{}", self.base_url, segments.join("/"));
        if path.is_empty() {
            path.push('/');
        }

        let query = build_query_string(&remaining);
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query);
        }
        Ok(path)
    }
}

impl UrlGenerator for UrlManager {
    fn create_url(&self, target: &UrlTarget, scheme: &Scheme) -> Result<String, UrlError> {
        let path = match target {
            UrlTarget::Path(path) => path.clone(),
            UrlTarget::Route { route, params } => self.route_path(route, params)?,
        };
        self.apply_scheme(path, scheme)
    }
}

/// - `home` → `/`
/// - `users` → `/users`
fn resource_base_path(name: &str) -> String {
    if name == "home" {
        "/".to_string()
    } else {
        format!("/{}", name)
    }
}

fn action_path(base: &str, action: &str) -> String {
    let prefix = base.trim_end_matches('/');
    match action {
        "index" | "create" => base.to_string(),
        "show" | "update" | "destroy" => format!("{}/:id", prefix),
        "new" => format!("{}/new", prefix),
        "edit" => format!("{}/:id/edit", prefix),
        _ => format!("{}/{}", prefix, action),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        other => other.to_string(),
    }
}

/// Replace the scheme of an absolute or protocol-relative URL. An empty
/// scheme yields a protocol-relative URL. Other targets are left alone.
fn ensure_scheme(url: &str, scheme: &str) -> String {
    if let Some(rest) = url.strip_prefix("//") {
        return if scheme.is_empty() {
            url.to_string()
        } else {
            format!("{}://{}", scheme, rest)
        };
    }
    match url.split_once("://") {
        Some((old, rest)) if is_scheme(old) => {
            if scheme.is_empty() {
                format!("//{}", rest)
            } else {
                format!("{}://{}", scheme, rest)
            }
        }
        _ => url.to_string(),
    }
}

fn is_scheme(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Encode parameters in insertion order. Nulls are dropped, arrays render
/// as `key[]=v`, objects as `key[sub]=v`.
fn build_query_string(params: &Params) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        push_pairs(&mut pairs, key, value);
    }
    pairs.join("&")
}

fn push_pairs(pairs: &mut Vec<String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                push_pairs(pairs, &format!("{}[]", key), item);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                push_pairs(pairs, &format!("{}[{}]", key, sub), item);
            }
        }
        scalar_value => pairs.push(format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(&scalar(scalar_value))
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager() -> UrlManager {
        UrlManager::new()
            .with_host_info("https://example.com")
            .resource("posts")
            .resource("home")
    }

    fn route(name: &str, params: Value) -> UrlTarget {
        let params = match params {
            Value::Object(map) => map.into_iter().collect(),
            _ => Params::new(),
        };
        UrlTarget::route_with(name, params)
    }

    #[test]
    fn test_resource_patterns() {
        let urls = manager();
        assert_eq!(urls.pattern("posts/index"), Some("/posts"));
        assert_eq!(urls.pattern("posts/show"), Some("/posts/:id"));
        assert_eq!(urls.pattern("posts/edit"), Some("/posts/:id/edit"));
        assert_eq!(urls.pattern("posts/new"), Some("/posts/new"));
        assert_eq!(urls.pattern("home/index"), Some("/"));
        assert_eq!(urls.pattern("home/show"), Some("/:id"));
    }

    #[test]
    fn test_placeholders_consume_params() {
        let url = manager()
            .create_url(
                &route("posts/edit", json!({"id": 42, "tab": "meta"})),
                &Scheme::Relative,
            )
            .unwrap();
        assert_eq!(url, "/posts/42/edit?tab=meta");
    }

    #[test]
    fn test_missing_placeholder_is_error() {
        let err = manager()
            .create_url(&route("posts/show", json!({})), &Scheme::Relative)
            .unwrap_err();
        assert_eq!(
            err,
            UrlError::MissingRouteParam {
                route: "posts/show".to_string(),
                param: "id".to_string()
            }
        );
    }

    #[test]
    fn test_unregistered_route_is_path() {
        let url = manager()
            .create_url(&route("/edit", json!({"id": 42})), &Scheme::Relative)
            .unwrap();
        assert_eq!(url, "/edit?id=42");

        let url = manager()
            .create_url(&route("site/about", json!({})), &Scheme::Relative)
            .unwrap();
        assert_eq!(url, "/site/about");
    }

    #[test]
    fn test_query_encoding() {
        let url = manager()
            .create_url(
                &route(
                    "search",
                    json!({"q": "a b&c", "skip": null, "tags": ["x", "y"], "f": {"on": true}}),
                ),
                &Scheme::Relative,
            )
            .unwrap();
        assert_eq!(url, "/search?q=a%20b%26c&tags%5B%5D=x&tags%5B%5D=y&f%5Bon%5D=1");
    }

    #[test]
    fn test_schemes() {
        let urls = manager();
        let target = route("posts/show", json!({"id": 1}));
        assert_eq!(
            urls.create_url(&target, &Scheme::Absolute).unwrap(),
            "https://example.com/posts/1"
        );
        assert_eq!(
            urls.create_url(&target, &Scheme::Explicit("http".to_string()))
                .unwrap(),
            "http://example.com/posts/1"
        );
        assert_eq!(
            urls.create_url(&UrlTarget::from("https://other.org/x"), &Scheme::Absolute)
                .unwrap(),
            "https://other.org/x"
        );
    }

    #[test]
    fn test_explicit_scheme_rewrites_absolute_url() {
        let urls = manager();
        let http = Scheme::Explicit("http".to_string());
        assert_eq!(
            urls.create_url(&UrlTarget::from("https://example.com/x"), &http)
                .unwrap(),
            "http://example.com/x"
        );
        assert_eq!(
            urls.create_url(&UrlTarget::from("//cdn.example.com/a.js"), &http)
                .unwrap(),
            "http://cdn.example.com/a.js"
        );
        assert_eq!(
            urls.create_url(
                &UrlTarget::from("https://example.com/x"),
                &Scheme::Explicit(String::new())
            )
            .unwrap(),
            "//example.com/x"
        );
        assert_eq!(
            urls.create_url(&UrlTarget::from("about?next=http://a.b"), &http)
                .unwrap(),
            "about?next=http://a.b"
        );
    }

    #[test]
    fn test_absolute_without_host_info() {
        let err = UrlManager::new()
            .create_url(&UrlTarget::from("/a"), &Scheme::Absolute)
            .unwrap_err();
        assert!(matches!(err, UrlError::NoHostInfo { .. }));
    }

    #[test]
    fn test_base_url_prefix() {
        let url = UrlManager::new()
            .with_base_url("/app/")
            .resource("posts")
            .create_url(&route("posts/index", json!({})), &Scheme::Relative)
            .unwrap();
        assert_eq!(url, "/app/posts");
    }
}
