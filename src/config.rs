//! Declarative load configuration for a controller.
//!
//! ```yaml
//! id_column: id
//! param_name: post_id
//! exceptions:
//!   index: skip
//!   search: optional
//! relations:
//!   view:
//!     author: join_with
//!     comments: with
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::controller::{
    LoadExceptions, LoadPolicy, RelationHints, DEFAULT_ID_COLUMN, DEFAULT_PARAM_NAME,
};
use crate::error::ConfigError;
use crate::model::RelationKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Column the identifier is matched against.
    pub id_column: String,
    /// Request parameter carrying the identifier.
    pub param_name: String,
    pub exceptions: LoadExceptions,
    pub relations: RelationHints,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            id_column: DEFAULT_ID_COLUMN.to_string(),
            param_name: DEFAULT_PARAM_NAME.to_string(),
            exceptions: LoadExceptions::new(),
            relations: RelationHints::new(),
        }
    }
}

impl LoadConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&source)?,
            _ => Self::from_yaml_str(&source)?,
        };
        tracing::debug!(
            path = %path.display(),
            exceptions = config.exceptions.len(),
            "load config read"
        );
        Ok(config)
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    pub fn with_param_name(mut self, name: impl Into<String>) -> Self {
        self.param_name = name.into();
        self
    }

    pub fn with_exception(mut self, action: impl Into<String>, policy: LoadPolicy) -> Self {
        self.exceptions.insert(action.into(), policy);
        self
    }

    pub fn with_relation(
        mut self,
        action: impl Into<String>,
        relation: impl Into<String>,
        kind: RelationKind,
    ) -> Self {
        self.relations
            .entry(action.into())
            .or_insert_with(IndexMap::new)
            .insert(relation.into(), kind);
        self
    }

    pub fn policy(&self, action: &str) -> LoadPolicy {
        self.exceptions.get(action).copied().unwrap_or_default()
    }

    pub fn relations_for(&self, action: &str) -> Vec<(String, RelationKind)> {
        self.relations
            .get(action)
            .map(|hints| hints.iter().map(|(name, kind)| (name.clone(), *kind)).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const YAML: &str = r#"
param_name: post_id
exceptions:
  index: skip
  search: optional
relations:
  view:
    author: join_with
    comments: with
"#;

    #[test]
    fn test_from_yaml() {
        let config = LoadConfig::from_yaml_str(YAML).unwrap();
        let expected = LoadConfig::default()
            .with_param_name("post_id")
            .with_exception("index", LoadPolicy::Skip)
            .with_exception("search", LoadPolicy::Optional)
            .with_relation("view", "author", RelationKind::JoinWith)
            .with_relation("view", "comments", RelationKind::With);
        assert_eq!(config, expected);
        assert_eq!(config.id_column, "id");
    }

    #[test]
    fn test_relation_order_preserved() {
        let config = LoadConfig::from_yaml_str(YAML).unwrap();
        let names: Vec<String> = config
            .relations_for("view")
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["author", "comments"]);
    }

    #[test]
    fn test_from_json() {
        let config = LoadConfig::from_json_str(
            r#"{"id_column": "uuid", "exceptions": {"list": "skip"}}"#,
        )
        .unwrap();
        assert_eq!(config.id_column, "uuid");
        assert_eq!(config.param_name, "id");
        assert_eq!(config.policy("list"), LoadPolicy::Skip);
        assert_eq!(config.policy("show"), LoadPolicy::Required);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let err = LoadConfig::from_yaml_str("exceptions:\n  index: sometimes\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(LoadConfig::from_json_str(r#"{"id_colum": "x"}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();
        let config = LoadConfig::from_file(file.path()).unwrap();
        assert_eq!(config.param_name, "post_id");

        let missing = LoadConfig::from_file(Path::new("/nonexistent/load.yml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}
