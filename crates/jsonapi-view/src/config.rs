//! View configuration, loaded from TOML/JSON files and environment variables
//!
//! ```toml
//! url = "https://api.example.com/v1/"
//! debug = false
//!
//! [meta]
//! api_version = "1.0"
//!
//! [[entities]]
//! name = "Article"
//! schema = "ArticleSchema"
//!
//! [[entities]]
//! name = "Person"
//! ```

use crate::error::ViewError;
use crate::registry::SchemaSpec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

pub const ENV_URL: &str = "JSONAPI_URL";
pub const ENV_DEBUG: &str = "JSONAPI_DEBUG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Base URL for resource links
    pub url: Option<String>,
    /// Pretty-print responses
    pub debug: bool,
    /// Meta attached to every response
    pub meta: Map<String, Value>,
    /// Entity types to map, in registration order
    pub entities: Vec<EntityMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMapping {
    pub name: String,
    /// Registered schema name; omitted means resolve by convention
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl EntityMapping {
    pub fn spec(&self) -> SchemaSpec {
        SchemaSpec::from(self.schema.clone())
    }
}

impl ViewConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ViewError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ViewError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a `.toml` or `.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ViewError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&contents)?,
            Some("json") => Self::from_json_str(&contents)?,
            _ => {
                return Err(ViewError::Config(format!(
                    "unsupported config file type: {}",
                    path.display()
                )))
            }
        };

        tracing::info!(
            path = %path.display(),
            entities = config.entities.len(),
            "loaded view config"
        );
        Ok(config)
    }

    /// Defaults overridden by the process environment.
    ///
    /// Environment variables:
    /// - `JSONAPI_URL`: base URL for resource links
    /// - `JSONAPI_DEBUG`: "true"/"1" to pretty-print (default: off)
    pub fn from_env() -> Result<Self, ViewError> {
        Self::default().apply_env(std::env::vars())
    }

    /// Apply `JSONAPI_*` overrides from `vars`.
    pub fn apply_env<I>(mut self, vars: I) -> Result<Self, ViewError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                ENV_URL => {
                    tracing::debug!(url = %value, "view url from environment");
                    self.url = Some(value);
                }
                ENV_DEBUG => {
                    self.debug = parse_bool(&value).ok_or_else(|| {
                        ViewError::Config(format!("{ENV_DEBUG} must be a boolean, got `{value}`"))
                    })?;
                }
                _ => {}
            }
        }
        Ok(self)
    }

    /// Entity mappings as `(entity type, schema spec)` pairs.
    pub fn entity_specs(&self) -> impl Iterator<Item = (String, SchemaSpec)> + '_ {
        self.entities.iter().map(|e| (e.name.clone(), e.spec()))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
