use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("Unknown schema `{schema}` configured for entity type {entity}")]
    UnknownSchema { entity: String, schema: String },

    #[error("Invalid schema for entity type {entity}: {reason}")]
    InvalidSchema { entity: String, reason: String },

    #[error("Serialization failed{}: {reason}", type_suffix(.type_name))]
    SerializationFailed {
        type_name: Option<String>,
        reason: String,
    },

    #[error("Invalid view option `{name}`: {reason}")]
    InvalidOption { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ViewError {
    /// Encoding failure attributed to a resource type.
    pub fn serialization(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ViewError::SerializationFailed {
            type_name: Some(type_name.into()),
            reason: reason.into(),
        }
    }

    /// Encoding failure with no resource type to blame.
    pub fn serialization_untyped(reason: impl Into<String>) -> Self {
        ViewError::SerializationFailed {
            type_name: None,
            reason: reason.into(),
        }
    }

    pub fn invalid_option(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ViewError::InvalidOption {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// The offending type name carried by a `SerializationFailed`, if any.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            ViewError::SerializationFailed { type_name, .. } => type_name.as_deref(),
            ViewError::UnknownEntityType(name) => Some(name),
            ViewError::UnknownSchema { entity, .. } | ViewError::InvalidSchema { entity, .. } => {
                Some(entity)
            }
            _ => None,
        }
    }
}

fn type_suffix(type_name: &Option<String>) -> String {
    match type_name {
        Some(name) => format!(" for type {name}"),
        None => String::new(),
    }
}
