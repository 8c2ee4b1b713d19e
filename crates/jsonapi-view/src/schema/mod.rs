//! Schema construction
//!
//! Each mapping stores a `SchemaFactory` rather than a schema. The factory
//! runs once when the serializer is built, to reject a schema with an empty
//! resource type. After that, the encoder calls it the first time it meets
//! the mapped resource type in a render, handing it the `SchemaContext`
//! captured at construction.

pub mod inflector;

use crate::traits::Schema;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Immutable state a schema may read when it is instantiated.
#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    /// Entity type name the schema was bound to
    pub entity_name: String,
    /// Base URL for resource links, without a trailing slash
    pub url_prefix: String,
    /// Instance-level meta configured on the serializer
    pub meta: Map<String, Value>,
}

impl SchemaContext {
    pub fn new(entity_name: impl Into<String>, url_prefix: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            url_prefix: url_prefix.into(),
            meta: Map::new(),
        }
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }
}

/// Schema constructor. Called once at serializer construction, then lazily
/// by the encoder during each render.
pub type SchemaFactory = Arc<dyn Fn(&SchemaContext) -> Box<dyn Schema> + Send + Sync>;

/// Wrap a closure as a `SchemaFactory`.
pub fn factory<F, S>(build: F) -> SchemaFactory
where
    F: Fn(&SchemaContext) -> S + Send + Sync + 'static,
    S: Schema + 'static,
{
    Arc::new(move |context: &SchemaContext| Box::new(build(context)) as Box<dyn Schema>)
}

/// Fallback schema used when no schema is registered for an entity type.
///
/// The resource type is the plural snake-case form of the entity name,
/// attributes and relationships are read straight from the entity.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    resource_type: String,
}

impl EntitySchema {
    pub fn new(context: &SchemaContext) -> Self {
        Self {
            resource_type: inflector::resource_type(&context.entity_name),
        }
    }

    pub fn factory() -> SchemaFactory {
        factory(EntitySchema::new)
    }
}

impl Schema for EntitySchema {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }
}
