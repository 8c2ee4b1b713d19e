//! Entity and schema registration
//!
//! `SchemaRegistry` is populated once at startup with every entity type the
//! application knows about and every schema constructor it provides.
//! `SchemaMappings` is the immutable per-serializer table resolved from it.

use crate::error::ViewError;
use crate::schema::{EntitySchema, SchemaContext, SchemaFactory};
use crate::traits::Schema;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// How a schema binding was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionOrigin {
    /// A schema named explicitly in the entity mapping.
    Explicit,
    /// A schema registered under the entity type's own name.
    Convention,
    /// The library default `EntitySchema`.
    Default,
}

/// Which schema an entity type should be serialized with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchemaSpec {
    /// Look for a schema named after the entity type, else use the default.
    #[default]
    Convention,
    /// Use the schema registered under this name.
    Named(String),
}

impl From<Option<String>> for SchemaSpec {
    fn from(schema: Option<String>) -> Self {
        match schema {
            Some(name) if !name.is_empty() => SchemaSpec::Named(name),
            _ => SchemaSpec::Convention,
        }
    }
}

/// Startup-time registry of known entity types and schema constructors.
#[derive(Default, Clone)]
pub struct SchemaRegistry {
    entities: HashSet<String>,
    schemas: HashMap<String, SchemaFactory>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an entity type known.
    pub fn entity(mut self, entity_type: impl Into<String>) -> Self {
        self.entities.insert(entity_type.into());
        self
    }

    /// Register a schema constructor under `name`.
    ///
    /// Registering under an entity type's name makes it that type's
    /// conventional schema. A later registration under the same name wins.
    pub fn schema(mut self, name: impl Into<String>, factory: SchemaFactory) -> Self {
        self.schemas.insert(name.into(), factory);
        self
    }

    pub fn knows_entity(&self, entity_type: &str) -> bool {
        self.entities.contains(entity_type)
    }

    /// Resolve the schema for one entity type.
    pub fn resolve(
        &self,
        entity_type: &str,
        spec: &SchemaSpec,
    ) -> Result<(SchemaFactory, ResolutionOrigin), ViewError> {
        if !self.knows_entity(entity_type) {
            return Err(ViewError::UnknownEntityType(entity_type.to_string()));
        }

        match spec {
            SchemaSpec::Named(name) => self
                .schemas
                .get(name)
                .map(|factory| (Arc::clone(factory), ResolutionOrigin::Explicit))
                .ok_or_else(|| ViewError::UnknownSchema {
                    entity: entity_type.to_string(),
                    schema: name.clone(),
                }),
            SchemaSpec::Convention => Ok(match self.schemas.get(entity_type) {
                Some(factory) => (Arc::clone(factory), ResolutionOrigin::Convention),
                None => (EntitySchema::factory(), ResolutionOrigin::Default),
            }),
        }
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemas: Vec<_> = self.schemas.keys().collect();
        schemas.sort();
        let mut entities: Vec<_> = self.entities.iter().collect();
        entities.sort();
        f.debug_struct("SchemaRegistry")
            .field("entities", &entities)
            .field("schemas", &schemas)
            .finish()
    }
}

/// One resolved entry of a `SchemaMappings` table.
#[derive(Clone)]
pub struct SchemaBinding {
    factory: SchemaFactory,
    origin: ResolutionOrigin,
    context: Arc<SchemaContext>,
}

impl SchemaBinding {
    pub fn origin(&self) -> ResolutionOrigin {
        self.origin
    }

    pub fn context(&self) -> &SchemaContext {
        &self.context
    }

    /// Build the schema with the context captured at construction.
    pub fn instantiate(&self) -> Box<dyn Schema> {
        (self.factory)(&self.context)
    }
}

impl fmt::Debug for SchemaBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBinding")
            .field("entity", &self.context.entity_name)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Immutable entity type -> schema table owned by one serializer.
#[derive(Debug, Clone, Default)]
pub struct SchemaMappings {
    bindings: HashMap<String, SchemaBinding>,
}

impl SchemaMappings {
    /// Resolve every entity mapping against the registry.
    ///
    /// Fails on the first entity that cannot be resolved; nothing is
    /// returned in that case. Each schema is instantiated once here so a
    /// schema reporting an empty resource type is rejected immediately.
    pub fn build<I, S>(
        registry: &SchemaRegistry,
        entities: I,
        context: &SchemaContext,
    ) -> Result<Self, ViewError>
    where
        I: IntoIterator<Item = (S, SchemaSpec)>,
        S: Into<String>,
    {
        let mut bindings = HashMap::new();

        for (entity_type, spec) in entities {
            let entity_type: String = entity_type.into();
            let (factory, origin) = registry.resolve(&entity_type, &spec)?;

            let context = Arc::new(SchemaContext {
                entity_name: entity_type.clone(),
                ..context.clone()
            });
            let binding = SchemaBinding {
                factory,
                origin,
                context,
            };

            let probe = binding.instantiate();
            if probe.resource_type().trim().is_empty() {
                return Err(ViewError::InvalidSchema {
                    entity: entity_type,
                    reason: "schema reports an empty resource type".to_string(),
                });
            }

            tracing::debug!(
                entity = %entity_type,
                resource_type = probe.resource_type(),
                origin = ?origin,
                "bound schema"
            );

            if bindings.insert(entity_type.clone(), binding).is_some() {
                tracing::debug!(entity = %entity_type, "schema mapping overwritten");
            }
        }

        Ok(Self { bindings })
    }

    pub fn get(&self, entity_type: &str) -> Option<&SchemaBinding> {
        self.bindings.get(entity_type)
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.bindings.contains_key(entity_type)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::factory;

    struct FixedSchema(&'static str);

    impl Schema for FixedSchema {
        fn resource_type(&self) -> &str {
            self.0
        }
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
            .entity("Article")
            .entity("Person")
            .entity("Tag")
            .schema("Person", factory(|_| FixedSchema("authors")))
            .schema("FancyArticleSchema", factory(|_| FixedSchema("fancy-articles")))
            .schema("BrokenSchema", factory(|_| FixedSchema("")))
    }

    #[test]
    fn test_resolution_order() {
        let registry = registry();

        let (_, origin) = registry
            .resolve("Article", &SchemaSpec::Named("FancyArticleSchema".into()))
            .unwrap();
        assert_eq!(origin, ResolutionOrigin::Explicit);

        let (_, origin) = registry.resolve("Person", &SchemaSpec::Convention).unwrap();
        assert_eq!(origin, ResolutionOrigin::Convention);

        let (_, origin) = registry.resolve("Tag", &SchemaSpec::Convention).unwrap();
        assert_eq!(origin, ResolutionOrigin::Default);
    }

    #[test]
    fn test_unknown_entity_type() {
        let err = registry()
            .resolve("Comment", &SchemaSpec::Convention)
            .err()
            .expect("resolution should fail");
        assert!(matches!(err, ViewError::UnknownEntityType(ref name) if name == "Comment"));
    }

    #[test]
    fn test_unknown_named_schema() {
        let err = registry()
            .resolve("Article", &SchemaSpec::Named("MissingSchema".into()))
            .err()
            .expect("resolution should fail");
        assert!(matches!(err, ViewError::UnknownSchema { ref schema, .. } if schema == "MissingSchema"));
    }

    #[test]
    fn test_build_mappings() {
        let mappings = SchemaMappings::build(
            &registry(),
            vec![
                ("Article", SchemaSpec::Named("FancyArticleSchema".into())),
                ("Person", SchemaSpec::Convention),
            ],
            &SchemaContext::new("", "https://api.example.com"),
        )
        .unwrap();

        assert_eq!(mappings.len(), 2);
        let article = mappings.get("Article").unwrap();
        assert_eq!(article.origin(), ResolutionOrigin::Explicit);
        assert_eq!(article.context().entity_name, "Article");
        assert_eq!(article.context().url_prefix, "https://api.example.com");
        assert_eq!(article.instantiate().resource_type(), "fancy-articles");
    }

    #[test]
    fn test_later_mapping_overwrites() {
        let mappings = SchemaMappings::build(
            &registry(),
            vec![
                ("Article", SchemaSpec::Convention),
                ("Article", SchemaSpec::Named("FancyArticleSchema".into())),
            ],
            &SchemaContext::default(),
        )
        .unwrap();

        assert_eq!(mappings.len(), 1);
        assert_eq!(
            mappings.get("Article").unwrap().origin(),
            ResolutionOrigin::Explicit
        );
    }

    #[test]
    fn test_build_aborts_without_partial_table() {
        let result = SchemaMappings::build(
            &registry(),
            vec![
                ("Article", SchemaSpec::Convention),
                ("Comment", SchemaSpec::Convention),
            ],
            &SchemaContext::default(),
        );
        assert!(matches!(result, Err(ViewError::UnknownEntityType(_))));
    }

    #[test]
    fn test_empty_resource_type_is_fatal() {
        let result = SchemaMappings::build(
            &registry(),
            vec![("Tag", SchemaSpec::Named("BrokenSchema".into()))],
            &SchemaContext::default(),
        );
        assert!(matches!(result, Err(ViewError::InvalidSchema { ref entity, .. }) if entity == "Tag"));
    }
}
