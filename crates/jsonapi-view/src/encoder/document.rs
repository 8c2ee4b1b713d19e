//! Compound document assembly
//!
//! Walks the payload once for primary data, then follows the include tree
//! from each primary resource to collect the `included` section.

use crate::encoder::{DocumentEncoder, EncoderOptions, EncodingParameters, IncludeTree};
use crate::error::ViewError;
use crate::output;
use crate::registry::SchemaMappings;
use crate::traits::{Entity, Relation, Schema};
use crate::view_vars::Payload;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Default `DocumentEncoder`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonApiEncoder;

impl JsonApiEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentEncoder for JsonApiEncoder {
    fn encode_meta(
        &self,
        meta: &Map<String, Value>,
        options: &EncoderOptions,
    ) -> Result<String, ViewError> {
        let document = json!({ "meta": meta });
        output::to_string(&document, options.json_flags)
    }

    fn encode_data(
        &self,
        mappings: &SchemaMappings,
        payload: &Payload,
        parameters: EncodingParameters<'_>,
        options: &EncoderOptions,
    ) -> Result<String, ViewError> {
        let includes = IncludeTree::parse(parameters.include)?;
        let mut builder = DocumentBuilder::new(mappings, parameters.fieldsets, &options.url_prefix);
        let document = builder.build(payload, &includes, options.meta.as_ref())?;
        output::to_string(&document, options.json_flags)
    }
}

type Identity = (String, String);

/// Per-call encoding state.
struct DocumentBuilder<'a> {
    mappings: &'a SchemaMappings,
    fieldsets: Option<&'a BTreeMap<String, BTreeSet<String>>>,
    url_prefix: &'a str,
    schemas: HashMap<String, Arc<dyn Schema>>,
    primary: HashSet<Identity>,
    seen: HashSet<Identity>,
    included: Vec<Value>,
}

impl<'a> DocumentBuilder<'a> {
    fn new(
        mappings: &'a SchemaMappings,
        fieldsets: Option<&'a BTreeMap<String, BTreeSet<String>>>,
        url_prefix: &'a str,
    ) -> Self {
        Self {
            mappings,
            fieldsets,
            url_prefix,
            schemas: HashMap::new(),
            primary: HashSet::new(),
            seen: HashSet::new(),
            included: Vec::new(),
        }
    }

    fn build(
        &mut self,
        payload: &Payload,
        includes: &IncludeTree,
        meta: Option<&Map<String, Value>>,
    ) -> Result<Value, ViewError> {
        let primary: Vec<&Arc<dyn Entity>> = match payload {
            Payload::Null => Vec::new(),
            Payload::Resource(entity) => vec![entity],
            Payload::Collection(entities) => entities.iter().collect(),
        };

        for entity in &primary {
            let identity = self.identity(entity.as_ref())?;
            self.primary.insert(identity);
        }

        let data = match payload {
            Payload::Null => Value::Null,
            Payload::Resource(entity) => self.resource_object(entity.as_ref())?,
            Payload::Collection(entities) => Value::Array(
                entities
                    .iter()
                    .map(|entity| self.resource_object(entity.as_ref()))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        if !includes.is_empty() {
            for entity in &primary {
                self.include(entity.as_ref(), includes)?;
            }
        }

        let mut document = Map::new();
        document.insert("data".to_string(), data);
        if !self.included.is_empty() {
            document.insert(
                "included".to_string(),
                Value::Array(std::mem::take(&mut self.included)),
            );
        }
        if let Some(meta) = meta.filter(|m| !m.is_empty()) {
            document.insert("meta".to_string(), Value::Object(meta.clone()));
        }

        Ok(Value::Object(document))
    }

    /// Instantiate (once) the schema for an entity's type.
    fn schema(&mut self, entity_type: &str) -> Result<Arc<dyn Schema>, ViewError> {
        if let Some(schema) = self.schemas.get(entity_type) {
            return Ok(Arc::clone(schema));
        }

        let binding = self.mappings.get(entity_type).ok_or_else(|| {
            ViewError::serialization(entity_type, "no schema registered for entity type")
        })?;
        let schema: Arc<dyn Schema> = Arc::from(binding.instantiate());
        self.schemas
            .insert(entity_type.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    fn identity(&mut self, entity: &dyn Entity) -> Result<Identity, ViewError> {
        let schema = self.schema(entity.entity_type())?;
        let id = schema.id(entity).ok_or_else(|| {
            ViewError::serialization(entity.entity_type(), "resource has no identifier")
        })?;
        Ok((schema.resource_type().to_string(), id))
    }

    fn linkage(&mut self, entity: &dyn Entity) -> Result<Value, ViewError> {
        let (resource_type, id) = self.identity(entity)?;
        Ok(json!({ "type": resource_type, "id": id }))
    }

    fn allows(&self, resource_type: &str, field: &str) -> bool {
        match self.fieldsets.and_then(|f| f.get(resource_type)) {
            Some(fields) => fields.contains(field),
            None => true,
        }
    }

    fn resource_object(&mut self, entity: &dyn Entity) -> Result<Value, ViewError> {
        let schema = self.schema(entity.entity_type())?;
        let (resource_type, id) = self.identity(entity)?;

        let attributes: Map<String, Value> = schema
            .attributes(entity)
            .into_iter()
            .filter(|(name, _)| self.allows(&resource_type, name))
            .collect();

        let mut relationships = Map::new();
        for (name, relation) in schema.relationships(entity) {
            if !self.allows(&resource_type, &name) {
                continue;
            }
            let data = match relation {
                Relation::One(None) => Value::Null,
                Relation::One(Some(related)) => self.linkage(related.as_ref())?,
                Relation::Many(related) => Value::Array(
                    related
                        .iter()
                        .map(|r| self.linkage(r.as_ref()))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
            };
            relationships.insert(name, json!({ "data": data }));
        }

        let mut object = Map::new();
        object.insert("type".to_string(), Value::String(resource_type.clone()));
        object.insert("id".to_string(), Value::String(id.clone()));
        if !attributes.is_empty() {
            object.insert("attributes".to_string(), Value::Object(attributes));
        }
        if !relationships.is_empty() {
            object.insert("relationships".to_string(), Value::Object(relationships));
        }
        object.insert(
            "links".to_string(),
            json!({ "self": format!("{}{}/{}", self.url_prefix, schema.self_sub_url(), id) }),
        );
        if let Some(meta) = schema.resource_meta(entity) {
            object.insert("meta".to_string(), Value::Object(meta));
        }

        Ok(Value::Object(object))
    }

    /// Follow `tree` from `entity`, adding every related resource once.
    fn include(&mut self, entity: &dyn Entity, tree: &IncludeTree) -> Result<(), ViewError> {
        let schema = self.schema(entity.entity_type())?;
        let relationships = schema.relationships(entity);

        for (name, subtree) in tree.children() {
            let Some((_, relation)) = relationships.iter().find(|(n, _)| n == name) else {
                tracing::trace!(
                    entity = entity.entity_type(),
                    relationship = name,
                    "include path not loaded on entity"
                );
                continue;
            };

            for related in relation.entities() {
                let identity = self.identity(related.as_ref())?;
                if !self.primary.contains(&identity) && self.seen.insert(identity) {
                    let object = self.resource_object(related.as_ref())?;
                    self.included.push(object);
                }
                if !subtree.is_empty() {
                    self.include(related.as_ref(), subtree)?;
                }
            }
        }

        Ok(())
    }
}
