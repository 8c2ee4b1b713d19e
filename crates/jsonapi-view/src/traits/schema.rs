use crate::traits::{Entity, Relation};
use serde_json::{Map, Value};

/// Describes how one entity type is written as a JSON:API resource object.
///
/// Schemas are created lazily by the encoder, once per resource type
/// encountered while walking a payload. Only `resource_type` and `id` are
/// required; the remaining methods default to reading the entity directly.
pub trait Schema: Send + Sync {
    /// JSON:API `type` member, e.g. `articles`
    fn resource_type(&self) -> &str;

    /// JSON:API `id` member
    fn id(&self, entity: &dyn Entity) -> Option<String> {
        entity.id()
    }

    /// Attribute members of the resource object
    fn attributes(&self, entity: &dyn Entity) -> Map<String, Value> {
        entity.attributes()
    }

    /// Relationship members, as `(name, related entities)` pairs
    fn relationships(&self, entity: &dyn Entity) -> Vec<(String, Relation)> {
        entity
            .relation_names()
            .into_iter()
            .filter_map(|name| entity.relation(&name).map(|relation| (name, relation)))
            .collect()
    }

    /// Path appended to the URL prefix to build resource links
    fn self_sub_url(&self) -> String {
        format!("/{}", self.resource_type())
    }

    /// Resource-level `meta`, if any
    fn resource_meta(&self, _entity: &dyn Entity) -> Option<Map<String, Value>> {
        None
    }
}
