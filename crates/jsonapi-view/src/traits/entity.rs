use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Defines the contract for domain entities handed to the view.
///
/// An entity knows its own type name (the name it was registered under, e.g.
/// `Article`), its identifier, its plain attributes and any related entities
/// that were loaded alongside it.
pub trait Entity: Send + Sync + fmt::Debug {
    /// Registered entity type name
    fn entity_type(&self) -> &str;

    /// Primary key rendered as a string, if the entity has one
    fn id(&self) -> Option<String>;

    /// Plain attribute values, excluding the primary key
    fn attributes(&self) -> Map<String, Value>;

    /// Look up a loaded relation by name
    fn relation(&self, name: &str) -> Option<Relation>;

    /// Names of every loaded relation, in a stable order
    fn relation_names(&self) -> Vec<String>;
}

/// Related entities reachable from an entity.
#[derive(Debug, Clone)]
pub enum Relation {
    /// To-one relation; `None` when the related entity is absent
    One(Option<Arc<dyn Entity>>),
    /// To-many relation
    Many(Vec<Arc<dyn Entity>>),
}

impl Relation {
    /// Every related entity, regardless of arity.
    pub fn entities(&self) -> Vec<Arc<dyn Entity>> {
        match self {
            Relation::One(Some(entity)) => vec![Arc::clone(entity)],
            Relation::One(None) => Vec::new(),
            Relation::Many(entities) => entities.clone(),
        }
    }
}
