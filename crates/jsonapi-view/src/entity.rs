//! Generic property-bag entity
//!
//! `Record` mirrors the way ORM entities usually look to a view: a bag of
//! named fields, a primary key, some fields hidden from output and a set of
//! already-loaded associations.

use crate::traits::{Entity, Relation};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Record {
    entity_type: String,
    primary_key: String,
    fields: Map<String, Value>,
    hidden: BTreeSet<String>,
    relations: BTreeMap<String, Relation>,
}

impl Record {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            primary_key: "id".to_string(),
            fields: Map::new(),
            hidden: BTreeSet::new(),
            relations: BTreeMap::new(),
        }
    }

    /// Use a field other than `id` as the primary key.
    pub fn with_primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = field.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Keep a field on the record but leave it out of serialized attributes.
    pub fn with_hidden(mut self, name: impl Into<String>) -> Self {
        self.hidden.insert(name.into());
        self
    }

    pub fn with_one(mut self, name: impl Into<String>, related: Option<Record>) -> Self {
        let related = related.map(|r| Arc::new(r) as Arc<dyn Entity>);
        self.relations.insert(name.into(), Relation::One(related));
        self
    }

    pub fn with_many(mut self, name: impl Into<String>, related: Vec<Record>) -> Self {
        let related = related
            .into_iter()
            .map(|r| Arc::new(r) as Arc<dyn Entity>)
            .collect();
        self.relations.insert(name.into(), Relation::Many(related));
        self
    }

    pub fn with_relation(mut self, name: impl Into<String>, relation: Relation) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn into_entity(self) -> Arc<dyn Entity> {
        Arc::new(self)
    }
}

impl Entity for Record {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn id(&self) -> Option<String> {
        match self.fields.get(&self.primary_key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    fn attributes(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(name, _)| **name != self.primary_key && !self.hidden.contains(*name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn relation(&self, name: &str) -> Option<Relation> {
        self.relations.get(name).cloned()
    }

    fn relation_names(&self) -> Vec<String> {
        self.relations.keys().cloned().collect()
    }
}
