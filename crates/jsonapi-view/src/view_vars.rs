//! View variables
//!
//! Controllers hand data to the view as named variables. Names starting
//! with an underscore are reserved for serialization directives:
//!
//! - `_serialize`: what to encode (`true`, a variable name, a list of names,
//!   or the resources themselves)
//! - `_include`: include paths, e.g. `["posts.author"]`
//! - `_fieldsets`: sparse fieldsets, e.g. `{"people": ["first_name"]}`
//! - `_meta`: top-level meta merged over the view's own meta
//! - `_jsonOptions`: `false` to disable escaping, or an integer bitmask

use crate::error::ViewError;
use crate::options::{JsonFlags, SerializationOptions, SerializeTarget};
use crate::traits::Entity;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub const SERIALIZE: &str = "_serialize";
pub const INCLUDE: &str = "_include";
pub const FIELDSETS: &str = "_fieldsets";
pub const META: &str = "_meta";
pub const JSON_OPTIONS: &str = "_jsonOptions";

/// Data to encode as primary data.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    #[default]
    Null,
    Resource(Arc<dyn Entity>),
    Collection(Vec<Arc<dyn Entity>>),
}

impl Payload {
    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Null)
    }
}

/// Value stored in a view variable.
#[derive(Debug, Clone)]
pub enum ViewValue {
    Json(Value),
    Entity(Arc<dyn Entity>),
    Entities(Vec<Arc<dyn Entity>>),
}

impl From<Value> for ViewValue {
    fn from(value: Value) -> Self {
        ViewValue::Json(value)
    }
}

impl From<Arc<dyn Entity>> for ViewValue {
    fn from(entity: Arc<dyn Entity>) -> Self {
        ViewValue::Entity(entity)
    }
}

impl From<Vec<Arc<dyn Entity>>> for ViewValue {
    fn from(entities: Vec<Arc<dyn Entity>>) -> Self {
        ViewValue::Entities(entities)
    }
}

impl<E: Entity + 'static> From<E> for ViewValue {
    fn from(entity: E) -> Self {
        ViewValue::Entity(Arc::new(entity))
    }
}

/// Insertion-ordered view variable store.
#[derive(Debug, Clone, Default)]
pub struct ViewVars {
    vars: Vec<(String, ViewValue)>,
}

impl ViewVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any previous value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ViewValue>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.vars.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ViewValue> {
        self.vars.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<ViewValue> {
        let pos = self.vars.iter().position(|(n, _)| n == name)?;
        Some(self.vars.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    fn json(&self, name: &str) -> Result<Option<&Value>, ViewError> {
        match self.get(name) {
            None => Ok(None),
            Some(ViewValue::Json(Value::Null)) => Ok(None),
            Some(ViewValue::Json(value)) => Ok(Some(value)),
            Some(_) => Err(ViewError::invalid_option(name, "expected a JSON value")),
        }
    }

    /// Read the reserved variables into a `SerializationOptions` snapshot.
    pub fn options(&self, debug: bool) -> Result<SerializationOptions, ViewError> {
        Ok(SerializationOptions {
            serialize: self.serialize_target()?,
            include: match self.json(INCLUDE)? {
                Some(value) => string_list(INCLUDE, value)?,
                None => Vec::new(),
            },
            fieldsets: self.json(FIELDSETS)?.map(fieldsets).transpose()?,
            meta: match self.json(META)? {
                Some(Value::Object(meta)) => meta.clone(),
                Some(_) => return Err(ViewError::invalid_option(META, "expected an object")),
                None => Map::new(),
            },
            json_flags: self.json(JSON_OPTIONS)?.map(json_flags).transpose()?,
            url_prefix: None,
            debug,
        })
    }

    fn serialize_target(&self) -> Result<SerializeTarget, ViewError> {
        let value = match self.get(SERIALIZE) {
            None => return Ok(SerializeTarget::Nothing),
            Some(ViewValue::Entities(entities)) if entities.is_empty() => {
                return Ok(SerializeTarget::Nothing)
            }
            Some(ViewValue::Entity(_)) | Some(ViewValue::Entities(_)) => {
                return Ok(SerializeTarget::Data)
            }
            Some(ViewValue::Json(value)) => value,
        };

        match value {
            Value::Null | Value::Bool(false) => Ok(SerializeTarget::Nothing),
            Value::Bool(true) => Ok(SerializeTarget::All),
            Value::String(name) => Ok(SerializeTarget::Var(name.clone())),
            Value::Array(_) => Ok(SerializeTarget::Vars(string_list(SERIALIZE, value)?)),
            _ => Err(ViewError::invalid_option(
                SERIALIZE,
                "expected a boolean, a variable name or a list of names",
            )),
        }
    }

    /// Resolve what `target` names into a payload.
    pub fn payload(&self, target: &SerializeTarget) -> Result<Payload, ViewError> {
        match target {
            SerializeTarget::Nothing => Ok(Payload::Null),
            SerializeTarget::Var(name) => self.var_payload(name),
            SerializeTarget::Vars(names) => {
                let mut entities = Vec::new();
                for name in names {
                    flatten_into(&mut entities, self.var_payload(name)?);
                }
                Ok(Payload::Collection(entities))
            }
            SerializeTarget::All => {
                let mut entities = Vec::new();
                for (name, _) in self.vars.iter().filter(|(n, _)| !n.starts_with('_')) {
                    flatten_into(&mut entities, self.var_payload(name)?);
                }
                Ok(Payload::Collection(entities))
            }
            SerializeTarget::Data => self.var_payload(SERIALIZE),
        }
    }

    fn var_payload(&self, name: &str) -> Result<Payload, ViewError> {
        match self.get(name) {
            None | Some(ViewValue::Json(Value::Null)) => Ok(Payload::Null),
            Some(ViewValue::Entity(entity)) => Ok(Payload::Resource(Arc::clone(entity))),
            Some(ViewValue::Entities(entities)) => Ok(Payload::Collection(entities.clone())),
            Some(ViewValue::Json(_)) => Err(ViewError::serialization_untyped(format!(
                "view variable `{name}` does not hold a resource"
            ))),
        }
    }
}

fn flatten_into(entities: &mut Vec<Arc<dyn Entity>>, payload: Payload) {
    match payload {
        Payload::Null => {}
        Payload::Resource(entity) => entities.push(entity),
        Payload::Collection(more) => entities.extend(more),
    }
}

/// Array of strings, or one comma-separated string.
fn string_list(name: &str, value: &Value) -> Result<Vec<String>, ViewError> {
    match value {
        Value::String(s) => Ok(s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ViewError::invalid_option(name, "expected a list of strings"))
            })
            .collect(),
        _ => Err(ViewError::invalid_option(
            name,
            "expected a list of strings or a comma-separated string",
        )),
    }
}

fn fieldsets(value: &Value) -> Result<BTreeMap<String, BTreeSet<String>>, ViewError> {
    let Value::Object(map) = value else {
        return Err(ViewError::invalid_option(
            FIELDSETS,
            "expected an object of resource type to field names",
        ));
    };

    map.iter()
        .map(|(resource_type, fields)| {
            let fields = string_list(FIELDSETS, fields)?;
            Ok((resource_type.clone(), fields.into_iter().collect()))
        })
        .collect()
}

fn json_flags(value: &Value) -> Result<JsonFlags, ViewError> {
    match value {
        Value::Bool(false) => Ok(JsonFlags::empty()),
        Value::Number(n) => {
            let bits = n
                .as_u64()
                .and_then(|bits| u32::try_from(bits).ok())
                .ok_or_else(|| ViewError::invalid_option(JSON_OPTIONS, "expected a flag bitmask"))?;
            let flags = JsonFlags::from_bits_truncate(bits);
            let ignored = bits & !JsonFlags::all().bits();
            if ignored != 0 {
                tracing::debug!(bits, ignored, "ignoring unsupported json option bits");
            }
            Ok(flags)
        }
        _ => Err(ViewError::invalid_option(
            JSON_OPTIONS,
            "expected `false` or a flag bitmask",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Record;
    use serde_json::json;

    fn person(id: i64) -> Record {
        Record::new("Person").with_field("id", id)
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut vars = ViewVars::new();
        vars.set("a", json!(1)).set("b", json!(2)).set("a", json!(3));

        assert_eq!(vars.len(), 2);
        assert!(matches!(vars.get("a"), Some(ViewValue::Json(v)) if *v == json!(3)));
        assert!(vars.remove("a").is_some());
        assert!(vars.get("a").is_none());
    }

    #[test]
    fn test_serialize_target_parsing() {
        let mut vars = ViewVars::new();
        assert_eq!(vars.options(false).unwrap().serialize, SerializeTarget::Nothing);

        vars.set(SERIALIZE, json!(true));
        assert_eq!(vars.options(false).unwrap().serialize, SerializeTarget::All);

        vars.set(SERIALIZE, json!(false));
        assert_eq!(vars.options(false).unwrap().serialize, SerializeTarget::Nothing);

        vars.set(SERIALIZE, json!("article"));
        assert_eq!(
            vars.options(false).unwrap().serialize,
            SerializeTarget::Var("article".into())
        );

        vars.set(SERIALIZE, json!(["article", "author"]));
        assert_eq!(
            vars.options(false).unwrap().serialize,
            SerializeTarget::Vars(vec!["article".into(), "author".into()])
        );

        vars.set(SERIALIZE, person(1));
        assert_eq!(vars.options(false).unwrap().serialize, SerializeTarget::Data);

        vars.set(SERIALIZE, json!(42));
        assert!(matches!(
            vars.options(false),
            Err(ViewError::InvalidOption { ref name, .. }) if name == SERIALIZE
        ));
    }

    #[test]
    fn test_reserved_options() {
        let mut vars = ViewVars::new();
        vars.set(INCLUDE, json!("author, comments.author"))
            .set(FIELDSETS, json!({ "people": ["name"], "articles": "title,body" }))
            .set(META, json!({ "page": 2 }))
            .set(JSON_OPTIONS, json!(false));

        let options = vars.options(true).unwrap();
        assert_eq!(options.include, vec!["author", "comments.author"]);
        let fieldsets = options.fieldsets.unwrap();
        assert!(fieldsets["people"].contains("name"));
        assert_eq!(fieldsets["articles"].len(), 2);
        assert_eq!(options.meta["page"], 2);
        assert_eq!(options.json_flags, Some(JsonFlags::empty()));
        assert!(options.debug);
    }

    #[test]
    fn test_json_options_bitmask() {
        let mut vars = ViewVars::new();
        vars.set(JSON_OPTIONS, json!(1 | 128));
        let flags = vars.options(false).unwrap().json_flags.unwrap();
        assert_eq!(flags, JsonFlags::HEX_TAG | JsonFlags::PRETTY_PRINT);

        vars.set(JSON_OPTIONS, json!("pretty"));
        assert!(vars.options(false).is_err());
    }

    #[test]
    fn test_json_options_unknown_bits_dropped() {
        let mut vars = ViewVars::new();
        vars.set(JSON_OPTIONS, json!(1 | 64 | 256));
        let flags = vars.options(false).unwrap().json_flags.unwrap();
        assert_eq!(flags, JsonFlags::HEX_TAG);
    }

    #[test]
    fn test_empty_entity_list_serializes_nothing() {
        let mut vars = ViewVars::new();
        vars.set(SERIALIZE, Vec::<Arc<dyn Entity>>::new());
        assert_eq!(vars.options(false).unwrap().serialize, SerializeTarget::Nothing);

        vars.set(SERIALIZE, vec![person(1).into_entity()]);
        assert_eq!(vars.options(false).unwrap().serialize, SerializeTarget::Data);
    }

    #[test]
    fn test_ill_typed_options() {
        let mut vars = ViewVars::new();
        vars.set(INCLUDE, json!([1, 2]));
        assert!(vars.options(false).is_err());

        let mut vars = ViewVars::new();
        vars.set(META, json!([1]));
        assert!(vars.options(false).is_err());

        let mut vars = ViewVars::new();
        vars.set(FIELDSETS, json!(["name"]));
        assert!(vars.options(false).is_err());
    }

    #[test]
    fn test_payload_resolution() {
        let mut vars = ViewVars::new();
        vars.set("author", person(1))
            .set(
                "people",
                vec![person(2).into_entity(), person(3).into_entity()],
            )
            .set("nothing", Value::Null)
            .set(META, json!({ "ignored": true }));

        let payload = vars.payload(&SerializeTarget::Var("author".into())).unwrap();
        assert!(matches!(payload, Payload::Resource(_)));

        let payload = vars.payload(&SerializeTarget::Var("missing".into())).unwrap();
        assert!(payload.is_null());

        let payload = vars
            .payload(&SerializeTarget::Vars(vec!["author".into(), "people".into()]))
            .unwrap();
        assert!(matches!(payload, Payload::Collection(ref e) if e.len() == 3));

        let payload = vars.payload(&SerializeTarget::All).unwrap();
        assert!(matches!(payload, Payload::Collection(ref e) if e.len() == 3));
    }

    #[test]
    fn test_payload_from_serialize_data() {
        let mut vars = ViewVars::new();
        vars.set(SERIALIZE, person(7));
        let target = vars.options(false).unwrap().serialize;
        let payload = vars.payload(&target).unwrap();
        assert!(matches!(payload, Payload::Resource(ref e) if e.id().as_deref() == Some("7")));
    }

    #[test]
    fn test_plain_json_is_not_a_resource() {
        let mut vars = ViewVars::new();
        vars.set("count", json!(3));
        let err = vars
            .payload(&SerializeTarget::Var("count".into()))
            .unwrap_err();
        assert!(matches!(err, ViewError::SerializationFailed { type_name: None, .. }));
    }
}
