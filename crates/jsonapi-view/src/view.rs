//! Host-facing view
//!
//! Holds the view variables a controller set and renders them through a
//! `ResponseSerializer` into a host response.

use crate::config::ViewConfig;
use crate::encoder::{DocumentEncoder, JsonApiEncoder};
use crate::error::ViewError;
use crate::registry::SchemaRegistry;
use crate::response::{BufferedResponse, JSONAPI_MEDIA_TYPE};
use crate::serializer::ResponseSerializer;
use crate::traits::HostResponse;
use crate::view_vars::{ViewValue, ViewVars};
use std::sync::Arc;

pub struct JsonApiView<E = JsonApiEncoder> {
    serializer: Arc<ResponseSerializer<E>>,
    vars: ViewVars,
    debug: bool,
}

impl JsonApiView<JsonApiEncoder> {
    /// Build a view and its serializer from configuration.
    pub fn from_config(registry: &SchemaRegistry, config: &ViewConfig) -> Result<Self, ViewError> {
        let serializer = ResponseSerializer::from_config(registry, config)?;
        Ok(Self::new(Arc::new(serializer)).with_debug(config.debug))
    }
}

impl<E: DocumentEncoder> JsonApiView<E> {
    /// A fresh view over a shared serializer; one view per request.
    pub fn new(serializer: Arc<ResponseSerializer<E>>) -> Self {
        Self {
            serializer,
            vars: ViewVars::new(),
            debug: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ViewValue>) -> &mut Self {
        self.vars.set(name, value);
        self
    }

    pub fn vars(&self) -> &ViewVars {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut ViewVars {
        &mut self.vars
    }

    /// Render the view variables and return the document.
    ///
    /// The content type is set on `response` even when rendering fails.
    pub fn render(&self, response: &mut dyn HostResponse) -> Result<String, ViewError> {
        let options = match self.vars.options(self.debug) {
            Ok(options) => options,
            Err(e) => {
                response.set_content_type(JSONAPI_MEDIA_TYPE);
                return Err(e);
            }
        };

        let payload = if options.serialize.is_empty() {
            Default::default()
        } else {
            match self.vars.payload(&options.serialize) {
                Ok(payload) => payload,
                Err(e) => {
                    response.set_content_type(JSONAPI_MEDIA_TYPE);
                    return Err(e);
                }
            }
        };

        self.serializer.render(response, &options, &payload)
    }

    /// Render into a `BufferedResponse`, storing the document as its body.
    pub fn render_into(&self, response: &mut BufferedResponse) -> Result<(), ViewError> {
        let body = self.render(response)?;
        response.set_body(body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Record;
    use crate::registry::SchemaSpec;
    use crate::view_vars::{INCLUDE, META, SERIALIZE};
    use serde_json::{json, Value};

    fn view() -> JsonApiView {
        let registry = SchemaRegistry::new().entity("Article").entity("Person");
        let serializer = ResponseSerializer::new(
            &registry,
            [
                ("Article", SchemaSpec::Convention),
                ("Person", SchemaSpec::Convention),
            ],
            None,
            None,
        )
        .unwrap();
        JsonApiView::new(Arc::new(serializer))
    }

    fn article() -> Record {
        Record::new("Article")
            .with_field("id", "1")
            .with_field("title", "Rails is Omakase")
            .with_one(
                "author",
                Some(Record::new("Person").with_field("id", "9").with_field("name", "dgeb")),
            )
    }

    #[test]
    fn test_render_named_variable() {
        let mut view = view();
        view.set("article", article())
            .set(SERIALIZE, json!("article"))
            .set(INCLUDE, json!(["author"]))
            .set(META, json!({ "copyright": "2024" }));

        let mut response = BufferedResponse::new();
        view.render_into(&mut response).unwrap();

        assert_eq!(response.content_type(), Some(JSONAPI_MEDIA_TYPE));
        let doc: Value = serde_json::from_str(response.body().unwrap()).unwrap();
        assert_eq!(doc["data"]["id"], "1");
        assert_eq!(doc["included"][0]["type"], "people");
        assert_eq!(doc["meta"]["copyright"], "2024");
    }

    #[test]
    fn test_render_without_serialize_is_meta_only() {
        let mut view = view();
        view.set("article", article());

        let mut response = BufferedResponse::new();
        let out = view.render(&mut response).unwrap();
        assert_eq!(out, r#"{"meta":{}}"#);
        assert_eq!(response.content_type(), Some(JSONAPI_MEDIA_TYPE));
    }

    #[test]
    fn test_empty_entity_list_is_meta_only() {
        let mut view = view();
        view.set(SERIALIZE, Vec::<Arc<dyn crate::traits::Entity>>::new())
            .set(META, json!({ "total": 0 }));

        let out = view.render(&mut BufferedResponse::new()).unwrap();
        assert_eq!(out, r#"{"meta":{"total":0}}"#);

        view.set(SERIALIZE, json!([]));
        let out = view.render(&mut BufferedResponse::new()).unwrap();
        assert_eq!(out, r#"{"meta":{"total":0}}"#);
    }

    #[test]
    fn test_bad_option_still_sets_content_type() {
        let mut view = view();
        view.set(SERIALIZE, json!(3.5));

        let mut response = BufferedResponse::new();
        assert!(view.render(&mut response).is_err());
        assert_eq!(response.content_type(), Some(JSONAPI_MEDIA_TYPE));
    }

    #[test]
    fn test_debug_pretty_prints() {
        let mut view = view().with_debug(true);
        view.set(SERIALIZE, article());

        let mut response = BufferedResponse::new();
        let out = view.render(&mut response).unwrap();
        assert!(out.starts_with("{\n    \"data\""));
    }
}
