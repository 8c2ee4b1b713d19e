//! JSON:API response serializer
//!
//! Owns the entity -> schema table built at construction and turns one
//! `(options, payload)` pair into a document string per call.

use crate::config::ViewConfig;
use crate::encoder::{DocumentEncoder, EncoderOptions, EncodingParameters, JsonApiEncoder};
use crate::error::ViewError;
use crate::options::SerializationOptions;
use crate::registry::{SchemaMappings, SchemaRegistry, SchemaSpec};
use crate::response::JSONAPI_MEDIA_TYPE;
use crate::schema::SchemaContext;
use crate::traits::HostResponse;
use crate::view_vars::Payload;
use serde_json::{Map, Value};

#[derive(Debug)]
pub struct ResponseSerializer<E = JsonApiEncoder> {
    mappings: SchemaMappings,
    url_prefix: String,
    meta: Map<String, Value>,
    encoder: E,
}

impl ResponseSerializer<JsonApiEncoder> {
    /// Resolve `entities` against `registry`.
    ///
    /// Fails with `UnknownEntityType`, `UnknownSchema` or `InvalidSchema` on
    /// the first mapping that cannot be resolved.
    pub fn new<I, S>(
        registry: &SchemaRegistry,
        entities: I,
        url_prefix: Option<&str>,
        meta: Option<Map<String, Value>>,
    ) -> Result<Self, ViewError>
    where
        I: IntoIterator<Item = (S, SchemaSpec)>,
        S: Into<String>,
    {
        let url_prefix = url_prefix.unwrap_or_default().trim_end_matches('/').to_string();
        let meta = meta.unwrap_or_default();
        let context = SchemaContext::new("", url_prefix.clone()).with_meta(meta.clone());
        let mappings = SchemaMappings::build(registry, entities, &context)?;

        tracing::debug!(
            mappings = mappings.len(),
            url_prefix = %url_prefix,
            "response serializer ready"
        );

        Ok(Self {
            mappings,
            url_prefix,
            meta,
            encoder: JsonApiEncoder,
        })
    }

    pub fn from_config(registry: &SchemaRegistry, config: &ViewConfig) -> Result<Self, ViewError> {
        let meta = (!config.meta.is_empty()).then(|| config.meta.clone());
        Self::new(
            registry,
            config.entity_specs(),
            config.url.as_deref(),
            meta,
        )
    }
}

impl<E: DocumentEncoder> ResponseSerializer<E> {
    /// Replace the document encoder, keeping the mapping table.
    pub fn with_encoder<F: DocumentEncoder>(self, encoder: F) -> ResponseSerializer<F> {
        ResponseSerializer {
            mappings: self.mappings,
            url_prefix: self.url_prefix,
            meta: self.meta,
            encoder,
        }
    }

    pub fn mappings(&self) -> &SchemaMappings {
        &self.mappings
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    /// Render one response body.
    ///
    /// The response content type is set to the JSON:API media type before
    /// anything else, whatever the outcome. With nothing to serialize the
    /// result is a meta-only document and `payload` is not looked at.
    pub fn render(
        &self,
        response: &mut dyn HostResponse,
        options: &SerializationOptions,
        payload: &Payload,
    ) -> Result<String, ViewError> {
        response.set_content_type(JSONAPI_MEDIA_TYPE);

        let meta = self.merged_meta(&options.meta);
        let url_prefix = options.url_prefix.as_deref().unwrap_or(&self.url_prefix);
        let mut encoder_options = EncoderOptions::new(options.effective_flags(), url_prefix);

        if options.serialize.is_empty() {
            tracing::debug!(keys = meta.len(), "rendering meta-only document");
            return self
                .encoder
                .encode_meta(&meta, &encoder_options)
                .map_err(into_serialization_failed)
                .inspect_err(|e| tracing::warn!(error = %e, "meta encoding failed"));
        }

        if !meta.is_empty() {
            encoder_options = encoder_options.with_meta(meta);
        }

        let parameters = EncodingParameters::new(&options.include, options.fieldsets.as_ref());
        tracing::debug!(
            target_kind = ?options.serialize,
            include = options.include.len(),
            "rendering data document"
        );

        self.encoder
            .encode_data(&self.mappings, payload, parameters, &encoder_options)
            .map_err(into_serialization_failed)
            .inspect_err(|e| {
                tracing::warn!(
                    error = %e,
                    type_name = e.type_name().unwrap_or("-"),
                    "data encoding failed"
                )
            })
    }

    /// Instance meta with per-call keys laid over it.
    fn merged_meta(&self, call_meta: &Map<String, Value>) -> Map<String, Value> {
        let mut meta = self.meta.clone();
        for (key, value) in call_meta {
            meta.insert(key.clone(), value.clone());
        }
        meta
    }
}

fn into_serialization_failed(e: ViewError) -> ViewError {
    match e {
        ViewError::SerializationFailed { .. } => e,
        other => ViewError::serialization_untyped(other.to_string()),
    }
}
