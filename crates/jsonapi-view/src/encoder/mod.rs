//! Document encoding
//!
//! `DocumentEncoder` is the contract between the view and whatever turns a
//! payload into a JSON:API document. `JsonApiEncoder` is the implementation
//! used by default.

mod document;
mod include;

pub use document::JsonApiEncoder;
pub use include::IncludeTree;

use crate::error::ViewError;
use crate::options::JsonFlags;
use crate::registry::SchemaMappings;
use crate::view_vars::Payload;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Output configuration handed to the encoder for one call.
#[derive(Debug, Clone, Default)]
pub struct EncoderOptions {
    pub json_flags: JsonFlags,
    /// Base URL for links, without a trailing slash
    pub url_prefix: String,
    /// Top-level meta attached to data documents
    pub meta: Option<Map<String, Value>>,
}

impl EncoderOptions {
    pub fn new(json_flags: JsonFlags, url_prefix: impl AsRef<str>) -> Self {
        Self {
            json_flags,
            url_prefix: url_prefix.as_ref().trim_end_matches('/').to_string(),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Include paths and sparse fieldsets for one call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingParameters<'a> {
    pub include: &'a [String],
    pub fieldsets: Option<&'a BTreeMap<String, BTreeSet<String>>>,
}

impl<'a> EncodingParameters<'a> {
    pub fn new(
        include: &'a [String],
        fieldsets: Option<&'a BTreeMap<String, BTreeSet<String>>>,
    ) -> Self {
        Self { include, fieldsets }
    }
}

/// Defines the contract for JSON:API document encoders.
pub trait DocumentEncoder: Send + Sync {
    /// Encode a document holding only top-level `meta`.
    fn encode_meta(
        &self,
        meta: &Map<String, Value>,
        options: &EncoderOptions,
    ) -> Result<String, ViewError>;

    /// Encode `payload` as primary data, resolving schemas through `mappings`.
    fn encode_data(
        &self,
        mappings: &SchemaMappings,
        payload: &Payload,
        parameters: EncodingParameters<'_>,
        options: &EncoderOptions,
    ) -> Result<String, ViewError>;
}
