//! Per-request serialization options

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

bitflags::bitflags! {
    /// Output formatting flags.
    ///
    /// Bit values match the host framework's historic JSON option bitmask so
    /// integers stored in `_jsonOptions` keep their meaning.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct JsonFlags: u32 {
        /// Escape `<` and `>` as `\u003C` and `\u003E`
        const HEX_TAG = 1;
        /// Escape `&` as `\u0026`
        const HEX_AMP = 2;
        /// Escape `'` as `\u0027`
        const HEX_APOS = 4;
        /// Escape `"` as `\u0022`
        const HEX_QUOT = 8;
        /// Indent output with four spaces
        const PRETTY_PRINT = 128;
    }
}

impl Default for JsonFlags {
    fn default() -> Self {
        JsonFlags::HEX_TAG | JsonFlags::HEX_APOS | JsonFlags::HEX_AMP | JsonFlags::HEX_QUOT
    }
}

/// What a render call should serialize.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SerializeTarget {
    /// Nothing; the response carries meta only.
    #[default]
    Nothing,
    /// The value of one view variable.
    Var(String),
    /// The values of several view variables, in order.
    Vars(Vec<String>),
    /// Every non-reserved view variable.
    All,
    /// The resources stored in the `_serialize` variable itself.
    Data,
}

impl SerializeTarget {
    pub fn is_empty(&self) -> bool {
        match self {
            SerializeTarget::Nothing => true,
            SerializeTarget::Var(name) => name.is_empty(),
            SerializeTarget::Vars(names) => names.is_empty(),
            SerializeTarget::All | SerializeTarget::Data => false,
        }
    }
}

/// Snapshot of the serialization directives for one render call.
#[derive(Debug, Clone, Default)]
pub struct SerializationOptions {
    pub serialize: SerializeTarget,
    /// Dotted relationship paths to embed in `included`
    pub include: Vec<String>,
    /// Allowed field names per resource type
    pub fieldsets: Option<BTreeMap<String, BTreeSet<String>>>,
    /// Per-call meta, merged over the serializer's own meta
    pub meta: Map<String, Value>,
    /// `None` selects `JsonFlags::default()`
    pub json_flags: Option<JsonFlags>,
    /// Overrides the serializer's URL prefix for this call
    pub url_prefix: Option<String>,
    /// Pretty-print output
    pub debug: bool,
}

impl SerializationOptions {
    pub fn new(serialize: SerializeTarget) -> Self {
        Self {
            serialize,
            ..Self::default()
        }
    }

    pub fn with_include<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fieldset<I, S>(mut self, resource_type: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fieldsets
            .get_or_insert_with(BTreeMap::new)
            .insert(resource_type.into(), fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn with_json_flags(mut self, flags: JsonFlags) -> Self {
        self.json_flags = Some(flags);
        self
    }

    pub fn with_url_prefix(mut self, url_prefix: impl Into<String>) -> Self {
        self.url_prefix = Some(url_prefix.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Flags used for output: explicit or default, plus pretty printing in
    /// debug mode.
    pub fn effective_flags(&self) -> JsonFlags {
        let flags = self.json_flags.unwrap_or_default();
        if self.debug {
            flags | JsonFlags::PRETTY_PRINT
        } else {
            flags
        }
    }
}
