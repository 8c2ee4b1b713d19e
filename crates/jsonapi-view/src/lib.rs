//! Render domain entities as JSON:API documents.
//!
//! A `ResponseSerializer` is built once from a `SchemaRegistry` and a list
//! of entity mappings, then shared. Each request gets a `JsonApiView` (or
//! calls `ResponseSerializer::render` directly) with its own options and
//! payload; every rendered response carries the `application/vnd.api+json`
//! content type.

pub mod config;
pub mod encoder;
pub mod entity;
pub mod error;
pub mod logging;
pub mod options;
pub mod output;
pub mod registry;
pub mod response;
pub mod schema;
pub mod serializer;
pub mod traits;
pub mod view;
pub mod view_vars;

pub use config::{EntityMapping, ViewConfig};
pub use encoder::{DocumentEncoder, EncoderOptions, EncodingParameters, JsonApiEncoder};
pub use entity::Record;
pub use error::ViewError;
pub use options::{JsonFlags, SerializationOptions, SerializeTarget};
pub use registry::{ResolutionOrigin, SchemaMappings, SchemaRegistry, SchemaSpec};
pub use response::{BufferedResponse, JSONAPI_MEDIA_TYPE};
pub use schema::{factory, EntitySchema, SchemaContext, SchemaFactory};
pub use serializer::ResponseSerializer;
pub use traits::{Entity, HostResponse, Relation, Schema};
pub use view::JsonApiView;
pub use view_vars::{Payload, ViewValue, ViewVars};
