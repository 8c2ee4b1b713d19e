pub mod entity;
pub mod schema;
pub mod response;

pub use entity::{Entity, Relation};
pub use schema::Schema;
pub use response::HostResponse;
