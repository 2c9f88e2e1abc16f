//! Stream definitions
//!
//! Streams are data, not code: a [`StreamDescriptor`] per entity, grouped
//! by scope in a [`StreamRegistry`]. The built-in GAPI streams live in
//! [`catalog`].

pub mod catalog;
mod descriptor;
mod registry;
mod schema;

pub use descriptor::{
    DEFAULT_RECORDS_PATH, LAST_EVALUATED_KEY_PATH, PAGINATED_RECORDS_PATH, PaginationMode,
    StreamDescriptor,
};
pub use registry::StreamRegistry;
pub use schema::{Property, PropertyType, Schema};
