//! Record transformations applied between extraction and output

mod schema_conformer;

pub use schema_conformer::SchemaConformer;
