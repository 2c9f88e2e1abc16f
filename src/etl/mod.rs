//! Core ETL (Extract, Transform, Load) abstractions
//!
//! Streams are moved through these traits one batch at a time: an extracted
//! page is transformed and loaded before the next one is requested.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::Pipeline;
pub use transform::Transformer;
