//! Record output
//!
//! This module handles where extracted records end up:
//! - Singer messages on stdout
//! - NDJSON files, one per stream
//! - memory, for tests and embedding

mod ndjson;
mod singer;
mod sink;

pub use ndjson::{NdjsonDirectorySink, NdjsonWriter};
pub use singer::SingerSink;
pub use sink::{MemorySink, RecordSink, StreamLoader};
