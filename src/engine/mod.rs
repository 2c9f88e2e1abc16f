//! Extraction engine
//!
//! Turns a [`StreamDescriptor`](crate::streams::StreamDescriptor) into a
//! sequence of record pages: JSON path evaluation over response bodies,
//! record extraction, cursor tracking and the per-stream state machine that
//! drives them.

mod cursor;
mod extraction;
mod jsonpath;
mod records;

pub use cursor::{PageCursor, PageCursorTracker};
pub use extraction::{
    ExtractionEngine, NEXT_TOKEN_PARAM, Page, StreamExtraction, StreamSummary,
};
pub use jsonpath::{JsonPath, Segment};
pub use records::{Record, RecordExtractor, parse_body};
