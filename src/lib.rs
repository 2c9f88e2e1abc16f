//! GAPI tap
//!
//! Extracts records from the OAuth2-protected GAPI REST API. Each configured
//! scope maps to a set of streams; every stream is fetched page by page,
//! following the API's cursor, and written out as Singer messages or NDJSON.

pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod etl;
pub mod storage;
pub mod streams;
pub mod tap;
pub mod transform;

// Re-exports for convenience
pub use client::{GapiClient, ReqwestTransport, RetryPolicy, TokenProvider, Transport};
pub use config::TapConfig;
pub use engine::{ExtractionEngine, Record, StreamSummary};
pub use error::{ExtractError, StreamFailure};
pub use etl::{Extractor, Loader, Pipeline, Transformer};
pub use storage::{NdjsonDirectorySink, RecordSink, SingerSink};
pub use streams::{StreamDescriptor, StreamRegistry};
pub use tap::{RunReport, TapPipeline};
