//! Record sinks
//!
//! A [`RecordSink`] receives every stream of a run in turn. [`StreamLoader`]
//! binds a sink to one stream so it can sit at the end of an ETL
//! [`Pipeline`](crate::etl::Pipeline).

use crate::engine::Record;
use crate::etl::Loader;
use crate::streams::StreamDescriptor;
use eyre::Result;

/// Destination for extracted records.
///
/// Calls arrive as `begin_stream`, any number of `write_records` for that
/// stream, then the next `begin_stream`; `finish` once at the end of the run.
pub trait RecordSink: Send {
    /// Announce a stream before its first record
    fn begin_stream(&mut self, descriptor: &StreamDescriptor) -> Result<()>;

    /// Write one page of records, returning how many were written
    fn write_records(&mut self, stream: &str, records: &[Record]) -> Result<usize>;

    /// Flush anything buffered
    fn finish(&mut self) -> Result<()>;
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn begin_stream(&mut self, descriptor: &StreamDescriptor) -> Result<()> {
        (**self).begin_stream(descriptor)
    }

    fn write_records(&mut self, stream: &str, records: &[Record]) -> Result<usize> {
        (**self).write_records(stream, records)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// [`Loader`] writing into a sink under a fixed stream name
pub struct StreamLoader<'s, S: ?Sized> {
    sink: &'s mut S,
    stream: String,
}

impl<'s, S: RecordSink + ?Sized> StreamLoader<'s, S> {
    pub fn new(sink: &'s mut S, stream: impl Into<String>) -> Self {
        Self {
            sink,
            stream: stream.into(),
        }
    }
}

impl<S: RecordSink + ?Sized> Loader for StreamLoader<'_, S> {
    type Item = Record;

    async fn load(&mut self, items: Vec<Self::Item>) -> Result<usize> {
        self.sink.write_records(&self.stream, &items)
    }
}

/// In-memory sink, handy for tests and embedding
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Streams in the order they were begun
    pub streams: Vec<String>,
    /// `(stream, record)` in write order
    pub records: Vec<(String, Record)>,
    pub finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written for `stream`, in order
    pub fn records_for<'a>(&'a self, stream: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records
            .iter()
            .filter(move |(s, _)| s == stream)
            .map(|(_, r)| r)
    }
}

impl RecordSink for MemorySink {
    fn begin_stream(&mut self, descriptor: &StreamDescriptor) -> Result<()> {
        self.streams.push(descriptor.name().to_string());
        Ok(())
    }

    fn write_records(&mut self, stream: &str, records: &[Record]) -> Result<usize> {
        self.records
            .extend(records.iter().map(|r| (stream.to_string(), r.clone())));
        Ok(records.len())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
