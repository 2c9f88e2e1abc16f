//! Singer message output
//!
//! One JSON message per line: a `SCHEMA` message when a stream begins, then a
//! `RECORD` message per record.

use super::sink::RecordSink;
use crate::engine::Record;
use crate::streams::StreamDescriptor;
use eyre::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::io::{BufWriter, Stdout, Write};

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
enum Message<'a> {
    Schema {
        stream: &'a str,
        schema: Value,
        key_properties: &'a [String],
    },
    Record {
        stream: &'a str,
        record: &'a Record,
    },
}

/// Writes Singer messages to any [`Write`], stdout by default.
///
/// # Example
/// ```
/// use tap_gapi::storage::{RecordSink, SingerSink};
/// use tap_gapi::streams::{Property, Schema, StreamDescriptor};
///
/// let groups = StreamDescriptor::single_shot(
///     "groups",
///     "/business/taxonomy/groups",
///     &["id"],
///     Schema::new(vec![Property::string("id")]),
/// )
/// .unwrap();
///
/// let mut sink = SingerSink::new(Vec::new());
/// sink.begin_stream(&groups).unwrap();
/// let out = String::from_utf8(sink.into_inner()).unwrap();
/// assert!(out.starts_with(r#"{"type":"SCHEMA","stream":"groups""#));
/// ```
pub struct SingerSink<W: Write> {
    out: W,
}

impl SingerSink<BufWriter<Stdout>> {
    pub fn stdout() -> Self {
        Self::new(BufWriter::new(std::io::stdout()))
    }
}

impl<W: Write> SingerSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, message: &Message<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.out, message).context("Failed to serialize Singer message")?;
        self.out
            .write_all(b"\n")
            .context("Failed to write Singer message")?;
        Ok(())
    }
}

impl<W: Write + Send> RecordSink for SingerSink<W> {
    fn begin_stream(&mut self, descriptor: &StreamDescriptor) -> Result<()> {
        self.emit(&Message::Schema {
            stream: descriptor.name(),
            schema: descriptor.schema().to_json_schema(),
            key_properties: descriptor.primary_keys(),
        })
    }

    fn write_records(&mut self, stream: &str, records: &[Record]) -> Result<usize> {
        for record in records {
            self.emit(&Message::Record { stream, record })?;
        }
        // Keep downstream targets fed page by page
        self.out.flush().context("Failed to flush Singer output")?;
        Ok(records.len())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("Failed to flush Singer output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::{Property, Schema};
    use serde_json::json;

    fn descriptor() -> StreamDescriptor {
        StreamDescriptor::single_shot(
            "markets",
            "/business/taxonomy/markets",
            &["id"],
            Schema::new(vec![Property::string("id"), Property::string("name")]),
        )
        .unwrap()
    }

    fn lines(sink: SingerSink<Vec<u8>>) -> Vec<Value> {
        String::from_utf8(sink.into_inner())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_schema_then_records() {
        let mut sink = SingerSink::new(Vec::new());
        sink.begin_stream(&descriptor()).unwrap();
        let records: Vec<Record> = vec![
            json!({"id": "m1", "name": "East"}).as_object().unwrap().clone(),
            json!({"id": "m2", "name": "West"}).as_object().unwrap().clone(),
        ];
        assert_eq!(sink.write_records("markets", &records).unwrap(), 2);
        sink.finish().unwrap();

        let messages = lines(sink);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["type"], "SCHEMA");
        assert_eq!(messages[0]["key_properties"], json!(["id"]));
        assert_eq!(messages[0]["schema"]["properties"]["name"]["type"], json!(["string", "null"]));
        assert_eq!(
            messages[1],
            json!({"type": "RECORD", "stream": "markets", "record": {"id": "m1", "name": "East"}})
        );
        assert_eq!(messages[2]["record"]["id"], "m2");
    }

    #[test]
    fn test_record_field_order_kept() {
        let mut sink = SingerSink::new(Vec::new());
        let record: Record = serde_json::from_str(r#"{"zeta": 1, "alpha": 2}"#).unwrap();
        sink.write_records("s", &[record]).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.contains(r#""record":{"zeta":1,"alpha":2}"#));
    }
}
