//! NDJSON (Newline Delimited JSON) file output

use super::sink::RecordSink;
use crate::engine::Record;
use crate::streams::StreamDescriptor;
use eyre::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write NDJSON to a file
pub struct NdjsonWriter {
    path: PathBuf,
}

impl NdjsonWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file with `items` as NDJSON
    pub fn write<T: Serialize>(&self, items: &[T]) -> Result<()> {
        let mut content = String::new();
        for item in items {
            content.push_str(&serde_json::to_string(item)?);
            content.push('\n');
        }

        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write NDJSON file: {}", self.path.display()))?;

        Ok(())
    }

    /// Append items to existing NDJSON file
    pub fn append<T: Serialize>(&self, items: &[T]) -> Result<()> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open NDJSON file: {}", self.path.display()))?;
        let mut file = std::io::BufWriter::new(file);

        for item in items {
            writeln!(file, "{}", serde_json::to_string(item)?)?;
        }
        file.flush()?;

        Ok(())
    }
}

/// One `<stream>.ndjson` per stream in a directory.
///
/// Beginning a stream truncates its file, so a rerun replaces the previous
/// output instead of appending to it.
pub struct NdjsonDirectorySink {
    dir: PathBuf,
    current: Option<(String, NdjsonWriter)>,
}

impl NdjsonDirectorySink {
    /// Create the directory if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        Ok(Self { dir, current: None })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_for(&self, stream: &str) -> PathBuf {
        self.dir.join(format!("{stream}.ndjson"))
    }
}

impl RecordSink for NdjsonDirectorySink {
    fn begin_stream(&mut self, descriptor: &StreamDescriptor) -> Result<()> {
        let stream = descriptor.name();
        if stream.contains(['/', '\\']) || stream.starts_with('.') {
            eyre::bail!("Stream name '{}' cannot be used as a file name", stream);
        }

        let writer = NdjsonWriter::new(self.file_for(stream));
        writer.write::<Record>(&[])?;
        log::debug!("Writing {} to {}", stream, writer.path().display());
        self.current = Some((stream.to_string(), writer));
        Ok(())
    }

    fn write_records(&mut self, stream: &str, records: &[Record]) -> Result<usize> {
        let writer = match &self.current {
            Some((current, writer)) if current == stream => writer,
            _ => eyre::bail!("Stream '{}' was not begun", stream),
        };
        writer.append(records)?;
        Ok(records.len())
    }

    fn finish(&mut self) -> Result<()> {
        self.current = None;
        Ok(())
    }
}
