//! Lookup queue persisted as CSV.
//!
//! When a title lookup comes back empty, the note is queued with a blank
//! IMDb id. A human fills the id in by hand, and `fix-queue` applies every
//! entry that has one. The file keeps the header row
//! `filename,movie_title,imdb_id`.

use anyhow::{bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::models::QueueEntry;

const HEADER: [&str; 3] = ["filename", "movie_title", "imdb_id"];

/// One data row of the queue file.
///
/// The file is edited by hand, so a row may not decode. Such rows are kept
/// as read so that rewriting the queue never drops them.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueRow {
    Entry(QueueEntry),
    Malformed(MalformedRow),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MalformedRow {
    /// 1-based line in the file.
    pub line: u64,
    pub record: csv::ByteRecord,
    pub reason: String,
}

impl From<QueueEntry> for QueueRow {
    fn from(entry: QueueEntry) -> Self {
        QueueRow::Entry(entry)
    }
}

/// Handle on the queue file.
#[derive(Debug, Clone)]
pub struct LookupQueue {
    path: PathBuf,
}

impl LookupQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read every row, decoding each one on its own.
    ///
    /// Whitespace around fields and headers is trimmed. Only a file that
    /// cannot be opened or read is an error.
    pub fn load_rows(&self) -> Result<Vec<QueueRow>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open queue file: {}", self.path.display()))?;
        let headers = reader
            .byte_headers()
            .with_context(|| format!("Failed to read header of {}", self.path.display()))?
            .clone();

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record =
                record.with_context(|| format!("Failed to read {}", self.path.display()))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            match record.deserialize::<QueueEntry>(Some(&headers)) {
                Ok(entry) => rows.push(QueueRow::Entry(entry)),
                Err(e) => rows.push(QueueRow::Malformed(MalformedRow {
                    line,
                    record,
                    reason: e.to_string(),
                })),
            }
        }
        Ok(rows)
    }

    /// Read every entry, failing on the first row that does not decode.
    pub fn load(&self) -> Result<Vec<QueueEntry>> {
        let mut entries = Vec::new();
        for row in self.load_rows()? {
            match row {
                QueueRow::Entry(entry) => entries.push(entry),
                QueueRow::Malformed(bad) => bail!(
                    "Malformed row at line {} in {}: {}",
                    bad.line,
                    self.path.display(),
                    bad.reason
                ),
            }
        }
        Ok(entries)
    }

    /// Decodable entries if the file exists, otherwise an empty list.
    /// Malformed rows are logged and left out.
    pub fn load_or_empty(&self) -> Result<Vec<QueueEntry>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for row in self.load_rows()? {
            match row {
                QueueRow::Entry(entry) => entries.push(entry),
                QueueRow::Malformed(bad) => {
                    tracing::warn!(line = bad.line, "ignoring malformed queue row: {}", bad.reason)
                }
            }
        }
        Ok(entries)
    }

    /// Append one entry, writing the header row first for a new file.
    pub fn append(&self, entry: &QueueEntry) -> Result<()> {
        let is_new = !self.exists()
            || std::fs::metadata(&self.path)
                .map(|m| m.len() == 0)
                .unwrap_or(true);
        let needs_newline = !is_new && !self.ends_with_newline()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open queue file: {}", self.path.display()))?;
        if needs_newline {
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush()?;
        Ok(())
    }

    fn ends_with_newline(&self) -> Result<bool> {
        let mut file = File::open(&self.path)
            .with_context(|| format!("Failed to open queue file: {}", self.path.display()))?;
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] == b'\n')
    }

    /// Replace the file's contents with `rows`. Malformed rows are written
    /// back as they were read.
    pub fn rewrite(&self, rows: &[QueueRow]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let tmp = tempfile::NamedTempFile::new_in(dir)?;

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_writer(tmp.as_file());
            writer.write_record(HEADER)?;
            for row in rows {
                match row {
                    QueueRow::Entry(entry) => writer.serialize(entry)?,
                    QueueRow::Malformed(bad) => writer.write_byte_record(&bad.record)?,
                }
            }
            writer.flush()?;
        }

        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
