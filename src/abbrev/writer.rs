//! Append-only abbreviation record stream.
//!
//! One record per confirmed table entry, in allocation order:
//! `{prefix}{seq}={pattern};` followed by a newline. Records are never
//! rewritten or removed, so a later re-read can reconstruct the table
//! deterministically.

use std::io;

use rustc_hash::FxHashMap;

use super::AbbrevEntry;

/// Writes abbreviation records to an append-only sink.
#[derive(Debug)]
pub struct RecordWriter<W: io::Write> {
    sink: W,
    last_seq: FxHashMap<String, u32>,
}

impl<W: io::Write> RecordWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            last_seq: FxHashMap::default(),
        }
    }

    /// Append one record for a newly confirmed entry.
    ///
    /// # Errors
    /// Propagates sink write failures.
    pub fn record(&mut self, entry: &AbbrevEntry) -> io::Result<()> {
        let last = self.last_seq.entry(entry.prefix.clone()).or_insert(0);
        debug_assert!(
            entry.seq > *last,
            "record for {}{} out of allocation order",
            entry.prefix,
            entry.seq
        );
        *last = entry.seq;

        writeln!(self.sink, "{}{}={};", entry.prefix, entry.seq, entry.pattern)
    }

    /// Flush and return the underlying sink.
    ///
    /// # Errors
    /// Propagates sink flush failures.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }

    /// Access the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }
}
