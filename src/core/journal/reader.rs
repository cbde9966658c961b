//! Log reader.

use super::entry::LogEntry;
use crate::core::planner::OperationStatus;
use crate::error::JournalError;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Final state of every operation found in a log
///
/// Rows for the same sequence number are folded so the last one wins.
/// Rows that do not parse (a torn final line, hand edits) are counted and
/// skipped.
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    entries: BTreeMap<u64, LogEntry>,
    skipped_rows: usize,
}

impl TransactionLog {
    /// Read a log file written by [`TransactionLogWriter`](super::TransactionLogWriter)
    pub fn read(path: &Path) -> Result<Self, JournalError> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| JournalError::Read {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let log = Self::collect(reader);
        if log.skipped_rows > 0 {
            tracing::warn!(
                "Skipped {} unreadable rows in {}",
                log.skipped_rows,
                path.display()
            );
        }
        Ok(log)
    }

    /// Read a log from any byte source
    pub fn from_reader<R: Read>(source: R) -> Self {
        Self::collect(csv::ReaderBuilder::new().flexible(true).from_reader(source))
    }

    fn collect<R: Read>(mut reader: csv::Reader<R>) -> Self {
        let mut log = Self::default();
        for row in reader.deserialize::<LogEntry>() {
            match row {
                Ok(entry) => {
                    log.entries.insert(entry.sequence, entry);
                }
                Err(e) => {
                    tracing::debug!("Unreadable log row: {}", e);
                    log.skipped_rows += 1;
                }
            }
        }
        log
    }

    /// Every operation, in ascending sequence order
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.entries.values()
    }

    /// Operations whose last recorded status is `Committed`
    pub fn committed(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.entries
            .values()
            .filter(|e| e.status == OperationStatus::Committed)
    }

    /// Operations that were started but never reached an outcome
    pub fn unresolved(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries
            .values()
            .filter(|e| e.status == OperationStatus::Planned)
    }

    pub fn max_sequence(&self) -> Option<u64> {
        self.entries.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows that could not be parsed
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}
