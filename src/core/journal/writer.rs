//! Append-only log writer.

use super::entry::LogEntry;
use super::reader::TransactionLog;
use crate::core::planner::{Operation, OperationStatus};
use crate::error::JournalError;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Single writer for one transaction log file
///
/// Opening an existing log appends to it, and sequence numbers carry on
/// from the highest one already recorded. Every row is flushed before
/// `record` returns.
pub struct TransactionLogWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    next_sequence: u64,
}

impl TransactionLogWriter {
    /// Open or create the log at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let path = path.into();

        let existing_len = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let next_sequence = if existing_len > 0 {
            TransactionLog::read(&path)?.max_sequence().map_or(1, |s| s + 1)
        } else {
            1
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| JournalError::Open {
                    path: path.clone(),
                    source,
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| JournalError::Open {
                path: path.clone(),
                source,
            })?;

        // A crash can leave the last row without its newline
        if existing_len > 0 && !ends_with_newline(&path) {
            file.write_all(b"\n").map_err(|e| JournalError::Write {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if existing_len == 0 {
            writer
                .write_record(LogEntry::HEADER)
                .and_then(|_| writer.flush().map_err(csv::Error::from))
                .map_err(|e| JournalError::Write {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
        }

        tracing::info!("Logging operations to: {}", path.display());

        Ok(Self {
            path,
            writer,
            next_sequence,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First sequence number not yet used in this log
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Append one row for the operation and flush it
    pub fn record(&mut self, operation: &Operation, status: OperationStatus) -> Result<(), JournalError> {
        let entry = LogEntry::for_operation(operation, status);
        self.writer
            .serialize(&entry)
            .and_then(|_| self.writer.flush().map_err(csv::Error::from))
            .map_err(|e| JournalError::Write {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        self.next_sequence = self.next_sequence.max(operation.sequence() + 1);
        Ok(())
    }
}

impl std::fmt::Debug for TransactionLogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionLogWriter")
            .field("path", &self.path)
            .field("next_sequence", &self.next_sequence)
            .finish()
    }
}

fn ends_with_newline(path: &Path) -> bool {
    let Ok(mut file) = File::open(path) else {
        return true;
    };
    if file.seek(SeekFrom::End(-1)).is_err() {
        return true;
    }
    let mut last = [0u8; 1];
    match file.read_exact(&mut last) {
        Ok(()) => last[0] == b'\n',
        Err(_) => true,
    }
}
