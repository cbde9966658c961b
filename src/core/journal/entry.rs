//! One row of the transaction log.

use crate::core::hasher::ContentHash;
use crate::core::planner::{Operation, OperationKind, OperationStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A persisted operation attempt or outcome
///
/// Column order is part of the file format. `status` comes last so a row
/// cut short by a crash never parses as a valid outcome. Logs written
/// before the `hash` column existed still read, with no hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: OperationKind,
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub size: u64,
    #[serde(default)]
    pub hash: Option<ContentHash>,
    pub status: OperationStatus,
}

impl LogEntry {
    /// Header row, matching the field order above
    pub const HEADER: [&'static str; 8] = [
        "sequence",
        "timestamp",
        "kind",
        "source",
        "destination",
        "size",
        "hash",
        "status",
    ];

    pub fn for_operation(operation: &Operation, status: OperationStatus) -> Self {
        Self {
            sequence: operation.sequence(),
            timestamp: Utc::now(),
            kind: operation.kind(),
            source: operation.source().to_path_buf(),
            destination: operation.destination().map(|d| d.to_path_buf()),
            size: operation.expected_size(),
            hash: operation.content_hash(),
            status,
        }
    }
}
