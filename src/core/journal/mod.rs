//! # Journal Module
//!
//! The transaction log that makes a run reversible.
//!
//! ## Format
//! A CSV file with a header row and one row per status change:
//!
//! ```text
//! sequence,timestamp,kind,source,destination,size,hash,status
//! 1,2021-02-14T09:30:00Z,move,/p/a.jpg,/p/duplicates/a.jpg,2048,af13…,planned
//! 1,2021-02-14T09:30:00Z,move,/p/a.jpg,/p/duplicates/a.jpg,2048,af13…,committed
//! ```
//!
//! `hash` is the BLAKE3 digest of the source at plan time. Recovery uses it
//! together with `size` to refuse undoing a file that was edited since.
//!
//! A `planned` row is written before the filesystem call and a
//! `committed` or `failed` row after it. After a crash the last row may be
//! cut short; readers skip it and treat that operation as unresolved.

mod entry;
mod reader;
mod writer;

pub use entry::LogEntry;
pub use reader::TransactionLog;
pub use writer::TransactionLogWriter;
