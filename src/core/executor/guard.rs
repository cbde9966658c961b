//! Scoped logging around one operation.

use crate::core::journal::TransactionLogWriter;
use crate::core::planner::{Operation, OperationStatus};
use crate::error::JournalError;

/// Writes a `planned` row on creation and an outcome row on exit
///
/// If the guard is dropped without [`finish`](Self::finish), for example
/// while unwinding from a panic, only the `planned` row remains. The
/// filesystem call may or may not have happened, and the log says exactly
/// that.
pub(crate) struct OperationGuard<'a> {
    journal: Option<&'a mut TransactionLogWriter>,
    operation: Operation,
    finished: bool,
}

impl<'a> OperationGuard<'a> {
    pub(crate) fn begin(
        mut journal: Option<&'a mut TransactionLogWriter>,
        operation: Operation,
    ) -> Result<Self, JournalError> {
        if let Some(writer) = journal.as_deref_mut() {
            writer.record(&operation, OperationStatus::Planned)?;
        }
        Ok(Self {
            journal,
            operation,
            finished: false,
        })
    }

    pub(crate) fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Record the outcome and hand back the operation with its final status
    pub(crate) fn finish(mut self, status: OperationStatus) -> Result<Operation, JournalError> {
        self.finished = true;
        self.operation.set_status(status);
        if let Some(writer) = self.journal.as_deref_mut() {
            writer.record(&self.operation, status)?;
        }
        Ok(self.operation.clone())
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                "Operation #{} abandoned, outcome unknown: {}",
                self.operation.sequence(),
                self.operation
            );
        }
    }
}
