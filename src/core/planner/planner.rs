//! Plan generation for the three modes.

use super::naming::UniqueNamer;
use super::{
    DateLayout, Operation, OperationKind, Plan, PlanMode, PlannerConfig, Transfer,
    DEFAULT_DUPLICATES_FOLDER, DEFAULT_FLATTEN_OUTPUT,
};
use crate::core::keeper::DuplicateGroup;
use crate::core::record::{FileRecord, RecordSnapshot};
use crate::error::PlanError;
use std::path::{Path, PathBuf};

/// Builds operation plans
#[derive(Debug, Clone)]
pub struct Planner {
    root: PathBuf,
    config: PlannerConfig,
}

impl Planner {
    pub fn new(root: impl Into<PathBuf>, config: PlannerConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Resolve a configured folder against the root
    pub fn resolve(&self, folder: &Path) -> PathBuf {
        if folder.is_absolute() {
            folder.to_path_buf()
        } else {
            self.root.join(folder)
        }
    }

    /// Where moved duplicates go, if anywhere
    ///
    /// A safe-mode dedup always has one: the configured folder, or
    /// `<root>/duplicates`.
    pub fn duplicates_folder(&self) -> Option<PathBuf> {
        let PlanMode::Dedup { duplicates_folder } = &self.config.mode else {
            return None;
        };
        match duplicates_folder {
            Some(folder) => Some(self.resolve(folder)),
            None if self.config.safe_mode => Some(self.root.join(DEFAULT_DUPLICATES_FOLDER)),
            None => None,
        }
    }

    /// Target directory of a flatten
    pub fn flatten_output(&self) -> Option<PathBuf> {
        match &self.config.mode {
            PlanMode::Flatten { transfer, output } => Some(match (output, transfer) {
                (Some(output), _) => self.resolve(output),
                (None, Transfer::Copy) => self.root.join(DEFAULT_FLATTEN_OUTPUT),
                (None, Transfer::Move) => self.root.clone(),
            }),
            _ => None,
        }
    }

    fn unclassified_folder(&self) -> Option<PathBuf> {
        match &self.config.mode {
            PlanMode::Organize {
                unclassified_folder: Some(folder),
                ..
            } => Some(self.resolve(folder)),
            _ => None,
        }
    }

    /// Folders this plan writes into that a scan should not descend into
    pub fn managed_folders(&self) -> Vec<PathBuf> {
        let mut folders = Vec::new();
        if let Some(duplicates) = self.duplicates_folder() {
            folders.push(duplicates);
        }
        if let Some(output) = self.flatten_output() {
            if output != self.root {
                folders.push(output);
            }
        }
        if let Some(unclassified) = self.unclassified_folder() {
            folders.push(unclassified);
        }
        folders
    }

    /// Build the plan for the configured mode
    pub fn plan(
        &self,
        snapshot: &RecordSnapshot,
        groups: &[DuplicateGroup],
    ) -> Result<Plan, PlanError> {
        for folder in self.managed_folders() {
            validate_folder(&folder)?;
        }

        let mut namer = UniqueNamer::new();
        let mut plan = Plan::new(self.config.mode.run_kind(), self.root.clone());

        plan.operations = match &self.config.mode {
            PlanMode::Flatten { transfer, .. } => {
                plan.bulk_copy = *transfer == Transfer::Copy;
                self.plan_flatten(snapshot, *transfer, &mut namer)
            }
            PlanMode::Dedup { .. } => self.plan_dedup(groups, &mut namer),
            PlanMode::Organize { layout, .. } => {
                self.plan_organize(snapshot, *layout, &mut namer)
            }
        };

        if self.config.safe_mode {
            plan.operations = self.enforce_safe_mode(plan.operations, &mut namer);
        }

        plan.operations = plan
            .operations
            .into_iter()
            .enumerate()
            .map(|(i, op)| op.renumbered(self.config.first_sequence + i as u64))
            .collect();

        tracing::info!(
            "Planned {} operations for {} ({} moves, {} copies, {} deletes)",
            plan.len(),
            plan.run,
            plan.count_of(OperationKind::Move),
            plan.count_of(OperationKind::Copy),
            plan.count_of(OperationKind::Delete)
        );

        Ok(plan)
    }

    fn plan_flatten(
        &self,
        snapshot: &RecordSnapshot,
        transfer: Transfer,
        namer: &mut UniqueNamer,
    ) -> Vec<Operation> {
        let Some(target) = self.flatten_output() else {
            return Vec::new();
        };

        let mut operations = Vec::new();
        let mut already_flat = 0usize;

        for record in snapshot {
            if record.parent() == Some(target.as_path()) {
                already_flat += 1;
                continue;
            }
            let Some(name) = record.file_name() else {
                continue;
            };

            let destination = namer.claim(&target, name);
            let operation = match transfer {
                Transfer::Move => Operation::move_file(0, record.path.clone(), destination, record.size),
                Transfer::Copy => Operation::copy_file(0, record.path.clone(), destination, record.size),
            };
            operations.push(operation.with_content_hash(record.exact_hash));
        }

        tracing::info!(
            "{} files are already in {}",
            already_flat,
            target.display()
        );
        operations
    }

    fn plan_dedup(&self, groups: &[DuplicateGroup], namer: &mut UniqueNamer) -> Vec<Operation> {
        let folder = match &self.config.mode {
            PlanMode::Dedup {
                duplicates_folder: Some(folder),
            } => Some(self.resolve(folder)),
            _ => None,
        };

        let mut operations = Vec::new();
        for group in groups.iter().filter(|g| g.members.len() >= 2) {
            let keeper = &group.keeper().path;
            for duplicate in group.duplicates() {
                if &duplicate.path == keeper {
                    continue;
                }
                operations.push(match &folder {
                    Some(folder) => self.move_into(duplicate, folder, namer),
                    None => Operation::delete_file(0, duplicate.path.clone(), duplicate.size)
                        .with_content_hash(duplicate.exact_hash),
                });
            }
        }
        operations
    }

    fn plan_organize(
        &self,
        snapshot: &RecordSnapshot,
        layout: DateLayout,
        namer: &mut UniqueNamer,
    ) -> Vec<Operation> {
        let unclassified = self.unclassified_folder();
        let mut operations = Vec::new();

        for record in snapshot {
            if in_dated_folder(record, &self.root, layout) {
                continue;
            }
            if let Some(unclassified) = &unclassified {
                if record.path.starts_with(unclassified) {
                    continue;
                }
            }

            let target = match (&record.capture_date, &unclassified) {
                (Some(date), _) => self.root.join(layout.folder_name(date)),
                (None, Some(unclassified)) => unclassified.clone(),
                (None, None) => continue,
            };

            if record.parent() == Some(target.as_path()) {
                continue;
            }
            operations.push(self.move_into(record, &target, namer));
        }
        operations
    }

    /// Rewrite every delete into a move to the duplicates folder
    fn enforce_safe_mode(&self, operations: Vec<Operation>, namer: &mut UniqueNamer) -> Vec<Operation> {
        let Some(folder) = self.duplicates_folder() else {
            return operations;
        };

        operations
            .into_iter()
            .map(|op| {
                if op.kind() != OperationKind::Delete {
                    return op;
                }

                let name = op
                    .source()
                    .file_name()
                    .unwrap_or_else(|| std::ffi::OsStr::new("file"));
                let destination = namer.claim(&folder, name);
                tracing::debug!(
                    "Safe mode: deleting {} becomes a move",
                    op.source().display()
                );
                let moved = Operation::move_file(
                    op.sequence(),
                    op.source().to_path_buf(),
                    destination,
                    op.expected_size(),
                );
                match op.content_hash() {
                    Some(hash) => moved.with_content_hash(hash),
                    None => moved,
                }
            })
            .collect()
    }

    fn move_into(&self, record: &FileRecord, folder: &Path, namer: &mut UniqueNamer) -> Operation {
        let name = record
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "file".into());
        let destination = namer.claim(folder, &name);
        Operation::move_file(0, record.path.clone(), destination, record.size)
            .with_content_hash(record.exact_hash)
    }
}

/// Whether the record already sits in a folder this layout would create
///
/// Only folders below `root` count; the root's own name is irrelevant.
fn in_dated_folder(record: &FileRecord, root: &Path, layout: DateLayout) -> bool {
    record
        .parent()
        .filter(|p| *p != root && p.starts_with(root))
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(|n| layout.matches_folder(n))
        .unwrap_or(false)
}

fn validate_folder(folder: &Path) -> Result<(), PlanError> {
    if folder.exists() && !folder.is_dir() {
        return Err(PlanError::InvalidFolder {
            path: folder.to_path_buf(),
            reason: "exists and is not a directory".to_string(),
        });
    }
    Ok(())
}
