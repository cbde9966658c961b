//! Integration tests for the pipeline module.
//!
//! These tests run whole flatten, dedup and organize passes on temporary
//! trees, with fake fingerprint, date and free-space collaborators so no
//! real images are needed.

mod common;

use assert_fs::prelude::*;
use common::{LockedFiles, NamedDates, NamedFingerprints};
use predicates::prelude::*;
use snaptidy::core::context::{FailureCategory, RunStatus};
use snaptidy::core::executor::FixedFreeSpace;
use snaptidy::core::hasher::NoFingerprints;
use snaptidy::core::metadata::NoCaptureDates;
use snaptidy::core::pipeline::{PipelineBuilder, RunReport};
use snaptidy::core::planner::{DateLayout, OperationKind, PlanMode, Transfer};
use snaptidy::error::{ExecuteError, SnapTidyError};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

fn dedup() -> PlanMode {
    PlanMode::Dedup {
        duplicates_folder: None,
    }
}

fn organize(layout: DateLayout, unclassified: Option<&str>) -> PlanMode {
    PlanMode::Organize {
        layout,
        unclassified_folder: unclassified.map(PathBuf::from),
    }
}

fn builder(
    root: &Path,
    mode: PlanMode,
) -> PipelineBuilder<NoFingerprints, NoCaptureDates, FixedFreeSpace> {
    PipelineBuilder::new(root, mode)
        .fingerprinter(NoFingerprints)
        .capture_dates(NoCaptureDates)
        .free_space(FixedFreeSpace(u64::MAX))
        .threads(2)
}

fn targeted(report: &RunReport) -> BTreeSet<PathBuf> {
    report
        .plan
        .operations
        .iter()
        .map(|op| op.source().to_path_buf())
        .collect()
}

#[test]
fn pipeline_handles_empty_directory() {
    let temp = assert_fs::TempDir::new().unwrap();

    let report = builder(temp.path(), dedup()).build().unwrap().run().unwrap();

    assert_eq!(report.summary.files_scanned, 0);
    assert!(report.plan.is_empty());
    assert_eq!(report.summary.status, RunStatus::Success);
}

#[test]
fn pipeline_rejects_file_as_root() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("photo.jpg").write_binary(b"x").unwrap();

    let result = builder(&temp.path().join("photo.jpg"), dedup())
        .build()
        .unwrap()
        .run();

    assert!(matches!(result, Err(SnapTidyError::Scan(_))));
}

#[test]
fn img_scenario_dedup_then_organize() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("IMG_0123.jpg").write_binary(b"H1 content").unwrap();
    temp.child("IMG_0123 (1).jpg").write_binary(b"H1 content").unwrap();
    temp.child("IMG_0456.jpg").write_binary(b"H2 content").unwrap();

    let dedup_report = builder(temp.path(), dedup()).build().unwrap().run().unwrap();

    assert_eq!(dedup_report.plan.len(), 1);
    let op = &dedup_report.plan.operations[0];
    assert_eq!(op.kind(), OperationKind::Delete);
    assert!(op.source().ends_with("IMG_0123 (1).jpg"));
    temp.child("IMG_0123 (1).jpg").assert(predicate::path::missing());
    temp.child("IMG_0123.jpg").assert(predicate::path::exists());

    let organize_report = builder(temp.path(), organize(DateLayout::YearMonth, None))
        .capture_dates(NamedDates::new(&[("IMG_0456.jpg", (2021, 2, 14))]))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(organize_report.plan.len(), 1);
    temp.child("202102/IMG_0456.jpg")
        .assert(predicate::path::exists());
    temp.child("IMG_0123.jpg").assert(predicate::path::exists());
}

#[test]
fn unreadable_entry_mid_scan_is_a_warning() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("a.jpg").write_binary(b"same").unwrap();
    temp.child("b.jpg").write_binary(b"same").unwrap();
    temp.child("locked.jpg").write_binary(b"same").unwrap();
    temp.child("z.jpg").write_binary(b"other").unwrap();

    let report = builder(temp.path(), dedup())
        .scanner(Box::new(LockedFiles::new(&["locked.jpg"])))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.summary.files_scanned, 3);
    assert_eq!(report.summary.failures.get(FailureCategory::ScanWarning), 1);
    assert_eq!(report.summary.failures.total(), 1);
    assert_eq!(report.summary.status, RunStatus::SuccessWithWarnings);
    assert_eq!(report.summary.committed, 1);
    assert!(report.diagnostics.iter().any(|d| d.path.ends_with("locked.jpg")));
    temp.child("b.jpg").assert(predicate::path::missing());
    temp.child("locked.jpg").assert("same");
    temp.child("z.jpg").assert("other");
}

#[cfg(unix)]
#[test]
fn unreadable_file_is_a_warning_not_a_failure() {
    use std::os::unix::fs::PermissionsExt;

    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("a.jpg").write_binary(b"same").unwrap();
    temp.child("b.jpg").write_binary(b"same").unwrap();
    temp.child("locked.jpg").write_binary(b"secret").unwrap();
    let locked = temp.path().join("locked.jpg");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    // root can read anything
    if std::fs::File::open(&locked).is_ok() {
        return;
    }

    let report = builder(temp.path(), dedup()).build().unwrap().run().unwrap();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.summary.failures.get(FailureCategory::ScanWarning), 1);
    assert_eq!(report.summary.status, RunStatus::SuccessWithWarnings);
    assert_eq!(report.summary.committed, 1);
    temp.child("b.jpg").assert(predicate::path::missing());
    temp.child("locked.jpg").assert(predicate::path::exists());
}

#[test]
fn copy_flatten_without_room_touches_nothing() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("2019/a.jpg").write_binary(&[1u8; 100]).unwrap();
    temp.child("2020/b.jpg").write_binary(&[2u8; 100]).unwrap();
    let before = common::tree(temp.path());

    let mode = PlanMode::Flatten {
        transfer: Transfer::Copy,
        output: None,
    };
    let result = builder(temp.path(), mode)
        .free_space(FixedFreeSpace(150))
        .logging(true)
        .build()
        .unwrap()
        .run();

    assert!(matches!(
        result,
        Err(SnapTidyError::Execute(ExecuteError::SpaceInsufficient {
            required: 200,
            available: 150,
            ..
        }))
    ));
    temp.child("flattened").assert(predicate::path::missing());
    assert_eq!(common::tree(temp.path()), before);
}

#[test]
fn copy_flatten_with_room_keeps_sources() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("2019/photo.jpg").write_binary(b"one").unwrap();
    temp.child("2020/photo.jpg").write_binary(b"two").unwrap();

    let mode = PlanMode::Flatten {
        transfer: Transfer::Copy,
        output: None,
    };
    let report = builder(temp.path(), mode).build().unwrap().run().unwrap();

    assert_eq!(report.summary.committed, 2);
    assert_eq!(report.summary.bytes_copied, 6);
    temp.child("flattened/photo.jpg").assert("one");
    temp.child("flattened/photo_1.jpg").assert("two");
    temp.child("2019/photo.jpg").assert(predicate::path::exists());
}

#[test]
fn dedup_plan_is_deterministic() {
    let temp = assert_fs::TempDir::new().unwrap();
    for name in ["c.jpg", "a.jpg", "b/a.jpg", "d.png"] {
        temp.child(name).write_binary(b"same bytes").unwrap();
    }
    temp.child("e.jpg").write_binary(b"near").unwrap();
    temp.child("f.jpg").write_binary(b"near, edited").unwrap();
    let prints = NamedFingerprints::new(&[("e.jpg", 0b1010_0000), ("f.jpg", 0b1010_0000)]);

    let run = || {
        builder(temp.path(), dedup())
            .fingerprinter(prints.clone())
            .dry_run(true)
            .build()
            .unwrap()
            .run()
            .unwrap()
    };
    let first = run();
    let second = run();

    assert_eq!(first.plan, second.plan);
    assert_eq!(first.groups, second.groups);
    assert_eq!(first.summary.duplicate_groups, 2);
}

#[test]
fn keeper_is_never_targeted() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("big.jpg").write_binary(&[7u8; 64]).unwrap();
    temp.child("small.jpg").write_binary(&[7u8; 16]).unwrap();
    temp.child("copy/big.jpg").write_binary(&[7u8; 64]).unwrap();
    temp.child("other.jpg").write_binary(b"unrelated").unwrap();
    let prints = NamedFingerprints::new(&[("big.jpg", 0x0f), ("small.jpg", 0x0f)]);

    let report = builder(temp.path(), dedup())
        .fingerprinter(prints)
        .logging(true)
        .dry_run(true)
        .build()
        .unwrap()
        .run()
        .unwrap();

    let keepers: BTreeSet<PathBuf> = report.groups.iter().map(|g| g.keeper().path.clone()).collect();
    assert_eq!(keepers.len(), 1);
    assert!(keepers.iter().next().unwrap().ends_with("big.jpg"));
    for op in &report.plan.operations {
        assert!(!keepers.contains(op.source()));
        if let Some(destination) = op.destination() {
            assert!(!keepers.contains(destination));
        }
    }
    assert_eq!(report.plan.len(), 2);
}

#[test]
fn lower_sensitivity_targets_a_superset() {
    let temp = assert_fs::TempDir::new().unwrap();
    let names = ["a.jpg", "b.jpg", "c.jpg", "d.jpg"];
    for name in names {
        temp.child(name).write_binary(name.as_bytes()).unwrap();
    }
    let prints = NamedFingerprints::new(&[
        ("a.jpg", 0b0000_0000),
        ("b.jpg", 0b0000_0001),
        ("c.jpg", 0b0000_0111),
        ("d.jpg", 0b1111_1111),
    ]);

    let grouped_at = |sensitivity: f64| -> BTreeSet<PathBuf> {
        builder(temp.path(), dedup())
            .fingerprinter(prints.clone())
            .sensitivity(sensitivity)
            .dry_run(true)
            .build()
            .unwrap()
            .run()
            .unwrap()
            .groups
            .into_iter()
            .flat_map(|g| g.members.into_iter().map(|m| m.path))
            .collect()
    };

    let mut previous = BTreeSet::new();
    for sensitivity in [1.0, 0.875, 0.75, 0.5, 0.0] {
        let current = grouped_at(sensitivity);
        assert!(previous.is_subset(&current), "sensitivity {}", sensitivity);
        previous = current;
    }
    assert_eq!(previous.len(), 4);
    assert_eq!(grouped_at(0.875).len(), 2);
    assert!(grouped_at(1.0).is_empty());
}

#[test]
fn safe_mode_never_deletes() {
    let temp = assert_fs::TempDir::new().unwrap();
    for name in ["a.jpg", "b.jpg", "nested/c.jpg"] {
        temp.child(name).write_binary(b"dup").unwrap();
    }

    let report = builder(temp.path(), dedup())
        .logging(true)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.plan.count_of(OperationKind::Delete), 0);
    assert_eq!(report.summary.committed, 2);
    temp.child("duplicates/b.jpg").assert("dup");
    temp.child("duplicates/c.jpg").assert("dup");
    temp.child("snaptidy_dedup_log.csv")
        .assert(predicate::str::contains("committed"));
}

#[test]
fn dedup_is_idempotent() {
    let temp = assert_fs::TempDir::new().unwrap();
    for name in ["a.jpg", "b.jpg", "sub/a.jpg"] {
        temp.child(name).write_binary(b"dup").unwrap();
    }
    temp.child("unique.jpg").write_binary(b"unique").unwrap();

    for logging in [false, true] {
        let run = || {
            builder(temp.path(), dedup())
                .logging(logging)
                .build()
                .unwrap()
                .run()
                .unwrap()
        };
        run();
        let second = run();
        assert!(second.plan.is_empty(), "logging = {}", logging);
    }
}

#[test]
fn organize_is_idempotent() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("holiday.jpg").write_binary(b"1").unwrap();
    temp.child("deep/birthday.jpg").write_binary(b"2").unwrap();
    temp.child("scan.jpg").write_binary(b"3").unwrap();
    let dates = NamedDates::new(&[
        ("holiday.jpg", (2019, 8, 1)),
        ("birthday.jpg", (2021, 2, 3)),
    ]);

    let run = || {
        builder(temp.path(), organize(DateLayout::Year, Some("unclassified")))
            .capture_dates(dates.clone())
            .logging(true)
            .build()
            .unwrap()
            .run()
            .unwrap()
    };

    let first = run();
    assert_eq!(first.plan.len(), 3);
    temp.child("2019/holiday.jpg").assert(predicate::path::exists());
    temp.child("2021/birthday.jpg").assert(predicate::path::exists());
    temp.child("unclassified/scan.jpg").assert(predicate::path::exists());

    let second = run();
    assert!(second.plan.is_empty());
}

#[test]
fn organize_ignores_the_name_of_the_root_itself() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("2020/holiday.jpg").write_binary(b"1").unwrap();
    temp.child("2020/2018/old.jpg").write_binary(b"2").unwrap();
    let root = temp.path().join("2020");
    let dates = NamedDates::new(&[("holiday.jpg", (2019, 8, 1)), ("old.jpg", (2021, 1, 1))]);

    let report = builder(&root, organize(DateLayout::Year, None))
        .capture_dates(dates)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.plan.len(), 1);
    temp.child("2020/2019/holiday.jpg").assert("1");
    temp.child("2020/2018/old.jpg").assert("2");
    temp.child("2020/holiday.jpg").assert(predicate::path::missing());
}

#[test]
fn log_sequences_continue_across_runs() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("a.jpg").write_binary(b"dup").unwrap();
    temp.child("b.jpg").write_binary(b"dup").unwrap();

    let run = || {
        builder(temp.path(), dedup())
            .logging(true)
            .build()
            .unwrap()
            .run()
            .unwrap()
    };
    let first = run();
    assert_eq!(first.plan.operations[0].sequence(), 1);

    temp.child("c.jpg").write_binary(b"dup").unwrap();
    let second = run();
    assert_eq!(second.plan.operations[0].sequence(), 2);
}

#[test]
fn dry_run_reports_without_touching_anything() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("a/one.jpg").write_binary(b"1").unwrap();
    temp.child("b/two.jpg").write_binary(b"2").unwrap();
    let before = common::tree(temp.path());

    let mode = PlanMode::Flatten {
        transfer: Transfer::Move,
        output: None,
    };
    let report = builder(temp.path(), mode)
        .dry_run(true)
        .logging(true)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.plan.len(), 2);
    assert!(report.summary.dry_run);
    assert_eq!(report.summary.committed, 0);
    assert_eq!(common::tree(temp.path()), before);
    temp.child("snaptidy_flatten_log.csv")
        .assert(predicate::path::missing());
    assert_eq!(targeted(&report).len(), 2);
}
