// Integration tests for the cleaner: planning, execution and the full flow

use devmgr::clean::{
    CleanOutcome, Cleaner, ExecutionReport, RemovalCandidate, RemovalPlan, clean_project,
};
use devmgr::config::{Config, ExclusionSet};
use devmgr::context::Context;
use devmgr::error::CleanError;
use devmgr::process::ProcessStopper;
use std::cell::RefCell;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn exclusions() -> ExclusionSet {
    ExclusionSet::new([
        "node_modules",
        "dist",
        "target",
        "build.log",
        "a.lock",
        "b.lock",
        "Cargo.lock",
    ])
}

fn cleaner(root: &Path) -> Cleaner {
    Cleaner::new(
        exclusions(),
        root.join("config").join("build.log"),
        Duration::ZERO,
        false,
    )
}

fn write_bytes(path: &Path, len: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![b'x'; len]).unwrap();
}

fn plan_paths(plan: &RemovalPlan) -> Vec<PathBuf> {
    plan.items().iter().map(|c| c.path().to_path_buf()).collect()
}

#[derive(Default)]
struct RecordingStopper {
    calls: RefCell<Vec<Vec<String>>>,
}

impl ProcessStopper for RecordingStopper {
    fn stop_processes_by_name(&self, names: &[String]) {
        self.calls.borrow_mut().push(names.to_vec());
    }
}

fn context(root: &Path, force: bool) -> Context {
    let config = Config {
        clean_exclude: vec!["dist".to_string(), "node_modules".to_string()],
        retry_delay_ms: 0,
        settle_delay_ms: 0,
        ..Config::default()
    };
    Context::new(root.to_path_buf(), config, false, force)
}

// ============================================================================
// Planning
// ============================================================================

#[test]
fn excluded_directory_is_pruned() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    for i in 0..500 {
        write_bytes(&root.join("dist").join(format!("chunk-{i}.js")), 4);
    }
    // excluded names inside a pruned subtree must not show up either
    write_bytes(&root.join("dist/nested/a.lock"), 4);

    let plan = cleaner(root).plan(root).unwrap();

    assert_eq!(
        plan.items(),
        &[RemovalCandidate::Directory {
            path: root.join("dist")
        }]
    );
}

#[test]
fn files_are_ordered_smallest_first() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_bytes(&root.join("b.lock"), 1000);
    write_bytes(&root.join("a.lock"), 10);

    let plan = cleaner(root).plan(root).unwrap();

    assert_eq!(plan_paths(&plan), vec![root.join("a.lock"), root.join("b.lock")]);
}

#[test]
fn files_come_before_directories_and_match_at_any_depth() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_bytes(&root.join("node_modules/pkg/index.js"), 10);
    write_bytes(&root.join("src-tauri/Cargo.lock"), 500);
    write_bytes(&root.join("src-tauri/target/debug/app"), 10_000);
    write_bytes(&root.join("packages/ui/a.lock"), 3);
    write_bytes(&root.join("src/main.rs"), 100);

    let plan = cleaner(root).plan(root).unwrap();
    let items = plan.items();

    assert_eq!(items.len(), 4);
    assert_eq!(items[0].path(), root.join("packages/ui/a.lock"));
    assert_eq!(items[1].path(), root.join("src-tauri/Cargo.lock"));
    assert!(items[2..].iter().all(|c| c.is_dir()));

    let sizes: Vec<u64> = items
        .iter()
        .filter_map(|c| match c {
            RemovalCandidate::File { size, .. } => Some(*size),
            RemovalCandidate::Directory { .. } => None,
        })
        .collect();
    assert!(sizes.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn no_candidate_descends_from_another() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_bytes(&root.join("target/node_modules/dist/Cargo.lock"), 1);
    write_bytes(&root.join("app/node_modules/target/a.lock"), 1);
    write_bytes(&root.join("app/dist/build.log"), 1);
    write_bytes(&root.join("app/b.lock"), 1);

    let paths = plan_paths(&cleaner(root).plan(root).unwrap());

    for a in &paths {
        for b in &paths {
            assert!(a == b || !a.starts_with(b), "{a:?} is inside {b:?}");
        }
    }
    assert_eq!(paths.len(), 4);
}

#[test]
fn unreadable_root_is_a_planning_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist");

    let err = cleaner(dir.path()).plan(&missing).unwrap_err();

    assert!(matches!(err, CleanError::Planning { .. }));
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn execute_removes_everything_and_logs_attempts() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_bytes(&root.join("a.lock"), 10);
    write_bytes(&root.join("node_modules/pkg/index.js"), 10);

    let cleaner = cleaner(root);
    let plan = cleaner.plan(root).unwrap();
    let report = cleaner.execute(&plan).unwrap();

    assert_eq!(report.removed.len(), 2);
    assert!(report.skipped.is_empty());
    assert!(report.is_success());
    assert!(!root.join("a.lock").exists());
    assert!(!root.join("node_modules").exists());

    let log = fs::read_to_string(cleaner.log_path()).unwrap();
    assert!(log.contains("--- Starting Clean Operation at "));
    assert!(log.contains(&format!("Attempting to remove: {}", root.join("a.lock").display())));
    assert!(log.contains(&format!(
        "Successfully removed: {}",
        root.join("node_modules").display()
    )));
}

#[test]
fn replanning_after_execute_finds_nothing() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_bytes(&root.join("a.lock"), 10);
    write_bytes(&root.join("web/dist/index.html"), 10);
    write_bytes(&root.join("web/src/app.ts"), 10);

    let cleaner = cleaner(root);
    let report = cleaner.execute(&cleaner.plan(root).unwrap()).unwrap();
    assert_eq!(report.removed.len(), 2);

    // only the log written by the first run is left to clean
    let replanned = plan_paths(&cleaner.plan(root).unwrap());
    assert_eq!(replanned, vec![cleaner.log_path().to_path_buf()]);
    assert!(root.join("web/src/app.ts").exists());
}

#[test]
fn empty_plan_only_writes_session_header() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_bytes(&root.join("src/main.rs"), 10);

    let cleaner = cleaner(root);
    let plan = cleaner.plan(root).unwrap();
    assert!(plan.is_empty());

    let report = cleaner.execute(&plan).unwrap();

    assert_eq!(report, ExecutionReport::default());
    assert!(root.join("src/main.rs").exists());
    let log = fs::read_to_string(cleaner.log_path()).unwrap();
    assert_eq!(log.matches("--- Starting Clean Operation at ").count(), 1);
    assert!(!log.contains("Attempting to remove"));
}

#[test]
fn vanished_items_are_skipped() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_bytes(&root.join("a.lock"), 10);
    write_bytes(&root.join("b.lock"), 20);

    let cleaner = cleaner(root);
    let plan = cleaner.plan(root).unwrap();
    fs::remove_file(root.join("a.lock")).unwrap();

    let report = cleaner.execute(&plan).unwrap();

    assert_eq!(report.skipped, vec![root.join("a.lock")]);
    assert_eq!(report.removed, vec![root.join("b.lock")]);
    assert!(report.failed.is_empty());
}

#[test]
fn log_file_is_removed_last() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let cleaner = cleaner(root);
    write_bytes(cleaner.log_path(), 5);
    write_bytes(&root.join("a.lock"), 100);
    write_bytes(&root.join("dist/app.js"), 10);

    let plan = cleaner.plan(root).unwrap();
    assert!(plan_paths(&plan).contains(&cleaner.log_path().to_path_buf()));

    let report = cleaner.execute(&plan).unwrap();

    assert!(report.is_success());
    assert_eq!(report.removed.len(), 3);
    assert_eq!(report.removed.last().unwrap(), cleaner.log_path());
    assert!(!cleaner.log_path().exists());
    assert!(!root.join("dist").exists());
}

#[test]
fn stuck_item_fails_without_stopping_the_plan() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    // a directory posing as a file candidate can never be unlinked
    let stuck = root.join("stuck.lock");
    write_bytes(&stuck.join("inner"), 1);
    write_bytes(&root.join("a.lock"), 10);
    write_bytes(&root.join("dist/app.js"), 10);

    let plan = RemovalPlan::new(vec![
        RemovalCandidate::File {
            path: stuck.clone(),
            size: 1,
        },
        RemovalCandidate::File {
            path: root.join("a.lock"),
            size: 10,
        },
        RemovalCandidate::Directory {
            path: root.join("dist"),
        },
    ]);

    let cleaner = cleaner(root);
    let report = cleaner.execute(&plan).unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, stuck);
    assert!(!report.failed[0].error.is_empty());
    assert_eq!(report.removed, vec![root.join("a.lock"), root.join("dist")]);

    let log = fs::read_to_string(cleaner.log_path()).unwrap();
    let prefix = format!("Failed attempt to remove {}:", stuck.display());
    assert_eq!(log.matches(&prefix).count(), 3);
}

#[test]
fn unopenable_log_is_fatal_and_deletes_nothing() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_bytes(&root.join("a.lock"), 10);
    // the log's parent is a regular file, so the log cannot be created
    write_bytes(&root.join("blocker"), 1);

    let cleaner = Cleaner::new(
        exclusions(),
        root.join("blocker").join("build.log"),
        Duration::ZERO,
        false,
    );
    let plan = cleaner.plan(root).unwrap();
    let err = cleaner.execute(&plan).unwrap_err();

    assert!(matches!(err, CleanError::LogOpen { .. }));
    assert!(root.join("a.lock").exists());
}

#[cfg(unix)]
#[test]
fn unreadable_size_is_planned_as_zero_and_removed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let dangling = root.join("a.lock");
    std::os::unix::fs::symlink(root.join("gone-target"), &dangling).unwrap();
    write_bytes(&root.join("b.lock"), 1);

    let cleaner = cleaner(root);
    let plan = cleaner.plan(root).unwrap();

    assert_eq!(
        plan.items()[0],
        RemovalCandidate::File {
            path: dangling.clone(),
            size: 0
        }
    );

    let report = cleaner.execute(&plan).unwrap();

    assert!(report.removed.contains(&dangling));
    assert!(fs::symlink_metadata(&dangling).is_err());
}

// ============================================================================
// Full flow
// ============================================================================

#[test]
fn declining_cancels_without_side_effects() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_bytes(&root.join("dist/app.js"), 10);

    let ctx = context(root, false);
    let stopper = RecordingStopper::default();
    let mut input = Cursor::new(b"n\n".to_vec());
    let mut out = Vec::new();

    let outcome = clean_project(&ctx, &stopper, &mut input, &mut out).unwrap();

    assert_eq!(outcome, CleanOutcome::Cancelled);
    assert!(root.join("dist/app.js").exists());
    assert!(!ctx.log_path().exists());
    assert_eq!(stopper.calls.borrow().len(), 1);
}

#[test]
fn force_skips_the_prompt() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_bytes(&root.join("dist/app.js"), 10);
    write_bytes(&root.join("node_modules/x/index.js"), 10);

    let ctx = context(root, true);
    let stopper = RecordingStopper::default();
    let mut input = Cursor::new(Vec::new());
    let mut out = Vec::new();

    let outcome = clean_project(&ctx, &stopper, &mut input, &mut out).unwrap();

    match outcome {
        CleanOutcome::Completed(report) => assert_eq!(report.removed.len(), 2),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(out.is_empty());
    assert!(!root.join("dist").exists());

    let calls = stopper.calls.borrow();
    assert!(calls[0].iter().any(|name| name.starts_with("vite")));
    assert!(calls[0].iter().any(|name| name.starts_with("tauri-app")));
}

#[test]
fn clean_project_reports_already_clean() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_bytes(&root.join("src/main.rs"), 10);

    let ctx = context(root, false);
    let stopper = RecordingStopper::default();
    let mut input = Cursor::new(Vec::new());
    let mut out = Vec::new();

    let outcome = clean_project(&ctx, &stopper, &mut input, &mut out).unwrap();

    assert_eq!(outcome, CleanOutcome::AlreadyClean);
    let log = fs::read_to_string(ctx.log_path()).unwrap();
    assert!(log.contains("--- Starting Clean Operation at "));
}

#[test]
fn clean_project_removes_matched_log_last() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let mut ctx = context(root, true);
    ctx.config.clean_exclude.push("build.log".to_string());
    write_bytes(&ctx.log_path(), 64);
    write_bytes(&root.join("dist/app.js"), 10);
    write_bytes(&root.join("node_modules/x/index.js"), 10);

    let stopper = RecordingStopper::default();
    let mut input = Cursor::new(Vec::new());
    let mut out = Vec::new();

    let outcome = clean_project(&ctx, &stopper, &mut input, &mut out).unwrap();

    let report = match outcome {
        CleanOutcome::Completed(report) => report,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert!(report.is_success());
    assert_eq!(report.removed.len(), 3);
    assert_eq!(report.removed.last().unwrap(), &ctx.log_path());
    assert!(!ctx.log_path().exists());
    assert!(!root.join("dist").exists());
}
