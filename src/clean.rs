//! Build-artifact cleaner.
//!
//! A clean run is three strictly sequential steps: [`Cleaner::plan`] walks the
//! project and collects every entry whose name is in the exclusion set,
//! [`confirm`] asks the user unless forced, and [`Cleaner::execute`] removes
//! the planned entries with bounded retries while appending to the build log.

use chrono::Local;
use colored::*;
use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};
use walkdir::WalkDir;

use crate::config::ExclusionSet;
use crate::context::Context;
use crate::dev::stop_dev_servers;
use crate::error::CleanError;
use crate::process::ProcessStopper;
use crate::prompt::confirm_action;
use crate::ui::pad_line;

/// Removal attempts per candidate before it is reported as failed.
pub const MAX_ATTEMPTS: u32 = 3;

/// Plan entries listed before the confirmation prompt.
pub const PREVIEW_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalCandidate {
    File { path: PathBuf, size: u64 },
    Directory { path: PathBuf },
}

impl RemovalCandidate {
    pub fn path(&self) -> &Path {
        match self {
            RemovalCandidate::File { path, .. } | RemovalCandidate::Directory { path } => path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, RemovalCandidate::Directory { .. })
    }

    fn remove(&self) -> io::Result<()> {
        match self {
            RemovalCandidate::File { path, .. } => fs::remove_file(path),
            RemovalCandidate::Directory { path } => fs::remove_dir_all(path),
        }
    }
}

/// Files smallest-first, then directories in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalPlan {
    items: Vec<RemovalCandidate>,
}

impl RemovalPlan {
    /// Orders the candidates: all files first, sorted ascending by size
    /// (stable, so equal sizes keep discovery order), then the directories.
    pub fn new(candidates: Vec<RemovalCandidate>) -> Self {
        let (mut files, dirs): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|c| !c.is_dir());
        files.sort_by_key(|c| match c {
            RemovalCandidate::File { size, .. } => *size,
            RemovalCandidate::Directory { .. } => 0,
        });
        files.extend(dirs);
        Self { items: files }
    }

    pub fn items(&self) -> &[RemovalCandidate] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRemoval {
    pub path: PathBuf,
    /// Error of the last attempt.
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub removed: Vec<PathBuf>,
    /// Entries that were already gone when their turn came.
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<FailedRemoval>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanOutcome {
    /// Nothing matched the exclusion set.
    AlreadyClean,
    /// The user declined the confirmation prompt; nothing was touched.
    Cancelled,
    Completed(ExecutionReport),
}

/// Append-only audit log, flushed after every line.
struct CleanLog {
    file: File,
}

impl CleanLog {
    fn open(path: &Path) -> Result<Self, CleanError> {
        let open = || -> io::Result<File> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            OpenOptions::new().create(true).append(true).open(path)
        };
        let file = open().map_err(|source| CleanError::LogOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { file })
    }

    fn line(&mut self, text: &str) {
        let written = writeln!(self.file, "{}", text).and_then(|_| self.file.flush());
        if let Err(e) = written {
            tracing::warn!("failed to write clean log: {e}");
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cleaner {
    exclusions: ExclusionSet,
    log_path: PathBuf,
    retry_delay: Duration,
    output: bool,
}

impl Cleaner {
    pub fn new(
        exclusions: ExclusionSet,
        log_path: PathBuf,
        retry_delay: Duration,
        output: bool,
    ) -> Self {
        Self {
            exclusions,
            log_path,
            retry_delay,
            output,
        }
    }

    pub fn from_context(ctx: &Context) -> Self {
        Self::new(
            ctx.config.exclusion_set(),
            ctx.log_path(),
            ctx.config.retry_delay(),
            ctx.output,
        )
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Walks `root` top-down. Excluded directories are recorded and never
    /// descended into; excluded files are recorded with their size (0 when
    /// it cannot be read).
    pub fn plan(&self, root: &Path) -> Result<RemovalPlan, CleanError> {
        fs::read_dir(root).map_err(|source| CleanError::Planning {
            path: root.to_path_buf(),
            source,
        })?;

        let mut candidates = Vec::new();
        let mut walker = WalkDir::new(root).min_depth(1).into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {e}");
                    continue;
                }
            };

            if !self.exclusions.contains(entry.file_name()) {
                continue;
            }

            let path = entry.path().to_path_buf();
            if entry.file_type().is_dir() {
                tracing::debug!(path = %path.display(), "pruning excluded directory");
                candidates.push(RemovalCandidate::Directory { path });
                walker.skip_current_dir();
            } else {
                // symlinks land here too and are unlinked, never followed;
                // the size is the target's, 0 when it cannot be read
                let size = fs::metadata(entry.path()).map(|m| m.len()).unwrap_or(0);
                candidates.push(RemovalCandidate::File { path, size });
            }
        }

        let plan = RemovalPlan::new(candidates);
        tracing::debug!(items = plan.len(), "clean plan ready");
        Ok(plan)
    }

    /// Removes every planned entry, logging each attempt. The log file is
    /// removed last, after it has been closed, when it is itself planned.
    pub fn execute(&self, plan: &RemovalPlan) -> Result<ExecutionReport, CleanError> {
        let log_identity = fs::canonicalize(&self.log_path).ok();
        let is_log = |candidate: &RemovalCandidate| {
            !candidate.is_dir()
                && (candidate.path() == self.log_path
                    || log_identity.as_ref().is_some_and(|log| {
                        fs::canonicalize(candidate.path()).is_ok_and(|p| &p == log)
                    }))
        };

        let (deferred, planned): (Vec<&RemovalCandidate>, Vec<&RemovalCandidate>) =
            plan.items().iter().partition(|c| is_log(*c));
        let mut report = ExecutionReport::default();
        let mut log = CleanLog::open(&self.log_path)?;

        log.line(&format!(
            "\n--- Starting Clean Operation at {} ---",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        for candidate in planned {
            self.remove_with_retries(candidate, &mut log, &mut report);
        }

        drop(log);

        for candidate in deferred {
            self.remove_log_file(candidate, &mut report);
        }

        tracing::debug!(
            removed = report.removed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "clean finished"
        );
        Ok(report)
    }

    fn remove_with_retries(
        &self,
        candidate: &RemovalCandidate,
        log: &mut CleanLog,
        report: &mut ExecutionReport,
    ) {
        let path = candidate.path();
        if fs::symlink_metadata(path).is_err() {
            report.skipped.push(path.to_path_buf());
            return;
        }

        log.line(&format!("Attempting to remove: {}", path.display()));
        if self.output {
            print!(
                "{}",
                format!("Attempting to remove: {}...", path.display()).dimmed()
            );
            let _ = io::stdout().flush();
        }

        for attempt in 1..=MAX_ATTEMPTS {
            match candidate.remove() {
                Ok(()) => {
                    log.line(&format!("Successfully removed: {}", path.display()));
                    if self.output {
                        let msg = format!("Successfully removed: {}", path.display());
                        println!("\r{}", pad_line(&msg).green());
                    }
                    report.removed.push(path.to_path_buf());
                    return;
                }
                Err(e) => {
                    log.line(&format!("Failed attempt to remove {}: {}", path.display(), e));
                    tracing::debug!(path = %path.display(), attempt, "removal failed: {e}");

                    if attempt < MAX_ATTEMPTS {
                        if self.output {
                            let msg =
                                format!("Could not remove {}, retrying... ({})", path.display(), e);
                            println!("\r{}", pad_line(&msg).yellow());
                        }
                        thread::sleep(self.retry_delay);
                    } else {
                        if self.output {
                            let msg = format!("Failed to remove {}: {}", path.display(), e);
                            println!("\r{}", pad_line(&msg).red());
                        }
                        report.failed.push(FailedRemoval {
                            path: path.to_path_buf(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    fn remove_log_file(&self, candidate: &RemovalCandidate, report: &mut ExecutionReport) {
        let path = candidate.path();
        if fs::symlink_metadata(path).is_err() {
            report.skipped.push(path.to_path_buf());
            return;
        }

        if self.output {
            print!(
                "{}",
                format!("Attempting to remove log file: {}...", path.display()).dimmed()
            );
            let _ = io::stdout().flush();
        }

        match fs::remove_file(path) {
            Ok(()) => {
                if self.output {
                    let msg = format!("Successfully removed log file: {}", path.display());
                    println!("\r{}", pad_line(&msg).green());
                }
                report.removed.push(path.to_path_buf());
            }
            Err(e) => {
                if self.output {
                    let msg = format!("Failed to remove log file {}: {}", path.display(), e);
                    println!("\r{}", pad_line(&msg).red());
                }
                report.failed.push(FailedRemoval {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Lists up to [`PREVIEW_LIMIT`] planned entries and asks for confirmation.
/// Defaults to "no".
pub fn confirm<R, W>(plan: &RemovalPlan, input: &mut R, out: &mut W) -> bool
where
    R: BufRead,
    W: Write,
{
    let _ = writeln!(
        out,
        "{}",
        "The following items will be removed (files first, then folders):".yellow()
    );
    for item in plan.items().iter().take(PREVIEW_LIMIT) {
        let _ = writeln!(out, "  - {}", item.path().display());
    }
    if plan.len() > PREVIEW_LIMIT {
        let _ = writeln!(out, "  ... and {} more items", plan.len() - PREVIEW_LIMIT);
    }

    confirm_action(
        "Are you sure you want to delete these items?",
        false,
        input,
        out,
    )
}

/// Full clean flow: stop dev processes, plan, confirm unless forced, execute.
pub fn clean_project<R, W>(
    ctx: &Context,
    stopper: &dyn ProcessStopper,
    input: &mut R,
    out: &mut W,
) -> Result<CleanOutcome, CleanError>
where
    R: BufRead,
    W: Write,
{
    if ctx.output {
        let _ = writeln!(out, "{}", "Preparing to clean project...".cyan());
    }

    stop_dev_servers(ctx, stopper);

    let cleaner = Cleaner::from_context(ctx);
    let plan = cleaner.plan(&ctx.root)?;

    if plan.is_empty() {
        // still records the session in the log
        cleaner.execute(&plan)?;
        if ctx.output {
            let _ = writeln!(
                out,
                "{}",
                "Project is already clean. No items to remove.".green()
            );
        }
        return Ok(CleanOutcome::AlreadyClean);
    }

    if !ctx.force && !confirm(&plan, input, out) {
        if ctx.output {
            let _ = writeln!(out, "{}", "Clean operation cancelled.".yellow());
        }
        return Ok(CleanOutcome::Cancelled);
    }

    let report = cleaner.execute(&plan)?;

    if ctx.output {
        let summary = format!(
            "Clean finished: {} removed, {} already gone, {} failed",
            report.removed.len(),
            report.skipped.len(),
            report.failed.len()
        );
        if report.is_success() {
            let _ = writeln!(out, "{} {}", "🧹".green(), summary.green());
        } else {
            let _ = writeln!(out, "{} {}", "⚠️".yellow(), summary.yellow());
            for failure in &report.failed {
                let _ = writeln!(
                    out,
                    "  {} {}: {}",
                    "✗".red(),
                    failure.path.display(),
                    failure.error
                );
            }
        }
    }

    Ok(CleanOutcome::Completed(report))
}
