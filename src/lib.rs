//! devmgr - development workflow manager for desktop app projects
//!
//! Cleans build artifacts, stops stray dev servers, installs dependencies,
//! builds production binaries and launches the dev server.

pub mod build;
pub mod clean;
pub mod config;
pub mod context;
pub mod dev;
pub mod error;
pub mod history;
pub mod install;
pub mod process;
pub mod prompt;
pub mod run;
pub mod tree;
pub mod ui;

// Re-export commonly used types
pub use clean::{CleanOutcome, Cleaner, ExecutionReport, RemovalCandidate, RemovalPlan};
pub use config::{Config, ExclusionSet};
pub use context::Context;
pub use error::{CleanError, MgrError};
