use std::{io, path::PathBuf};

use thiserror::Error;

/// Fatal errors of a clean run. Per-item removal failures are reported in
/// the execution report instead.
#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Cannot read project root {}: {source}", .path.display())]
    Planning {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot open log file {} for append: {source}", .path.display())]
    LogOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum MgrError {
    #[error(transparent)]
    Clean(#[from] CleanError),

    #[error("Command '{program}' not found. Is it in your PATH?")]
    CommandNotFound { program: String },

    #[error("Error running command: {command}. Return code: {}. Check '{}' for the complete log.", .code.map_or_else(|| "none".to_string(), |c| c.to_string()), .log.display())]
    CommandFailed {
        command: String,
        code: Option<i32>,
        log: PathBuf,
    },

    #[error("Project root {} is not a directory", .path.display())]
    InvalidRoot { path: PathBuf },

    #[error("{failed} item(s) could not be removed")]
    CleanIncomplete { failed: usize },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MgrError>;
