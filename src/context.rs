use std::{fs, path::PathBuf};

use crate::config::{Config, PlatformCommands};
use crate::error::{MgrError, Result};

/// Resolves the project root to an absolute path. The root must be an
/// existing directory; nothing is created for a mistyped path.
pub fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    match fs::canonicalize(&root) {
        Ok(resolved) if resolved.is_dir() => Ok(resolved),
        _ => Err(MgrError::InvalidRoot { path: root }),
    }
}

/// Everything a command needs to know about the current invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub root: PathBuf,
    pub config: Config,
    pub platform: PlatformCommands,
    /// Print progress to the console.
    pub output: bool,
    /// Skip confirmation prompts.
    pub force: bool,
}

impl Context {
    pub fn new(root: PathBuf, config: Config, output: bool, force: bool) -> Self {
        Self {
            root,
            config,
            platform: PlatformCommands::current(),
            output,
            force,
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.config.log_path(&self.root)
    }
}
