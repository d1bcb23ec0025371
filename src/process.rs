use colored::*;
use std::{
    io::{self, Write},
    process::{Command, Stdio},
    thread,
    time::Duration,
};
use wait_timeout::ChildExt;

use crate::config::{Config, PlatformCommands, TauriConfig};
use crate::ui::pad_line;

/// Terminates running processes by name.
pub trait ProcessStopper {
    fn stop_processes_by_name(&self, names: &[String]);
}

/// Names of the dev-server processes that may still hold project files open.
pub fn lingering_processes(
    config: &Config,
    tauri: &TauriConfig,
    platform: &PlatformCommands,
) -> Vec<String> {
    config
        .dev_processes
        .iter()
        .chain(std::iter::once(&tauri.app_name))
        .map(|name| format!("{}{}", name, platform.executable_ext))
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
enum StopResult {
    Stopped,
    Unexpected(Option<i32>),
    TimedOut,
    ToolMissing,
}

/// Stops processes with the platform kill command (`pkill -f` or `taskkill`).
#[derive(Debug, Clone)]
pub struct SystemProcessStopper {
    pub platform: PlatformCommands,
    pub timeout: Duration,
    pub settle_delay: Duration,
    pub output: bool,
}

impl SystemProcessStopper {
    pub fn from_config(config: &Config, output: bool) -> Self {
        Self {
            platform: PlatformCommands::current(),
            timeout: config.kill_timeout(),
            settle_delay: config.settle_delay(),
            output,
        }
    }

    fn kill_one(&self, name: &str) -> StopResult {
        // pkill matches a pattern, so the executable extension is dropped there
        let target = if cfg!(windows) {
            name.to_string()
        } else {
            name.strip_suffix(self.platform.executable_ext)
                .unwrap_or(name)
                .to_string()
        };

        let spawned = Command::new(self.platform.kill_cmd)
            .args(self.platform.kill_args)
            .arg(&target)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return StopResult::ToolMissing,
            Err(e) => {
                tracing::warn!("failed to spawn {}: {e}", self.platform.kill_cmd);
                return StopResult::Unexpected(None);
            }
        };

        match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => match status.code() {
                Some(code) if self.platform.kill_success_codes.contains(&code) => {
                    StopResult::Stopped
                }
                code => StopResult::Unexpected(code),
            },
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                StopResult::TimedOut
            }
            Err(e) => {
                tracing::warn!("waiting on {} failed: {e}", self.platform.kill_cmd);
                StopResult::Unexpected(None)
            }
        }
    }
}

impl ProcessStopper for SystemProcessStopper {
    fn stop_processes_by_name(&self, names: &[String]) {
        if self.output {
            println!("{}", "Stopping any running development servers...".cyan());
        }

        for name in names {
            if self.output {
                print!("{}", format!("Attempting to stop process: {}...", name).dimmed());
                let _ = io::stdout().flush();
            }

            let result = self.kill_one(name);
            tracing::debug!(process = %name, ?result, "stop attempt");

            if self.output {
                let line = match &result {
                    StopResult::Stopped => {
                        format!("Stopped (or wasn't running): {}", name).green()
                    }
                    StopResult::Unexpected(code) => format!(
                        "Could not stop {}. Return code: {}",
                        name,
                        code.map_or_else(|| "none".to_string(), |c| c.to_string())
                    )
                    .yellow(),
                    StopResult::TimedOut => format!(
                        "Timeout trying to stop {}. It might be a zombie process.",
                        name
                    )
                    .red(),
                    StopResult::ToolMissing => format!(
                        "Process management tool '{}' not found.",
                        self.platform.kill_cmd
                    )
                    .yellow(),
                };
                println!("\r{}", pad_line(&line.to_string()));
            }

            if result == StopResult::ToolMissing {
                break;
            }
        }

        if self.output {
            println!("{}", "Waiting for processes to terminate fully...".cyan());
        }
        thread::sleep(self.settle_delay);
    }
}
