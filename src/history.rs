use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::error::Result;

const MDC_HEADER: &str = "---\nalwaysApply: true\n---\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub command: String,
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn now(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

pub fn json_history_path(root: &Path) -> PathBuf {
    root.join("config").join("dev-history.json")
}

pub fn mdc_history_path(root: &Path) -> PathBuf {
    root.join(".cursor").join("rules").join("dev-history.mdc")
}

/// Serializes with four-space indentation.
pub fn to_json_pretty<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Reads the recorded history. A missing, unreadable or corrupt file yields
/// an empty history.
pub fn load_history(path: &Path) -> Vec<HistoryEntry> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), "discarding unreadable history: {e}");
        Vec::new()
    })
}

/// Records `command` in the JSON history and the `.mdc` rules file.
pub fn log_command_history(root: &Path, command: &str) -> Result<HistoryEntry> {
    let entry = HistoryEntry::now(command);
    let json_path = json_history_path(root);
    let mdc_path = mdc_history_path(root);

    for path in [&json_path, &mdc_path] {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut history = load_history(&json_path);
    history.push(entry.clone());
    fs::write(&json_path, to_json_pretty(&history)?)?;

    if !mdc_path.exists() {
        fs::write(&mdc_path, MDC_HEADER)?;
    }
    let mut mdc = OpenOptions::new().append(true).open(&mdc_path)?;
    write!(mdc, "```json\n{}\n```\n\n", to_json_pretty(&entry)?)?;

    tracing::debug!(command, "recorded command history");
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn appends_to_both_logs() {
        let dir = TempDir::new().unwrap();

        log_command_history(dir.path(), "devmgr clean").unwrap();
        log_command_history(dir.path(), "devmgr build").unwrap();

        let history = load_history(&json_history_path(dir.path()));
        let commands: Vec<_> = history.iter().map(|e| e.command.as_str()).collect();
        assert_eq!(commands, vec!["devmgr clean", "devmgr build"]);

        let mdc = fs::read_to_string(mdc_history_path(dir.path())).unwrap();
        assert!(mdc.starts_with(MDC_HEADER));
        assert_eq!(mdc.matches(MDC_HEADER).count(), 1);
        assert_eq!(mdc.matches("```json").count(), 2);
        assert!(mdc.contains("\"command\": \"devmgr build\""));
    }

    #[test]
    fn corrupt_history_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let json_path = json_history_path(dir.path());
        fs::create_dir_all(json_path.parent().unwrap()).unwrap();
        fs::write(&json_path, "{ not an array").unwrap();

        log_command_history(dir.path(), "devmgr tree").unwrap();

        let history = load_history(&json_path);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].command, "devmgr tree");
    }

    #[test]
    fn pretty_json_uses_four_spaces() {
        let entry = HistoryEntry {
            command: "x".to_string(),
            timestamp: "t".to_string(),
        };
        let json = to_json_pretty(&entry).unwrap();
        assert!(json.contains("\n    \"command\": \"x\""));
    }
}
