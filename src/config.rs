use colored::*;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const CONFIG_FILE: &str = "devmgr.toml";
pub const TAURI_CONFIG_FILE: &str = "tauri.conf.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_clean_exclude")]
    pub clean_exclude: Vec<String>,
    #[serde(default = "default_tree_exclude")]
    pub tree_exclude: Vec<String>,
    #[serde(default = "default_dev_processes")]
    pub dev_processes: Vec<String>,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_kill_timeout_secs")]
    pub kill_timeout_secs: u64,
    #[serde(default = "default_history")]
    pub history: bool,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("config/build.log")
}

fn default_clean_exclude() -> Vec<String> {
    [
        // tool output
        "build.log",
        ".vscode",
        "dox",
        // python
        "__pycache__",
        "venv",
        // javascript
        ".svelte-kit",
        "dist",
        "node_modules",
        "package-lock.json",
        "build",
        // rust
        "target",
        "Cargo.lock",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_tree_exclude() -> Vec<String> {
    vec![".git".to_string()]
}

fn default_dev_processes() -> Vec<String> {
    vec!["cargo".to_string(), "vite".to_string(), "node".to_string()]
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_settle_delay_ms() -> u64 {
    3000
}

fn default_kill_timeout_secs() -> u64 {
    5
}

fn default_history() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            clean_exclude: default_clean_exclude(),
            tree_exclude: default_tree_exclude(),
            dev_processes: default_dev_processes(),
            retry_delay_ms: default_retry_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            kill_timeout_secs: default_kill_timeout_secs(),
            history: default_history(),
        }
    }
}

impl Config {
    /// Loads `devmgr.toml` from the project root, falling back to defaults
    /// when the file is absent or broken.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if config_path.exists() {
            match fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => {
                        return config;
                    }
                    Err(e) => {
                        eprintln!("{} Failed to parse {}: {}", "⚠️".yellow(), CONFIG_FILE, e);
                        eprintln!("   Using default configuration");
                    }
                },
                Err(e) => {
                    eprintln!("{} Failed to read {}: {}", "⚠️".yellow(), CONFIG_FILE, e);
                    eprintln!("   Using default configuration");
                }
            }
        }

        Config::default()
    }

    /// Absolute location of the build log for a given project root.
    pub fn log_path(&self, root: &Path) -> PathBuf {
        if self.log_file.is_absolute() {
            self.log_file.clone()
        } else {
            root.join(&self.log_file)
        }
    }

    pub fn exclusion_set(&self) -> ExclusionSet {
        ExclusionSet::new(self.clean_exclude.iter().cloned())
    }

    /// Names hidden from the tree view: everything cleanable plus the extras.
    pub fn tree_exclusion_set(&self) -> ExclusionSet {
        ExclusionSet::new(
            self.clean_exclude
                .iter()
                .chain(self.tree_exclude.iter())
                .cloned(),
        )
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn kill_timeout(&self) -> Duration {
        Duration::from_secs(self.kill_timeout_secs)
    }
}

/// Literal file and directory names treated as disposable artifacts.
///
/// Matching is by entry name only, never by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    names: BTreeSet<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &OsStr) -> bool {
        name.to_str().is_some_and(|n| self.names.contains(n))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

// ============================================================================
// tauri.conf.json
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TauriConfig {
    pub product_name: String,
    pub app_name: String,
    pub identifier: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawTauriConfig {
    #[serde(default)]
    package: RawPackage,
    #[serde(default)]
    tauri: RawTauri,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPackage {
    product_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTauri {
    #[serde(default)]
    bundle: RawBundle,
}

#[derive(Debug, Default, Deserialize)]
struct RawBundle {
    identifier: Option<String>,
}

impl Default for TauriConfig {
    fn default() -> Self {
        Self {
            product_name: "Tauri App".to_string(),
            app_name: "tauri-app".to_string(),
            identifier: "com.example.app".to_string(),
        }
    }
}

impl TauriConfig {
    /// Reads `tauri.conf.json`, warning and falling back to defaults if it
    /// cannot be read or parsed.
    pub fn load(root: &Path) -> Self {
        let path = root.join(TAURI_CONFIG_FILE);
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| Self::parse(&content).map_err(|e| e.to_string()));

        match parsed {
            Ok(config) => config,
            Err(e) => {
                println!(
                    "{}",
                    format!(
                        "Warning: Could not read {} ({}). Using defaults.",
                        TAURI_CONFIG_FILE, e
                    )
                    .yellow()
                );
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let raw: RawTauriConfig = serde_json::from_str(content)?;
        let defaults = Self::default();

        let product_name = raw.package.product_name.unwrap_or(defaults.product_name);
        let app_name = product_name.to_lowercase().replace(' ', "-");
        let identifier = raw.tauri.bundle.identifier.unwrap_or(defaults.identifier);

        Ok(Self {
            product_name,
            app_name,
            identifier,
        })
    }
}

// ============================================================================
// Platform commands
// ============================================================================

#[derive(Debug, Clone)]
pub struct PlatformCommands {
    pub npm: &'static str,
    pub kill_cmd: &'static str,
    pub kill_args: &'static [&'static str],
    pub executable_ext: &'static str,
    /// Exit codes of the kill command meaning "stopped or was not running".
    pub kill_success_codes: &'static [i32],
}

impl PlatformCommands {
    pub fn current() -> Self {
        if cfg!(windows) {
            Self {
                npm: "npm.cmd",
                kill_cmd: "taskkill",
                kill_args: &["/F", "/T", "/IM"],
                executable_ext: ".exe",
                kill_success_codes: &[0, 128],
            }
        } else {
            Self {
                npm: "npm",
                kill_cmd: "pkill",
                kill_args: &["-f"],
                executable_ext: "",
                kill_success_codes: &[0, 1],
            }
        }
    }
}
