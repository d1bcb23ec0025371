use colored::*;
use lazy_static::lazy_static;
use serde::Serialize;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::config::ExclusionSet;

lazy_static! {
    static ref LANGUAGES: HashMap<&'static str, &'static str> = HashMap::from([
        ("py", "Python"),
        ("ipynb", "Jupyter Notebook"),
        ("rs", "Rust"),
        ("js", "JavaScript"),
        ("ts", "TypeScript"),
        ("c", "C"),
        ("cpp", "C++"),
        ("h", "C/C++ Header"),
        ("java", "Java"),
        ("html", "HTML"),
        ("css", "CSS"),
        ("sh", "Shell Script"),
        ("svelte", "Svelte"),
    ]);
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageStats {
    pub files: usize,
    pub lines: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub total: usize,
    pub by_type: BTreeMap<String, LanguageStats>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub folders: usize,
    pub files: FileStats,
}

#[derive(Debug, Clone)]
pub struct ProjectTree {
    /// Plain rendering, one entry per line.
    pub rendered: String,
    pub stats: TreeStats,
}

fn count_lines(path: &Path) -> usize {
    match fs::File::open(path) {
        Ok(file) => BufReader::new(file).split(b'\n').count(),
        Err(_) => 0,
    }
}

fn language_of(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?;
    LANGUAGES.get(ext).copied()
}

struct Walker<'a> {
    exclude: &'a ExclusionSet,
    lines: Vec<String>,
    stats: TreeStats,
    colored: bool,
}

impl Walker<'_> {
    fn visit(&mut self, dir: &Path, prefix: &str) {
        let Ok(read) = fs::read_dir(dir) else {
            tracing::debug!(path = %dir.display(), "skipping unreadable directory");
            return;
        };

        let mut entries: Vec<(bool, String)> = read
            .filter_map(|e| e.ok())
            .filter(|e| !self.exclude.contains(&e.file_name()))
            .map(|e| {
                let is_dir = e.file_type().is_ok_and(|t| t.is_dir());
                (is_dir, e.file_name().to_string_lossy().to_string())
            })
            .collect();
        entries.sort_by_key(|(is_dir, name)| (!is_dir, name.to_lowercase()));

        let count = entries.len();
        for (i, (is_dir, name)) in entries.into_iter().enumerate() {
            let last = i + 1 == count;
            let connector = if last { "└── " } else { "├── " };
            let path = dir.join(&name);

            if is_dir {
                self.stats.folders += 1;
                let label = if self.colored {
                    name.bright_blue().bold().to_string()
                } else {
                    name.clone()
                };
                self.lines.push(format!("{prefix}{connector}{label}/"));
                let extension = if last { "    " } else { "│   " };
                self.visit(&path, &format!("{prefix}{extension}"));
                continue;
            }

            self.stats.files.total += 1;
            match language_of(&name) {
                Some(lang) => {
                    let lines = count_lines(&path);
                    let entry = self.stats.files.by_type.entry(lang.to_string()).or_default();
                    entry.files += 1;
                    entry.lines += lines;
                    let shown = if self.colored {
                        lines.to_string().green().to_string()
                    } else {
                        lines.to_string()
                    };
                    self.lines
                        .push(format!("{prefix}{connector}{name} :: {shown} lines"));
                }
                None => self.lines.push(format!("{prefix}{connector}{name}")),
            }
        }
    }
}

/// Renders the project below `root`, hiding (and not descending into)
/// excluded names.
pub fn project_tree(root: &Path, exclude: &ExclusionSet, colored: bool) -> ProjectTree {
    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root.display().to_string());

    let mut walker = Walker {
        exclude,
        lines: vec![if colored {
            format!("{}/", root_name.blue())
        } else {
            format!("{root_name}/")
        }],
        stats: TreeStats::default(),
        colored,
    };
    walker.visit(root, "");

    ProjectTree {
        rendered: walker.lines.join("\n"),
        stats: walker.stats,
    }
}

pub fn show_tree(root: &Path, exclude: &ExclusionSet) -> Result<(), serde_json::Error> {
    let tree = project_tree(root, exclude, true);
    println!("{}", crate::history::to_json_pretty(&tree.stats)?);
    println!("{}", tree.rendered);
    Ok(())
}
