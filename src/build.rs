use chrono::Local;
use colored::*;
use std::{fs, path::Path};

use crate::config::TauriConfig;
use crate::context::Context;
use crate::error::Result;
use crate::install::install_dependencies;
use crate::run::run_command;

/// Icons the bundler requires, as (destination, source under `icons/favicon_io`).
const REQUIRED_ASSETS: [(&str, &str); 2] = [
    ("icon.png", "android-chrome-512x512.png"),
    ("favicon.ico", "favicon.ico"),
];

/// Copies missing bundle icons from `icons/favicon_io`. Returns the assets
/// that were copied.
pub fn prepare_build_assets(root: &Path, output: bool) -> Result<Vec<String>> {
    if output {
        println!("{}", "Preparing build assets...".cyan());
    }

    let icons_dir = root.join("icons");
    let source_dir = icons_dir.join("favicon_io");
    let mut copied = Vec::new();

    for (dest, src) in REQUIRED_ASSETS {
        let dest_path = icons_dir.join(dest);
        let src_path = source_dir.join(src);

        if dest_path.exists() {
            continue;
        }

        if src_path.exists() {
            if output {
                println!(
                    "{}",
                    format!("Asset '{}' missing. Copying from source...", dest).dimmed()
                );
            }
            fs::copy(&src_path, &dest_path)?;
            copied.push(dest.to_string());
        } else if output {
            println!(
                "{}",
                format!(
                    "Warning: Source asset '{}' not found in '{}'. Cannot prepare '{}'.",
                    src,
                    source_dir.display(),
                    dest
                )
                .yellow()
            );
        }
    }

    Ok(copied)
}

/// Starts a fresh build log with a timestamped header.
fn reset_log(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(
        log_path,
        format!(
            "--- New Build Initiated at {} ---\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ),
    )?;
    Ok(())
}

pub fn build_project(ctx: &Context) -> Result<()> {
    if ctx.output {
        println!("{}", "Building project for production...".cyan());
    }

    install_dependencies(ctx)?;
    prepare_build_assets(&ctx.root, ctx.output)?;

    let log_path = ctx.log_path();
    reset_log(&log_path)?;

    if ctx.output {
        println!(
            "\n{}",
            "The next step involves compiling the Rust backend. This can take several minutes"
                .bright_yellow()
                .bold()
        );
        println!(
            "{}",
            "without providing detailed output. Please be patient, the script will load the build output."
                .yellow()
        );
    }

    run_command(&[ctx.platform.npm, "run", "build"], &ctx.root, &log_path, ctx.output)?;

    let tauri = TauriConfig::load(&ctx.root);
    let executable = ctx.root.join("target").join("release").join(format!(
        "{}{}",
        tauri.app_name, ctx.platform.executable_ext
    ));

    if !executable.exists() {
        tracing::warn!(path = %executable.display(), "production executable not found");
        if ctx.output {
            println!(
                "{}",
                "WARNING: Production executable not found at expected path.".yellow()
            );
            println!("{}", format!("Path checked: {}", executable.display()).yellow());
            println!(
                "{}",
                "This might be normal if you built for a different target.".yellow()
            );
        }
    }

    if ctx.output {
        println!("{}", "Production build completed successfully.".green());
    }
    Ok(())
}
