use colored::*;

use crate::context::Context;
use crate::error::Result;
use crate::run::run_command;

/// Runs `npm install` unless `node_modules` is already present.
pub fn install_dependencies(ctx: &Context) -> Result<()> {
    if ctx.root.join("node_modules").exists() {
        if ctx.output {
            println!(
                "{}",
                "Dependencies already exist. Skipping 'npm install'.".green()
            );
        }
        return Ok(());
    }

    if ctx.output {
        println!(
            "{}",
            "Dependencies not found. Installing... (this may take a moment)".cyan()
        );
    }

    // always streamed so a long install doesn't look frozen
    run_command(&[ctx.platform.npm, "install"], &ctx.root, &ctx.log_path(), true)?;

    if ctx.output {
        println!("{}", "Dependencies installed successfully.".green());
    }
    Ok(())
}
