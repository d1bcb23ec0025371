use colored::*;

use crate::build::build_project;
use crate::config::TauriConfig;
use crate::context::Context;
use crate::error::Result;
use crate::install::install_dependencies;
use crate::process::{ProcessStopper, lingering_processes};
use crate::run::run_command;

/// Launches `npm run dev` and blocks until the server exits.
pub fn start_dev_server(ctx: &Context) -> Result<()> {
    if ctx.output {
        println!("\n{}", "--- Starting Development Environment ---".cyan().bold());
        println!(
            "{}",
            "The server is now running and watching for file changes.".yellow()
        );
        println!("{}", "Press Ctrl+C in this terminal to stop the server.".yellow());
    }

    run_command(&[ctx.platform.npm, "run", "dev"], &ctx.root, &ctx.log_path(), ctx.output)?;

    if ctx.output {
        println!("\n{}", "Development server process ended.".green());
    }
    Ok(())
}

pub fn stop_dev_servers(ctx: &Context, stopper: &dyn ProcessStopper) {
    let tauri = TauriConfig::load(&ctx.root);
    stopper.stop_processes_by_name(&lingering_processes(&ctx.config, &tauri, &ctx.platform));
}

/// Stop, install, build, then serve.
pub fn init_project(ctx: &Context, stopper: &dyn ProcessStopper) -> Result<()> {
    if ctx.output {
        println!("{}", "--- Initiating Full Project Setup ---".magenta().bold());
    }

    stop_dev_servers(ctx, stopper);
    install_dependencies(ctx)?;
    build_project(ctx)?;
    start_dev_server(ctx)?;

    if ctx.output {
        println!(
            "{}",
            "--- Project setup complete. Happy coding! ---".green().bold()
        );
    }
    Ok(())
}
