use clap::{Parser, Subcommand};
use colored::*;
use std::{io, path::PathBuf};
use tracing_subscriber::EnvFilter;

use devmgr::build::build_project;
use devmgr::clean::{CleanOutcome, clean_project};
use devmgr::config::Config;
use devmgr::context::{Context, resolve_root};
use devmgr::dev::{init_project, start_dev_server, stop_dev_servers};
use devmgr::error::{MgrError, Result};
use devmgr::history::log_command_history;
use devmgr::install::install_dependencies;
use devmgr::process::SystemProcessStopper;
use devmgr::tree::show_tree;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "devmgr")]
#[command(
    about = "A cross-platform utility for managing your Svelte/Tauri project",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Suppress console output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Force operations without confirmation prompts
    #[arg(short, long, global = true)]
    force: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Display the project's file tree with statistics
    Tree,
    /// Clean all build artifacts and dependencies
    Clean,
    /// Stop any running development servers
    Stop,
    /// Clean and reinstall all npm dependencies
    Deps,
    /// Build the project for production
    Build,
    /// Start the live development server
    Dev,
    /// Initialize the project fully (stop, deps, build, dev)
    Init,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn clean(ctx: &Context, stopper: &SystemProcessStopper) -> Result<()> {
    let stdin = io::stdin();
    let outcome = clean_project(ctx, stopper, &mut stdin.lock(), &mut io::stdout())?;

    match outcome {
        CleanOutcome::Completed(report) if !report.is_success() => {
            Err(MgrError::CleanIncomplete {
                failed: report.failed.len(),
            })
        }
        _ => Ok(()),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // history writes under the root, so it must already exist
    let root = match resolve_root(cli.root.clone()) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("\n{} {}", "❌".red(), e.to_string().red());
            std::process::exit(1);
        }
    };
    let config = Config::load(&root);

    if config.history {
        let command = std::env::args().collect::<Vec<_>>().join(" ");
        if let Err(e) = log_command_history(&root, &command) {
            tracing::warn!("could not record command history: {e}");
        }
    }

    let ctx = Context::new(root, config, !cli.quiet, cli.force);
    let stopper = SystemProcessStopper::from_config(&ctx.config, ctx.output);

    let result = match cli.command {
        Commands::Tree => show_tree(&ctx.root, &ctx.config.tree_exclusion_set()).map_err(Into::into),
        Commands::Clean => clean(&ctx, &stopper),
        Commands::Stop => {
            stop_dev_servers(&ctx, &stopper);
            Ok(())
        }
        Commands::Deps => {
            if ctx.output {
                println!("{}", "--- Force Reinstalling Dependencies ---".cyan().bold());
            }
            clean(&ctx, &stopper).and_then(|_| install_dependencies(&ctx))
        }
        Commands::Build => build_project(&ctx),
        Commands::Dev => start_dev_server(&ctx),
        Commands::Init => init_project(&ctx, &stopper),
    };

    if let Err(e) = result {
        eprintln!("\n{} {}", "❌".red(), e.to_string().red());
        std::process::exit(1);
    }
}
