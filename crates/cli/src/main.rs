//! docpipe CLI
//!
//! Main entry point for the docpipe command-line tool.
//! Inspects versioned agent prompts and validates extraction results.

mod commands;

use clap::{Parser, Subcommand};
use commands::{NotesCommand, PromptCommand};
use docpipe_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// docpipe - versioned agent prompts and extraction-note checks
#[derive(Parser, Debug)]
#[command(name = "docpipe")]
#[command(about = "Versioned agent prompts and extraction-note checks", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCPIPE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCPIPE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prompt version inspection and resolution
    Prompt(PromptCommand),

    /// Extraction note validation
    Notes(NotesCommand),
}

fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace.clone(), cli.config.clone())?.with_overrides(
        cli.workspace,
        cli.config,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("docpipe starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Prompt selections: {:?}", config.prompts);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Prompt(_) => "prompt",
        Commands::Notes(_) => "notes",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Prompt(cmd) => cmd.execute(&config),
        Commands::Notes(cmd) => cmd.execute(),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
