//! Quotebook CLI
//!
//! Command-line interface for Quotebook - a random quote collection with
//! remote sync and category conflict resolution.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use quotebook_core::{App, CategoryFilter, Config, Resolution};

mod commands;
mod logging;
mod output;
mod prompt;
mod shell;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "quotebook")]
#[command(about = "Quotebook - random quotes with remote sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a different config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell (default)
    Shell,
    /// Show a random quote
    Show {
        /// Pick from this category once; the remembered filter is unchanged
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List quotes with their positions
    #[command(alias = "ls")]
    List {
        /// Only list this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Add a quote
    Add {
        /// Quote text
        text: String,
        /// Quote category
        #[arg(short, long)]
        category: String,
    },
    /// Delete the quote at a position shown by `list`
    #[command(alias = "rm")]
    Delete {
        /// Position (1-based)
        index: usize,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List categories
    Categories,
    /// Show or set the remembered category filter
    Filter {
        /// Category name, or "all"
        category: Option<String>,
    },
    /// Show collection statistics
    Stats,
    /// Export all quotes as JSON
    Export {
        /// Output file (defaults to ./quotes.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import quotes from a JSON file (appends)
    Import {
        /// JSON file containing an array of quotes
        file: PathBuf,
    },
    /// Sync with the remote collection
    Sync {
        /// Resolve conflicts without prompting
        #[arg(short, long, value_parser = parse_resolution)]
        strategy: Option<Resolution>,
    },
    /// Post the first quotes to the remote collection
    Push,
    /// Show sync status
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, remote_url, auto_sync, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn parse_resolution(value: &str) -> Result<Resolution, String> {
    value.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    logging::init(&config);

    let mut app = App::open(config).context("Failed to open quote store")?;

    let result = match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => shell::run(&mut app, &output).await,
        command => run_once(&mut app, command, &output).await,
    };

    if let Some(hint) = result.as_ref().err().and_then(output::recovery_hint) {
        output.warn(hint);
    }
    result
}

/// Run a one-shot command; its session ends with the command
async fn run_once(app: &mut App, command: Commands, output: &Output) -> Result<()> {
    let result = dispatch(app, command, output).await;
    let cleared = app.end_session();
    result?;
    cleared.context("Failed to clear session")?;
    Ok(())
}

async fn dispatch(app: &mut App, command: Commands, output: &Output) -> Result<()> {
    match command {
        Commands::Show { category } => {
            commands::quote::show(app, category.map(filter_from), output)
        }
        Commands::List { category } => {
            commands::quote::list(app, category.map(filter_from), output)
        }
        Commands::Add { text, category } => {
            commands::quote::add(app, &text, &category, output)
        }
        Commands::Delete { index, yes } => commands::quote::delete(app, index, yes, output),
        Commands::Categories => commands::quote::categories(app, output),
        Commands::Filter { category } => {
            commands::quote::filter(app, category.map(filter_from), output)
        }
        Commands::Stats => commands::quote::stats(app, output),
        Commands::Export { output: path } => {
            commands::transfer::export(app, path.as_deref(), output)
        }
        Commands::Import { file } => commands::transfer::import(app, &file, output),
        Commands::Sync { strategy } => commands::sync::sync(app, strategy, output).await,
        Commands::Push => commands::sync::push(app, output).await,
        Commands::Status => commands::status::show(app, output),
        Commands::Shell | Commands::Config { .. } => unreachable!(), // Handled in main
    }
}

fn filter_from(name: String) -> CategoryFilter {
    match name.parse() {
        Ok(filter) => filter,
        Err(never) => match never {},
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}
