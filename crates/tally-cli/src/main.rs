use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tally_cli::commands::{self, descriptions, entries, export, migrate, reset, sheets, shell};
use tally_cli::{Cli, Commands, Config, SheetsAction};
use tally_core::Tracker;
use tally_store::JsonStore;

/// Load config and the sheets file.
fn open_tracker(config_path: Option<&Path>) -> Result<(Tracker<JsonStore>, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let store = JsonStore::new(&config.data_path);
    let registry = store.load();
    Ok((Tracker::new(registry, store), config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut tracker, config) = open_tracker(cli.config.as_deref())?;
    match command {
        Commands::Shell => {
            let options = shell::ShellOptions {
                start_mode: config.start_mode,
                tick_interval: config.tick_interval(),
                export_target: config.export_target(),
            };
            shell::run(tracker, options)?;
        }
        Commands::Sheets(action) => match action {
            SheetsAction::List { json } => sheets::list(&tracker, *json)?,
            SheetsAction::Add { name } => sheets::add(&mut tracker, name)?,
            SheetsAction::Remove { name } => sheets::remove(&mut tracker, name)?,
            SheetsAction::Rename { from, to } => sheets::rename(&mut tracker, from, to)?,
        },
        Commands::Entries { sheet, json } => {
            commands::select(&mut tracker, sheet.as_deref())?;
            entries::run(&tracker, *json)?;
        }
        Commands::Descriptions { sheet } => {
            commands::select(&mut tracker, sheet.as_deref())?;
            descriptions::run(&tracker)?;
        }
        Commands::Reset { sheet, yes } => {
            commands::select(&mut tracker, sheet.as_deref())?;
            reset::run(&mut tracker, *yes)?;
        }
        Commands::Export(args) => {
            commands::select(&mut tracker, args.sheet.as_deref())?;
            let today = Local::now().date_naive();
            export::run(&tracker, args, &config.export_target(), today)?;
        }
        Commands::Migrate {
            entries,
            frequency,
            sheet,
            merge,
        } => migrate::run(&mut tracker, entries, frequency, sheet, *merge)?,
    }

    Ok(())
}
