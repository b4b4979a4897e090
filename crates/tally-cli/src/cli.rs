//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tally_core::ExportFormat;

/// Multi-sheet time tracker.
///
/// Each sheet is an independent timer with its own history of completed
/// sessions. Run `tally shell` to track time interactively.
#[derive(Debug, Parser)]
#[command(name = "tally", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track time interactively.
    Shell,

    /// Manage sheets.
    #[command(subcommand)]
    Sheets(SheetsAction),

    /// Show a sheet's recorded entries, newest first.
    Entries {
        /// Sheet to show (defaults to the first sheet).
        #[arg(long)]
        sheet: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a sheet's descriptions ranked by use.
    Descriptions {
        /// Sheet to show (defaults to the first sheet).
        #[arg(long)]
        sheet: Option<String>,
    },

    /// Delete every entry of a sheet. Description counts are kept.
    Reset {
        /// Sheet to reset (defaults to the first sheet).
        #[arg(long)]
        sheet: Option<String>,

        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Export a sheet's entries to a file.
    Export(ExportArgs),

    /// Import history from the legacy single-sheet files.
    Migrate {
        /// Legacy entries file.
        #[arg(long, default_value = tally_store::LEGACY_ENTRIES_FILE)]
        entries: PathBuf,

        /// Legacy description frequency file.
        #[arg(long, default_value = tally_store::LEGACY_FREQUENCY_FILE)]
        frequency: PathBuf,

        /// Name of the sheet to create.
        #[arg(long, default_value = tally_core::DEFAULT_SHEET_NAME)]
        sheet: String,

        /// Merge into an existing sheet of the same name.
        #[arg(long)]
        merge: bool,
    },
}

/// Sheet management actions.
#[derive(Debug, Subcommand)]
pub enum SheetsAction {
    /// List sheets with their entry counts.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Create a sheet.
    Add { name: String },
    /// Delete a sheet and its history.
    Remove { name: String },
    /// Rename a sheet.
    Rename { from: String, to: String },
}

/// Export options shared by `tally export` and the shell.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Sheet to export (defaults to the current sheet).
    #[arg(long)]
    pub sheet: Option<String>,

    /// Output format.
    #[arg(long, short, default_value_t = ExportFormat::Txt)]
    pub format: ExportFormat,

    /// Omit the title block or header row.
    #[arg(long)]
    pub no_header: bool,

    /// Keep recorded order instead of newest date first.
    #[arg(long)]
    pub no_sort: bool,

    /// Write to `<OUTPUT>.<ext>` instead of the configured location.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}
