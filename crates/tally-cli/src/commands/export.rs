//! Implementation of the `tally export` command.
//!
//! Writes the current sheet's entries as TXT or CSV, either to the configured
//! location or to an explicit `--output` base path.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tally_core::{ExportOptions, ExportTarget, RegistryStore, Tracker};

use crate::cli::ExportArgs;

/// Formatting options requested on the command line.
pub fn options(args: &ExportArgs) -> ExportOptions {
    ExportOptions {
        format: args.format,
        include_header: !args.no_header,
        sort_by_date: !args.no_sort,
    }
}

/// `--output` wins over the configured target.
pub fn target(args: &ExportArgs, configured: &ExportTarget) -> ExportTarget {
    args.output.as_ref().map_or_else(
        || configured.clone(),
        |base| ExportTarget::BaseName { base: base.clone() },
    )
}

/// Exports the current sheet and returns the written path.
pub fn export<S: RegistryStore>(
    tracker: &Tracker<S>,
    args: &ExportArgs,
    configured: &ExportTarget,
    today: NaiveDate,
) -> Result<PathBuf> {
    let path = tracker
        .export_data(&options(args), &target(args, configured), today)
        .with_context(|| format!("failed to export sheet '{}'", tracker.current_sheet()))?;
    Ok(path)
}

/// Runs `tally export`.
pub fn run<S: RegistryStore>(
    tracker: &Tracker<S>,
    args: &ExportArgs,
    configured: &ExportTarget,
    today: NaiveDate,
) -> Result<()> {
    let path = export(tracker, args, configured, today)?;
    println!("Exported to {}", path.display());
    Ok(())
}
