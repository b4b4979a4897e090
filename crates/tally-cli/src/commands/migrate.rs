//! Implementation of the `tally migrate` command.
//!
//! Imports the legacy single-sheet files into the sheet registry.

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::{RegistryStore, Tracker};

/// Summary of one migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migrated {
    pub sheet: String,
    pub entries: usize,
    pub descriptions: usize,
}

/// Reads the legacy pair and adds it as `sheet`.
///
/// Without `merge`, an existing sheet of that name is an error.
pub fn migrate<S: RegistryStore>(
    tracker: &mut Tracker<S>,
    entries: &Path,
    frequency: &Path,
    sheet: &str,
    merge: bool,
) -> Result<Migrated> {
    let name = sheet.trim();
    if !merge || !tracker.registry().contains(name) {
        tracker
            .registry()
            .validate_new_name(name)
            .context("cannot migrate into this sheet; pass --merge or choose another --sheet")?;
    }

    let legacy = tally_store::load_legacy(entries, frequency, name)
        .context("failed to read legacy files")?;
    let migrated = Migrated {
        sheet: name.to_string(),
        entries: legacy.entries().len(),
        descriptions: legacy.frequency().len(),
    };

    tracker
        .import_sheet(legacy, merge)
        .context("failed to save migrated sheet")?;
    tracing::info!(
        sheet = %migrated.sheet,
        entries = migrated.entries,
        descriptions = migrated.descriptions,
        merge,
        "legacy data migrated"
    );
    Ok(migrated)
}

/// Runs `tally migrate`.
pub fn run<S: RegistryStore>(
    tracker: &mut Tracker<S>,
    entries: &Path,
    frequency: &Path,
    sheet: &str,
    merge: bool,
) -> Result<()> {
    let migrated = migrate(tracker, entries, frequency, sheet, merge)?;
    println!(
        "Migrated {} entries and {} descriptions into sheet '{}'",
        migrated.entries, migrated.descriptions, migrated.sheet
    );
    Ok(())
}
