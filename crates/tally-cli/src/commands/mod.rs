//! CLI subcommand implementations.

pub mod descriptions;
pub mod entries;
pub mod export;
pub mod migrate;
pub mod reset;
pub mod sheets;
pub mod shell;

use anyhow::Result;
use tally_core::{RegistryStore, Tracker};

/// Points the tracker at `sheet`, or leaves the first sheet selected.
pub fn select<S: RegistryStore>(tracker: &mut Tracker<S>, sheet: Option<&str>) -> Result<()> {
    if let Some(name) = sheet {
        tracker.select_sheet(name)?;
    }
    Ok(())
}
