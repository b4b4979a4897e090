//! Clearing a sheet's history.

use anyhow::{Context, Result, bail};
use tally_core::{RegistryStore, Tracker};

/// Clears the current sheet's entries and returns the status line.
pub fn reset<S: RegistryStore>(tracker: &mut Tracker<S>) -> Result<String> {
    let cleared = tracker.reset_entries().context("failed to reset entries")?;
    tracing::debug!(sheet = %tracker.current_sheet(), cleared, "reset");
    Ok(format!("[{}] All entries cleared", tracker.current_sheet()))
}

/// Runs `tally reset`.
pub fn run<S: RegistryStore>(tracker: &mut Tracker<S>, yes: bool) -> Result<()> {
    if !yes {
        bail!(
            "this deletes every entry on sheet '{}'; pass --yes to confirm",
            tracker.current_sheet()
        );
    }
    println!("{}", reset(tracker)?);
    Ok(())
}
