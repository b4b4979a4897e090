//! Sheet listing and management.

use std::fmt::Write;

use anyhow::{Context, Result};
use serde::Serialize;
use tally_core::{RegistryStore, SheetView, Tracker};

/// Format sheets for human-readable output.
pub fn format_sheets(views: &[SheetView]) -> String {
    let mut output = String::new();

    writeln!(output, "{:<2}{:<24}  {:<8}  {:>7}", "", "Sheet", "State", "Entries").unwrap();
    writeln!(output, "  ────────────────────────  ────────  ───────").unwrap();

    for view in views {
        let marker = if view.is_current { "*" } else { "" };
        // Truncate by characters, not bytes, to avoid panics on multi-byte UTF-8
        let name = if view.name.chars().count() > 24 {
            format!("{}...", view.name.chars().take(21).collect::<String>())
        } else {
            view.name.clone()
        };
        writeln!(
            output,
            "{marker:<2}{name:<24}  {:<8}  {:>7}",
            view.state.as_str(),
            view.entry_count
        )
        .unwrap();
    }

    output
}

#[derive(Debug, Serialize)]
struct JsonSheet<'a> {
    name: &'a str,
    state: &'static str,
    entries: usize,
    current: bool,
}

/// Format sheets as JSON.
pub fn format_sheets_json(views: &[SheetView]) -> Result<String> {
    let sheets: Vec<JsonSheet<'_>> = views
        .iter()
        .map(|v| JsonSheet {
            name: &v.name,
            state: v.state.as_str(),
            entries: v.entry_count,
            current: v.is_current,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&sheets)?)
}

/// Runs `tally sheets list`.
pub fn list<S: RegistryStore>(tracker: &Tracker<S>, json: bool) -> Result<()> {
    let views = tracker.list_sheets();
    if json {
        println!("{}", format_sheets_json(&views)?);
    } else {
        print!("{}", format_sheets(&views));
    }
    Ok(())
}

/// Runs `tally sheets add`.
pub fn add<S: RegistryStore>(tracker: &mut Tracker<S>, name: &str) -> Result<()> {
    let name = tracker.add_sheet(name).context("failed to add sheet")?;
    println!("Added sheet '{name}'");
    Ok(())
}

/// Runs `tally sheets remove`.
pub fn remove<S: RegistryStore>(tracker: &mut Tracker<S>, name: &str) -> Result<()> {
    tracker
        .remove_sheet(name)
        .context("failed to remove sheet")?;
    println!("Removed sheet '{name}'");
    Ok(())
}

/// Runs `tally sheets rename`.
pub fn rename<S: RegistryStore>(tracker: &mut Tracker<S>, from: &str, to: &str) -> Result<()> {
    let to = tracker
        .rename_sheet(from, to)
        .context("failed to rename sheet")?;
    println!("Renamed sheet '{from}' to '{to}'");
    Ok(())
}
