//! Ranked description suggestions for one sheet.

use std::fmt::Write;

use anyhow::Result;
use tally_core::{QUICK_PICK_COUNT, RegistryStore, Suggestion, Tracker};

/// Format suggestions, numbered for `#N` picks in the shell.
///
/// The first [`QUICK_PICK_COUNT`] are marked as quick picks.
pub fn format_suggestions(suggestions: &[Suggestion<'_>]) -> String {
    let mut output = String::new();

    if suggestions.is_empty() {
        writeln!(output, "No descriptions used yet.").unwrap();
        return output;
    }

    for (index, suggestion) in suggestions.iter().enumerate() {
        let marker = if index < QUICK_PICK_COUNT { "*" } else { " " };
        writeln!(output, "{marker} #{:<3} {}", index + 1, suggestion.label()).unwrap();
    }
    output
}

/// One-line summary of the quick picks, e.g. `[1] Standup  [2] Email`.
pub fn format_quick_picks(suggestions: &[Suggestion<'_>]) -> String {
    suggestions
        .iter()
        .take(QUICK_PICK_COUNT)
        .enumerate()
        .map(|(index, s)| format!("[{}] {}", index + 1, s.short_label()))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Runs `tally descriptions`.
pub fn run<S: RegistryStore>(tracker: &Tracker<S>) -> Result<()> {
    print!("{}", format_suggestions(&tracker.suggestions()));
    Ok(())
}
