//! History display for one sheet.

use std::fmt::Write;

use anyhow::Result;
use tally_core::{Entry, RegistryStore, Tracker, format_duration};

/// Sums the `1h 2m 3s` style durations of `entries`.
///
/// Unparseable durations count as zero.
pub fn total_seconds(entries: &[&Entry]) -> i64 {
    entries.iter().map(|e| parse_duration(&e.duration)).sum()
}

fn parse_duration(text: &str) -> i64 {
    text.split_whitespace()
        .map(|part| {
            let Some(unit) = part.chars().last() else {
                return 0;
            };
            let value: i64 = part[..part.len() - unit.len_utf8()].parse().unwrap_or(0);
            match unit {
                'h' => value * 3600,
                'm' => value * 60,
                's' => value,
                _ => 0,
            }
        })
        .sum()
}

/// Format entries for human-readable output.
pub fn format_entries(sheet: &str, entries: &[&Entry]) -> String {
    let mut output = String::new();

    writeln!(output, "ENTRIES - {sheet}").unwrap();
    writeln!(output).unwrap();

    if entries.is_empty() {
        writeln!(output, "No entries recorded yet.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<10}  {:<8}  {:<8}  {:>10}  Description",
        "Date", "Start", "End", "Duration"
    )
    .unwrap();
    writeln!(
        output,
        "──────────  ────────  ────────  ──────────  ──────────────────"
    )
    .unwrap();

    for entry in entries {
        writeln!(
            output,
            "{:<10}  {:<8}  {:<8}  {:>10}  {}",
            entry.date, entry.start_time, entry.end_time, entry.duration, entry.description
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(
        output,
        "{} entries, {} total",
        entries.len(),
        format_duration(total_seconds(entries))
    )
    .unwrap();

    output
}

/// Format entries as JSON.
pub fn format_entries_json(entries: &[&Entry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Runs `tally entries`.
pub fn run<S: RegistryStore>(tracker: &Tracker<S>, json: bool) -> Result<()> {
    let rows = tracker.entry_rows();
    if json {
        println!("{}", format_entries_json(&rows)?);
    } else {
        print!("{}", format_entries(tracker.current_sheet(), &rows));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    fn entry(date: &str, start: &str, end: &str, duration: &str, description: &str) -> Entry {
        Entry {
            date: date.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            duration: duration.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_parse_duration_forms() {
        assert_eq!(parse_duration("1h 2m 3s"), 3723);
        assert_eq!(parse_duration("1m 30s"), 90);
        assert_eq!(parse_duration("59s"), 59);
        assert_eq!(parse_duration("garbage"), 0);
        assert_eq!(parse_duration(""), 0);
    }

    #[test]
    fn test_format_entries_empty() {
        assert_snapshot!(format_entries("Default", &[]), @r"
        ENTRIES - Default

        No entries recorded yet.
        ");
    }

    #[test]
    fn test_format_entries_with_total() {
        let a = entry("2024-01-02", "09:00:00", "09:01:30", "1m 30s", "Design review");
        let b = entry("2024-01-01", "14:00:00", "15:00:00", "1h 0m 0s", "Standup");

        assert_snapshot!(format_entries("Default", &[&a, &b]), @r"
        ENTRIES - Default

        Date        Start     End         Duration  Description
        ──────────  ────────  ────────  ──────────  ──────────────────
        2024-01-02  09:00:00  09:01:30      1m 30s  Design review
        2024-01-01  14:00:00  15:00:00    1h 0m 0s  Standup

        2 entries, 1h 1m 30s total
        ");
    }

    #[test]
    fn test_format_entries_json_keeps_fields() {
        let a = entry("2024-01-02", "09:00:00", "09:01:30", "1m 30s", "Design review");
        let json: serde_json::Value =
            serde_json::from_str(&format_entries_json(&[&a]).unwrap()).unwrap();
        assert_eq!(json[0]["description"], "Design review");
        assert_eq!(json[0]["duration"], "1m 30s");
    }
}
