//! Export of a sheet's history to delimited text files.
//!
//! Two formats are supported:
//! - `txt`: tab-separated rows with an optional title block
//! - `csv`: RFC 4180 comma-separated values with an optional header row
//!
//! The destination is chosen by an [`ExportTarget`]: either a weekly file per
//! sheet under an export directory, or a fixed base file name.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Datelike, IsoWeek, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::{Entry, EntryStore};

/// Column titles shared by both formats.
pub const COLUMNS: [&str; 5] = ["Date", "Start Time", "End Time", "Duration", "Description"];

/// Width of the rule lines in the text header.
const RULE_WIDTH: usize = 80;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The sheet has no entries; nothing was written.
    #[error("no time entries to export on sheet '{sheet}'")]
    EmptyDataset { sheet: String },

    /// The destination directory or file could not be written.
    #[error("failed to write export to {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding failed.
    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Txt,
    Csv,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Txt),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("invalid export format: {s}")),
        }
    }
}

/// Formatting switches for one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub include_header: bool,
    /// Newest date first. Otherwise dates keep their recorded order.
    pub sort_by_date: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Txt,
            include_header: true,
            sort_by_date: true,
        }
    }
}

/// Where an export is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// `{dir}/{sheet}/sheet_W{week}_{year}.{ext}`, one file per ISO week.
    Weekly { dir: PathBuf },
    /// `{base}.{ext}`, whatever the sheet or date.
    BaseName { base: PathBuf },
}

impl ExportTarget {
    /// Destination path for `sheet` in `format`, exporting on `today`.
    pub fn path_for(&self, sheet: &str, format: ExportFormat, today: NaiveDate) -> PathBuf {
        match self {
            Self::Weekly { dir } => {
                let week = today.iso_week();
                dir.join(sheet_folder_name(sheet)).join(format!(
                    "sheet_W{:02}_{}.{}",
                    week.week(),
                    week.year(),
                    format.extension()
                ))
            }
            Self::BaseName { base } => with_format_extension(base, format),
        }
    }
}

/// Appends the format's extension, keeping any dotted suffix already in the
/// base name. A base that already ends in the extension is left as is.
fn with_format_extension(base: &Path, format: ExportFormat) -> PathBuf {
    let ext = format.extension();
    if base.extension().is_some_and(|e| e == ext) {
        return base.to_path_buf();
    }
    let mut path = base.as_os_str().to_os_string();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}

/// Folder name used for a sheet's weekly exports.
pub fn sheet_folder_name(sheet: &str) -> String {
    sheet.replace(' ', "_")
}

/// Flattens history into export order.
pub fn export_rows(entries: &EntryStore, sort_by_date: bool) -> Vec<(&str, &Entry)> {
    if sort_by_date {
        entries.rows_newest_first()
    } else {
        entries.rows()
    }
}

/// Renders the tab-separated text format.
pub fn render_txt(
    sheet: &str,
    rows: &[(&str, &Entry)],
    include_header: bool,
    week: IsoWeek,
) -> String {
    let mut out = String::new();
    if include_header {
        let _ = writeln!(out, "Time Entries - {sheet}");
        let _ = writeln!(out, "Week {}, {}", week.week(), week.year());
        let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
        out.push('\n');
        let _ = writeln!(out, "{}", COLUMNS.join("\t"));
        let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    }

    for (_, entry) in rows {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            entry.date, entry.start_time, entry.end_time, entry.duration, entry.description
        );
    }
    out
}

/// Renders CSV with CRLF record terminators and minimal quoting.
pub fn render_csv(rows: &[(&str, &Entry)], include_header: bool) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    if include_header {
        writer.write_record(COLUMNS)?;
    }
    for (_, entry) in rows {
        writer.write_record([
            &entry.date,
            &entry.start_time,
            &entry.end_time,
            &entry.duration,
            &entry.description,
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
}

/// Writes `entries` of `sheet` to the destination chosen by `target`.
///
/// Fails before touching the filesystem when there is nothing to export.
pub fn export(
    sheet: &str,
    entries: &EntryStore,
    options: &ExportOptions,
    target: &ExportTarget,
    today: NaiveDate,
) -> Result<PathBuf, ExportError> {
    if entries.is_empty() {
        return Err(ExportError::EmptyDataset {
            sheet: sheet.to_string(),
        });
    }

    let rows = export_rows(entries, options.sort_by_date);
    let contents = match options.format {
        ExportFormat::Txt => render_txt(sheet, &rows, options.include_header, today.iso_week()).into_bytes(),
        ExportFormat::Csv => render_csv(&rows, options.include_header)?,
    };

    let path = target.path_for(sheet, options.format, today);
    write_file(&path, &contents)?;

    tracing::info!(
        sheet = %sheet,
        path = %path.display(),
        rows = rows.len(),
        format = %options.format,
        "export written"
    );
    Ok(path)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
