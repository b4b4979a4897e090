//! Completed session records and per-sheet history.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::duration::{format_duration, whole_seconds};

/// Date format for entry dates and history keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time-of-day format for entry start and end times.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// A completed tracking session.
///
/// Entries are never edited once recorded. All fields are kept as the
/// display strings that are persisted and exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Day the session started on (`YYYY-MM-DD`).
    pub date: String,
    /// Effective start (`HH:MM:SS`).
    pub start_time: String,
    /// Stop instant (`HH:MM:SS`).
    pub end_time: String,
    /// Active duration, formatted with [`format_duration`].
    pub duration: String,
    pub description: String,
}

impl Entry {
    /// Builds an entry for a session that ran from `start` until `end`.
    pub fn from_run(start: NaiveDateTime, end: NaiveDateTime, description: impl Into<String>) -> Self {
        Self {
            date: start.format(DATE_FORMAT).to_string(),
            start_time: start.format(TIME_FORMAT).to_string(),
            end_time: end.format(TIME_FORMAT).to_string(),
            duration: format_duration(whole_seconds(end - start)),
            description: description.into(),
        }
    }
}

/// Entries of one sheet grouped by date.
///
/// Dates keep the order in which they were first recorded and entries keep
/// their append order within a date. Serialized as a JSON object
/// `{date: [entry, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryStore {
    #[serde(with = "crate::ordered")]
    days: Vec<(String, Vec<Entry>)>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry under its own date.
    pub fn push(&mut self, entry: Entry) {
        if let Some((_, entries)) = self.days.iter_mut().find(|(date, _)| *date == entry.date) {
            entries.push(entry);
        } else {
            self.days.push((entry.date.clone(), vec![entry]));
        }
    }

    /// Iterates dates with their entries in natural order.
    pub fn days(&self) -> impl Iterator<Item = (&str, &[Entry])> {
        self.days
            .iter()
            .map(|(date, entries)| (date.as_str(), entries.as_slice()))
    }

    /// Entries recorded for `date`.
    pub fn on(&self, date: &str) -> &[Entry] {
        self.days
            .iter()
            .find(|(d, _)| d == date)
            .map(|(_, entries)| entries.as_slice())
            .unwrap_or_default()
    }

    /// Flattens the history into `(date, entry)` pairs in natural order.
    pub fn rows(&self) -> Vec<(&str, &Entry)> {
        self.days()
            .flat_map(|(date, entries)| entries.iter().map(move |entry| (date, entry)))
            .collect()
    }

    /// Flattened history, newest date first.
    ///
    /// The sort is stable, so entries of one date stay in append order.
    pub fn rows_newest_first(&self) -> Vec<(&str, &Entry)> {
        let mut rows = self.rows();
        rows.sort_by(|a, b| b.0.cmp(a.0));
        rows
    }

    /// Total number of entries across all dates.
    pub fn len(&self) -> usize {
        self.days.iter().map(|(_, entries)| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry and date.
    pub fn clear(&mut self) {
        self.days.clear();
    }
}
