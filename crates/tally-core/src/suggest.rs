//! Description frequency table and reuse suggestions.

use serde::{Deserialize, Serialize};

/// Number of top descriptions offered as quick picks.
pub const QUICK_PICK_COUNT: usize = 3;

/// Maximum characters shown on a quick-pick label before truncation.
const QUICK_PICK_WIDTH: usize = 20;

/// Per-sheet usage counts of session descriptions.
///
/// Counts only ever grow. Descriptions keep first-use order, which breaks ties
/// when ranking. Serialized as a JSON object `{description: count}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frequency {
    #[serde(with = "crate::ordered")]
    counts: Vec<(String, u64)>,
}

impl Frequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one more use of `description`.
    pub fn record(&mut self, description: &str) {
        if let Some((_, count)) = self.counts.iter_mut().find(|(d, _)| d == description) {
            *count += 1;
        } else {
            self.counts.push((description.to_string(), 1));
        }
    }

    /// Adds `count` uses, as when merging another table in.
    pub fn add(&mut self, description: &str, count: u64) {
        if let Some((_, existing)) = self.counts.iter_mut().find(|(d, _)| d == description) {
            *existing += count;
        } else {
            self.counts.push((description.to_string(), count));
        }
    }

    pub fn count(&self, description: &str) -> u64 {
        self.counts
            .iter()
            .find(|(d, _)| d == description)
            .map_or(0, |(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(d, count)| (d.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Descriptions ordered by count, most used first.
    pub fn ranked(&self) -> Vec<Suggestion<'_>> {
        let mut ranked: Vec<Suggestion<'_>> = self
            .iter()
            .map(|(description, count)| Suggestion { description, count })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }

    /// The most used descriptions, at most [`QUICK_PICK_COUNT`].
    pub fn quick_picks(&self) -> Vec<Suggestion<'_>> {
        let mut ranked = self.ranked();
        ranked.truncate(QUICK_PICK_COUNT);
        ranked
    }
}

/// A previously used description and how often it was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion<'a> {
    pub description: &'a str,
    pub count: u64,
}

impl Suggestion<'_> {
    /// Dropdown label: `desc (n times)` once used more than once.
    pub fn label(&self) -> String {
        if self.count > 1 {
            format!("{} ({} times)", self.description, self.count)
        } else {
            self.description.to_string()
        }
    }

    /// Short button label, truncated to 20 characters plus `...`.
    pub fn short_label(&self) -> String {
        if self.description.chars().count() > QUICK_PICK_WIDTH {
            let head: String = self.description.chars().take(QUICK_PICK_WIDTH).collect();
            format!("{head}...")
        } else {
            self.description.to_string()
        }
    }
}

/// Recovers the description from a [`Suggestion::label`].
pub fn description_from_label(label: &str) -> &str {
    label.split_once(" (").map_or(label, |(description, _)| description)
}
