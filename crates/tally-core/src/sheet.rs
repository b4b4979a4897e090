//! Per-sheet tracking lifecycle.
//!
//! A sheet is `Idle`, `Running` or `Paused`. Runtime state lives in an
//! optional [`ActiveSession`], so "has a session" and "is running or paused"
//! cannot disagree. Completed sessions land in the sheet's [`EntryStore`]
//! and bump its [`Frequency`] table.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::duration::elapsed;
use crate::entry::{Entry, EntryStore};
use crate::error::TrackerError;
use crate::suggest::Frequency;

/// Format of the session marker recorded when tracking starts.
pub const SESSION_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How starting one sheet affects the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartMode {
    /// Pause every other running sheet first.
    #[default]
    PauseOthers,
    /// Leave other sheets alone.
    Concurrent,
}

impl StartMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PauseOthers => "pause-others",
            Self::Concurrent => "concurrent",
        }
    }
}

impl fmt::Display for StartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StartMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pause-others" | "pause" => Ok(Self::PauseOthers),
            "concurrent" => Ok(Self::Concurrent),
            _ => Err(format!("invalid start mode: {s}")),
        }
    }
}

/// Observable lifecycle state of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetState {
    Idle,
    Running,
    Paused,
}

impl SheetState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for SheetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime state of a sheet between `start` and `stop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    /// Start instant rendered with [`SESSION_FORMAT`].
    pub session: String,
    /// Effective start of the current run. Stale while paused.
    pub start_time: NaiveDateTime,
    pub paused: bool,
    /// Running time accumulated at the most recent pause.
    pub paused_elapsed: TimeDelta,
}

/// Result of stopping a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// An entry was appended to the sheet's history.
    Recorded(Entry),
    /// Description entry was cancelled; nothing was recorded.
    Cancelled,
}

/// A named tracker with its own history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    name: String,
    entries: EntryStore,
    frequency: Frequency,
    active: Option<ActiveSession>,
}

impl Sheet {
    /// Creates an idle sheet with no history.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_history(name, EntryStore::new(), Frequency::new())
    }

    /// Creates an idle sheet from persisted history.
    pub fn with_history(name: impl Into<String>, entries: EntryStore, frequency: Frequency) -> Self {
        Self {
            name: name.into(),
            entries,
            frequency,
            active: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub const fn entries(&self) -> &EntryStore {
        &self.entries
    }

    pub const fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    pub const fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub const fn state(&self) -> SheetState {
        match &self.active {
            None => SheetState::Idle,
            Some(active) if active.paused => SheetState::Paused,
            Some(_) => SheetState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SheetState::Running
    }

    /// Session marker, present while running or paused.
    pub fn session(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.session.as_str())
    }

    /// Effective start of the current run, present while running or paused.
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.active.as_ref().map(|a| a.start_time)
    }

    pub fn is_paused(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.paused)
    }

    /// Running time frozen at the latest pause; zero when idle.
    pub fn paused_elapsed(&self) -> TimeDelta {
        self.active
            .as_ref()
            .map_or_else(TimeDelta::zero, |a| a.paused_elapsed)
    }

    /// Active running time of the current session, excluding pauses.
    pub fn active_elapsed(&self, now: NaiveDateTime) -> TimeDelta {
        match &self.active {
            None => TimeDelta::zero(),
            Some(active) if active.paused => active.paused_elapsed,
            Some(active) => elapsed(active.start_time, now),
        }
    }

    /// `Idle -> Running`.
    pub fn start(&mut self, now: NaiveDateTime) -> Result<(), TrackerError> {
        if self.active.is_some() {
            return Err(TrackerError::AlreadyTracking {
                name: self.name.clone(),
            });
        }

        self.active = Some(ActiveSession {
            session: now.format(SESSION_FORMAT).to_string(),
            start_time: now,
            paused: false,
            paused_elapsed: TimeDelta::zero(),
        });
        tracing::debug!(sheet = %self.name, start = %now, "tracking started");
        Ok(())
    }

    /// `Running -> Paused`. Pausing a paused sheet changes nothing.
    pub fn pause(&mut self, now: NaiveDateTime) -> Result<(), TrackerError> {
        let Some(active) = self.active.as_mut() else {
            return Err(TrackerError::NotTracking {
                name: self.name.clone(),
            });
        };
        if active.paused {
            return Ok(());
        }

        active.paused_elapsed = elapsed(active.start_time, now);
        active.paused = true;
        tracing::debug!(
            sheet = %self.name,
            elapsed_secs = active.paused_elapsed.num_seconds(),
            "tracking paused"
        );
        Ok(())
    }

    /// `Paused -> Running`, shifting the effective start past the pause gap.
    pub fn resume(&mut self, now: NaiveDateTime) -> Result<(), TrackerError> {
        let Some(active) = self.active.as_mut().filter(|a| a.paused) else {
            return Err(TrackerError::NotPaused {
                name: self.name.clone(),
            });
        };

        // paused_elapsed stays as a residual until the next pause overwrites it
        active.start_time = now - active.paused_elapsed;
        active.paused = false;
        tracing::debug!(sheet = %self.name, start = %active.start_time, "tracking resumed");
        Ok(())
    }

    /// `Running | Paused -> Idle`.
    ///
    /// `None` means the description prompt was cancelled: the session is
    /// discarded. Otherwise the trimmed description must be non-empty; the
    /// entry runs from the effective start to `now` and its duration excludes
    /// paused time.
    pub fn stop(
        &mut self,
        description: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<StopOutcome, TrackerError> {
        if self.active.is_none() {
            return Err(TrackerError::NotTracking {
                name: self.name.clone(),
            });
        }

        let Some(description) = description else {
            self.active = None;
            tracing::debug!(sheet = %self.name, "session discarded");
            return Ok(StopOutcome::Cancelled);
        };

        let description = description.trim();
        if description.is_empty() {
            return Err(TrackerError::EmptyDescription);
        }

        let start = now - self.active_elapsed(now);
        let entry = Entry::from_run(start, now, description);
        self.entries.push(entry.clone());
        self.frequency.record(description);
        self.active = None;

        tracing::info!(
            sheet = %self.name,
            duration = %entry.duration,
            description = %entry.description,
            "session recorded"
        );
        Ok(StopOutcome::Recorded(entry))
    }

    /// Clears the history. The frequency table is kept.
    pub fn reset_entries(&mut self) {
        self.entries.clear();
    }

    /// Merges history from another source into this sheet.
    pub(crate) fn absorb(&mut self, entries: &EntryStore, frequency: &Frequency) {
        for (_, entry) in entries.rows() {
            self.entries.push(entry.clone());
        }
        for (description, count) in frequency.iter() {
            self.frequency.add(description, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn assert_invariants(sheet: &Sheet) {
        assert_eq!(sheet.session().is_some(), sheet.state() != SheetState::Idle);
        assert_eq!(sheet.start_time().is_none(), sheet.session().is_none());
        if sheet.is_paused() {
            assert!(sheet.session().is_some());
        }
    }

    #[test]
    fn start_sets_runtime_fields() {
        let mut sheet = Sheet::new("Default");
        sheet.start(at(9, 0, 0)).unwrap();

        assert_eq!(sheet.state(), SheetState::Running);
        assert_eq!(sheet.session(), Some("2024-01-01 09:00:00"));
        assert_eq!(sheet.start_time(), Some(at(9, 0, 0)));
        assert!(!sheet.is_paused());
        assert_eq!(sheet.paused_elapsed(), TimeDelta::zero());
        assert_invariants(&sheet);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut sheet = Sheet::new("Default");
        sheet.start(at(9, 0, 0)).unwrap();
        let err = sheet.start(at(9, 5, 0)).unwrap_err();
        assert!(matches!(err, TrackerError::AlreadyTracking { .. }));
        assert_eq!(sheet.start_time(), Some(at(9, 0, 0)));
    }

    #[test]
    fn stop_records_entry_and_frequency() {
        let mut sheet = Sheet::new("Default");
        sheet.start(at(9, 0, 0)).unwrap();
        let outcome = sheet.stop(Some("Design review"), at(9, 1, 30)).unwrap();

        let expected = Entry {
            date: "2024-01-01".to_string(),
            start_time: "09:00:00".to_string(),
            end_time: "09:01:30".to_string(),
            duration: "1m 30s".to_string(),
            description: "Design review".to_string(),
        };
        assert_eq!(outcome, StopOutcome::Recorded(expected.clone()));
        assert_eq!(sheet.entries().on("2024-01-01"), [expected]);
        assert_eq!(sheet.frequency().count("Design review"), 1);
        assert_eq!(sheet.state(), SheetState::Idle);
        assert_invariants(&sheet);
    }

    #[test]
    fn stop_cancelled_records_nothing() {
        let mut sheet = Sheet::new("Default");
        sheet.start(at(9, 0, 0)).unwrap();
        sheet.pause(at(9, 0, 10)).unwrap();

        let outcome = sheet.stop(None, at(9, 1, 0)).unwrap();
        assert_eq!(outcome, StopOutcome::Cancelled);
        assert!(sheet.entries().is_empty());
        assert!(sheet.frequency().is_empty());
        assert_eq!(sheet.state(), SheetState::Idle);
        assert_eq!(sheet.paused_elapsed(), TimeDelta::zero());
        assert_invariants(&sheet);
    }

    #[test]
    fn stop_with_blank_description_keeps_session() {
        let mut sheet = Sheet::new("Default");
        sheet.start(at(9, 0, 0)).unwrap();
        let err = sheet.stop(Some("   "), at(9, 1, 0)).unwrap_err();
        assert!(matches!(err, TrackerError::EmptyDescription));
        assert_eq!(sheet.state(), SheetState::Running);
    }

    #[test]
    fn stop_trims_description() {
        let mut sheet = Sheet::new("Default");
        sheet.start(at(9, 0, 0)).unwrap();
        sheet.stop(Some("  Email  "), at(9, 0, 5)).unwrap();
        assert_eq!(sheet.frequency().count("Email"), 1);
    }

    #[test]
    fn stop_idle_is_rejected() {
        let mut sheet = Sheet::new("Default");
        let err = sheet.stop(Some("x"), at(9, 0, 0)).unwrap_err();
        assert!(matches!(err, TrackerError::NotTracking { .. }));
    }

    #[test]
    fn pause_freezes_elapsed_and_keeps_start() {
        let mut sheet = Sheet::new("Default");
        sheet.start(at(9, 0, 0)).unwrap();
        sheet.pause(at(9, 10, 0)).unwrap();

        assert_eq!(sheet.state(), SheetState::Paused);
        assert_eq!(sheet.paused_elapsed(), TimeDelta::minutes(10));
        assert_eq!(sheet.start_time(), Some(at(9, 0, 0)));
        assert_eq!(sheet.active_elapsed(at(11, 0, 0)), TimeDelta::minutes(10));
        assert_invariants(&sheet);
    }

    #[test]
    fn pause_idle_is_rejected_and_pause_paused_is_noop() {
        let mut sheet = Sheet::new("Default");
        assert!(matches!(
            sheet.pause(at(9, 0, 0)),
            Err(TrackerError::NotTracking { .. })
        ));

        sheet.start(at(9, 0, 0)).unwrap();
        sheet.pause(at(9, 1, 0)).unwrap();
        sheet.pause(at(9, 5, 0)).unwrap();
        assert_eq!(sheet.paused_elapsed(), TimeDelta::minutes(1));
    }

    #[test]
    fn resume_shifts_start_past_the_gap() {
        let mut sheet = Sheet::new("Default");
        sheet.start(at(9, 0, 0)).unwrap();
        sheet.pause(at(9, 10, 0)).unwrap();
        sheet.resume(at(10, 0, 0)).unwrap();

        assert_eq!(sheet.state(), SheetState::Running);
        assert_eq!(sheet.start_time(), Some(at(9, 50, 0)));
        // residual, not reset on resume
        assert_eq!(sheet.paused_elapsed(), TimeDelta::minutes(10));
        assert_eq!(sheet.active_elapsed(at(10, 5, 0)), TimeDelta::minutes(15));
    }

    #[test]
    fn resume_preserves_cumulative_elapsed_at_stop() {
        let mut sheet = Sheet::new("Default");
        sheet.start(at(9, 0, 0)).unwrap();
        sheet.pause(at(9, 20, 0)).unwrap();
        let paused_elapsed = sheet.paused_elapsed();
        let resumed_at = at(12, 0, 0);
        sheet.resume(resumed_at).unwrap();
        let resumed_start = sheet.start_time().unwrap();

        let stop = at(12, 30, 0);
        let expected = paused_elapsed + (stop - resumed_at);
        assert_eq!(expected, TimeDelta::minutes(50));
        assert_eq!(sheet.active_elapsed(stop), expected);
        assert_eq!(stop - resumed_start, expected);

        let StopOutcome::Recorded(entry) = sheet.stop(Some("Deep work"), stop).unwrap() else {
            panic!("expected a recorded entry");
        };
        assert_eq!(entry.duration, "50m 0s");
        assert_eq!(entry.start_time, "11:40:00");
        assert_eq!(entry.end_time, "12:30:00");
    }

    #[test]
    fn resume_running_is_rejected() {
        let mut sheet = Sheet::new("Default");
        sheet.start(at(9, 0, 0)).unwrap();
        assert!(matches!(
            sheet.resume(at(9, 1, 0)),
            Err(TrackerError::NotPaused { .. })
        ));
    }

    #[test]
    fn stop_while_paused_uses_frozen_duration() {
        let mut sheet = Sheet::new("Default");
        sheet.start(at(9, 0, 0)).unwrap();
        sheet.pause(at(9, 45, 0)).unwrap();

        let StopOutcome::Recorded(entry) = sheet.stop(Some("Review"), at(11, 0, 0)).unwrap() else {
            panic!("expected a recorded entry");
        };
        assert_eq!(entry.duration, "45m 0s");
        assert_eq!(entry.start_time, "10:15:00");
        assert_eq!(entry.end_time, "11:00:00");
    }

    #[test]
    fn session_present_exactly_between_start_and_stop() {
        let mut sheet = Sheet::new("Default");
        assert!(sheet.session().is_none());

        sheet.start(at(9, 0, 0)).unwrap();
        for (i, minute) in [5, 10, 15, 20].into_iter().enumerate() {
            if i % 2 == 0 {
                sheet.pause(at(9, minute, 0)).unwrap();
            } else {
                sheet.resume(at(9, minute, 0)).unwrap();
            }
            assert!(sheet.session().is_some());
            assert_invariants(&sheet);
        }

        sheet.stop(Some("done"), at(9, 30, 0)).unwrap();
        assert!(sheet.session().is_none());
        assert_invariants(&sheet);
    }

    #[test]
    fn reset_keeps_frequency() {
        let mut sheet = Sheet::new("Default");
        sheet.start(at(9, 0, 0)).unwrap();
        sheet.stop(Some("Email"), at(9, 0, 30)).unwrap();
        sheet.reset_entries();

        assert!(sheet.entries().is_empty());
        assert_eq!(sheet.frequency().count("Email"), 1);
    }

    #[test]
    fn start_mode_parses_aliases() {
        assert_eq!("pause".parse::<StartMode>().unwrap(), StartMode::PauseOthers);
        assert_eq!(
            "concurrent".parse::<StartMode>().unwrap(),
            StartMode::Concurrent
        );
        assert!("both".parse::<StartMode>().is_err());
        assert_eq!(StartMode::PauseOthers.to_string(), "pause-others");
    }
}
