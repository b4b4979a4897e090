//! Collaborator-facing facade over the sheet registry.
//!
//! The [`Tracker`] owns the registry and the currently observed sheet, and
//! persists through a [`RegistryStore`] after every change to durable state
//! (entries, frequency, sheet set, names). Front ends drive it with explicit
//! timestamps and render the read-only [`SheetView`] projection.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use crate::duration::{format_clock, whole_seconds};
use crate::entry::Entry;
use crate::error::{PersistError, TrackerError};
use crate::export::{self, ExportError, ExportOptions, ExportTarget};
use crate::registry::Registry;
use crate::sheet::{Sheet, SheetState, StartMode, StopOutcome};
use crate::suggest::Suggestion;
use crate::ticker::Tick;

/// Durable storage for the registry.
pub trait RegistryStore {
    /// Writes the durable subset of every sheet.
    fn save(&self, registry: &Registry) -> Result<(), PersistError>;
}

/// Read-only snapshot of one sheet for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetView {
    pub name: String,
    pub state: SheetState,
    pub entry_count: usize,
    pub is_current: bool,
}

/// What a start did to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    pub sheet: String,
    /// Sheets paused because of [`StartMode::PauseOthers`].
    pub paused: Vec<String>,
}

/// Result of [`Tracker::toggle_tracking`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggled {
    Started(Started),
    Resumed,
    Stopped(StopOutcome),
}

/// The tracking core: sheets, the observed sheet and persistence.
#[derive(Debug)]
pub struct Tracker<S> {
    registry: Registry,
    current: String,
    store: S,
}

impl<S: RegistryStore> Tracker<S> {
    /// Wraps a loaded registry; the first sheet becomes current.
    pub fn new(registry: Registry, store: S) -> Self {
        let registry = if registry.is_empty() {
            Registry::new()
        } else {
            registry
        };
        let current = registry
            .first()
            .map(|s| s.name().to_string())
            .unwrap_or_default();
        Self {
            registry,
            current,
            store,
        }
    }

    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Views of every sheet in registry order.
    pub fn list_sheets(&self) -> Vec<SheetView> {
        self.registry
            .iter()
            .map(|sheet| SheetView {
                name: sheet.name().to_string(),
                state: sheet.state(),
                entry_count: sheet.entries().len(),
                is_current: sheet.name() == self.current,
            })
            .collect()
    }

    /// Name of the observed sheet.
    pub fn current_sheet(&self) -> &str {
        &self.current
    }

    /// The observed sheet.
    pub fn current(&self) -> &Sheet {
        self.registry
            .get(&self.current)
            .or_else(|| self.registry.first())
            .unwrap_or_else(|| unreachable!("registry always holds a sheet"))
    }

    /// Looks up any sheet by name.
    pub fn sheet(&self, name: &str) -> Result<&Sheet, TrackerError> {
        self.registry.require(name)
    }

    pub fn select_sheet(&mut self, name: &str) -> Result<(), TrackerError> {
        self.registry.require(name)?;
        self.current = name.to_string();
        tracing::debug!(sheet = %name, "sheet selected");
        Ok(())
    }

    /// Adds an empty sheet and makes it current.
    pub fn add_sheet(&mut self, name: &str) -> Result<String, TrackerError> {
        let name = self.registry.add(name)?.name().to_string();
        self.current.clone_from(&name);
        self.persist()?;
        Ok(name)
    }

    /// Removes an idle sheet. Selection falls back to the first sheet.
    pub fn remove_sheet(&mut self, name: &str) -> Result<(), TrackerError> {
        self.registry.remove(name)?;
        if self.current == name {
            if let Some(first) = self.registry.first() {
                self.current = first.name().to_string();
            }
        }
        self.persist()
    }

    /// Renames a sheet, keeping selection on it if it was current.
    pub fn rename_sheet(&mut self, from: &str, to: &str) -> Result<String, TrackerError> {
        let to = self.registry.rename(from, to)?;
        if self.current == from {
            self.current.clone_from(&to);
        }
        self.persist()?;
        Ok(to)
    }

    /// Merges an externally built sheet (e.g. migrated legacy data).
    ///
    /// With `merge`, history is folded into an existing sheet of the same
    /// name instead of being rejected as a duplicate.
    pub fn import_sheet(&mut self, sheet: Sheet, merge: bool) -> Result<(), TrackerError> {
        if merge && self.registry.contains(sheet.name()) {
            let name = sheet.name().to_string();
            self.registry.merge_into(&name, &sheet)?;
        } else {
            self.registry.insert(sheet)?;
        }
        self.persist()
    }

    /// Starts the current sheet.
    pub fn start_tracking(
        &mut self,
        mode: StartMode,
        now: NaiveDateTime,
    ) -> Result<Started, TrackerError> {
        let name = self.current.clone();
        if self.registry.require(&name)?.session().is_some() {
            return Err(TrackerError::AlreadyTracking { name });
        }

        let paused = match mode {
            StartMode::PauseOthers => self.registry.pause_others(&name, now),
            StartMode::Concurrent => Vec::new(),
        };
        self.registry.require_mut(&name)?.start(now)?;

        tracing::debug!(sheet = %name, mode = %mode, paused = ?paused, "start");
        Ok(Started {
            sheet: name,
            paused,
        })
    }

    /// Stops the current sheet.
    ///
    /// `None` is a cancelled description prompt. A recorded entry is
    /// persisted; if that fails the entry stays in memory and the sheet is
    /// still idle.
    pub fn stop_tracking(
        &mut self,
        description: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<StopOutcome, TrackerError> {
        let name = self.current.clone();
        let outcome = self.registry.require_mut(&name)?.stop(description, now)?;
        if matches!(outcome, StopOutcome::Recorded(_)) {
            self.persist()?;
        }
        Ok(outcome)
    }

    /// Pauses any running sheet by name.
    pub fn pause_sheet(&mut self, name: &str, now: NaiveDateTime) -> Result<(), TrackerError> {
        self.registry.require_mut(name)?.pause(now)
    }

    /// Resumes the current sheet.
    pub fn resume_tracking(&mut self, now: NaiveDateTime) -> Result<(), TrackerError> {
        let name = self.current.clone();
        self.registry.require_mut(&name)?.resume(now)
    }

    /// Single-button behaviour: resume if paused, stop if running, else start.
    ///
    /// `description` is only consulted when stopping.
    pub fn toggle_tracking(
        &mut self,
        mode: StartMode,
        description: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<Toggled, TrackerError> {
        match self.current().state() {
            SheetState::Paused => {
                self.resume_tracking(now)?;
                Ok(Toggled::Resumed)
            }
            SheetState::Running => Ok(Toggled::Stopped(self.stop_tracking(description, now)?)),
            SheetState::Idle => Ok(Toggled::Started(self.start_tracking(mode, now)?)),
        }
    }

    /// Clears the current sheet's history, keeping its frequency table.
    pub fn reset_entries(&mut self) -> Result<usize, TrackerError> {
        let name = self.current.clone();
        let sheet = self.registry.require_mut(&name)?;
        let cleared = sheet.entries().len();
        sheet.reset_entries();
        tracing::debug!(sheet = %name, cleared, "entries reset");
        self.persist()?;
        Ok(cleared)
    }

    /// Exports the current sheet's history.
    pub fn export_data(
        &self,
        options: &ExportOptions,
        target: &ExportTarget,
        today: NaiveDate,
    ) -> Result<PathBuf, ExportError> {
        let sheet = self.current();
        export::export(sheet.name(), sheet.entries(), options, target, today)
    }

    /// History of the current sheet, newest date first.
    pub fn entry_rows(&self) -> Vec<&Entry> {
        self.current()
            .entries()
            .rows_newest_first()
            .into_iter()
            .map(|(_, entry)| entry)
            .collect()
    }

    /// Ranked description suggestions for the current sheet.
    pub fn suggestions(&self) -> Vec<Suggestion<'_>> {
        self.current().frequency().ranked()
    }

    /// Status line for the current sheet.
    pub fn tick(&self, now: NaiveDateTime) -> String {
        let sheet = self.current();
        status_line(sheet, now)
    }

    /// Snapshot for the ticker of `name`.
    ///
    /// Publishes only while `name` is running and current.
    pub fn tick_sheet(&self, name: &str, now: NaiveDateTime) -> Tick {
        match self.registry.get(name) {
            Some(sheet) if sheet.is_running() => {
                if name == self.current {
                    Tick::Publish(status_line(sheet, now))
                } else {
                    Tick::Skip
                }
            }
            _ => Tick::Stop,
        }
    }

    fn persist(&self) -> Result<(), TrackerError> {
        self.store.save(&self.registry)?;
        Ok(())
    }
}

fn status_line(sheet: &Sheet, now: NaiveDateTime) -> String {
    let elapsed = format_clock(whole_seconds(sheet.active_elapsed(now)));
    match sheet.state() {
        SheetState::Running => format!("[{}] Tracking... Elapsed: {elapsed}", sheet.name()),
        SheetState::Paused => format!("[{}] Paused at {elapsed}", sheet.name()),
        SheetState::Idle => format!("[{}] Ready to track time", sheet.name()),
    }
}
