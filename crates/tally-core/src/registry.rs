//! The ordered collection of sheets.

use chrono::NaiveDateTime;

use crate::error::TrackerError;
use crate::sheet::Sheet;

/// Name of the sheet created when nothing else exists.
pub const DEFAULT_SHEET_NAME: &str = "Default";

/// All sheets, in creation order.
///
/// A registry built through [`Registry::from_sheets`] or [`Registry::new`]
/// always holds at least one sheet, and [`Registry::remove`] refuses to drop
/// the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    sheets: Vec<Sheet>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry with a single empty `Default` sheet.
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new(DEFAULT_SHEET_NAME)],
        }
    }

    /// Builds a registry from loaded sheets.
    ///
    /// Later sheets with an already-seen name are dropped. An empty input
    /// yields the `Default` sheet.
    pub fn from_sheets(sheets: impl IntoIterator<Item = Sheet>) -> Self {
        let mut unique: Vec<Sheet> = Vec::new();
        for sheet in sheets {
            if unique.iter().any(|s| s.name() == sheet.name()) {
                tracing::warn!(sheet = %sheet.name(), "dropping duplicate sheet");
                continue;
            }
            unique.push(sheet);
        }

        if unique.is_empty() {
            return Self::new();
        }
        Self { sheets: unique }
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(Sheet::name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name() == name)
    }

    /// The first sheet in creation order.
    pub fn first(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    /// Looks up a sheet or reports it as unknown.
    pub fn require(&self, name: &str) -> Result<&Sheet, TrackerError> {
        self.get(name).ok_or_else(|| TrackerError::UnknownSheet {
            name: name.to_string(),
        })
    }

    pub fn require_mut(&mut self, name: &str) -> Result<&mut Sheet, TrackerError> {
        self.get_mut(name).ok_or_else(|| TrackerError::UnknownSheet {
            name: name.to_string(),
        })
    }

    /// Trims `name` and checks it is neither blank nor taken.
    pub fn validate_new_name(&self, name: &str) -> Result<String, TrackerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::BlankName);
        }
        if self.contains(name) {
            return Err(TrackerError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(name.to_string())
    }

    /// Appends an empty idle sheet and returns its stored name.
    pub fn add(&mut self, name: &str) -> Result<&Sheet, TrackerError> {
        let name = self.validate_new_name(name)?;
        self.sheets.push(Sheet::new(name));
        tracing::debug!(sheets = self.sheets.len(), "sheet added");
        Ok(&self.sheets[self.sheets.len() - 1])
    }

    /// Appends a fully built sheet, e.g. one migrated from legacy storage.
    pub fn insert(&mut self, sheet: Sheet) -> Result<(), TrackerError> {
        if self.contains(sheet.name()) {
            return Err(TrackerError::DuplicateName {
                name: sheet.name().to_string(),
            });
        }
        self.sheets.push(sheet);
        Ok(())
    }

    /// Merges another sheet's history into the sheet called `name`.
    pub fn merge_into(&mut self, name: &str, other: &Sheet) -> Result<(), TrackerError> {
        let target = self.require_mut(name)?;
        target.absorb(other.entries(), other.frequency());
        Ok(())
    }

    /// Deletes a sheet that is idle and not the last one.
    pub fn remove(&mut self, name: &str) -> Result<Sheet, TrackerError> {
        let index = self
            .sheets
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| TrackerError::UnknownSheet {
                name: name.to_string(),
            })?;

        if self.sheets.len() <= 1 {
            return Err(TrackerError::LastSheet);
        }
        if self.sheets[index].session().is_some() {
            return Err(TrackerError::ActiveSession {
                name: name.to_string(),
            });
        }

        Ok(self.sheets.remove(index))
    }

    /// Renames a sheet in place, keeping its position and runtime state.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<String, TrackerError> {
        self.require(from)?;
        let to = self.validate_new_name(to)?;
        if let Some(sheet) = self.get_mut(from) {
            sheet.set_name(to.clone());
        }
        Ok(to)
    }

    /// Pauses every running sheet except `except`; returns the paused names.
    ///
    /// Paused and idle sheets are left untouched.
    pub fn pause_others(&mut self, except: &str, now: NaiveDateTime) -> Vec<String> {
        let mut paused = Vec::new();
        for sheet in &mut self.sheets {
            if sheet.name() == except || !sheet.is_running() {
                continue;
            }
            if sheet.pause(now).is_ok() {
                paused.push(sheet.name().to_string());
            }
        }
        paused
    }
}
