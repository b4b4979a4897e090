//! Storage layer for the time tracker.
//!
//! Persists the sheet registry as a single JSON document, rewritten whole on
//! every save.
//!
//! # Schema
//!
//! ```json
//! {
//!   "version": 2,
//!   "sheets": {
//!     "Default": {
//!       "entries": {"2024-01-01": [{"date": "...", "start_time": "...", ...}]},
//!       "frequency": {"Design review": 3},
//!       "session": null,
//!       "start_time": null,
//!       "paused": false,
//!       "paused_elapsed": 0
//!     }
//!   }
//! }
//! ```
//!
//! Sheet and date keys keep their order through a load/save cycle. The four
//! runtime fields are always written idle and ignored on read, so a process
//! never resumes a session from disk. Files without `version` are read with
//! the same layout.
//!
//! Before multiple sheets existed, history lived in two files: a
//! `date -> [entry]` map and a `description -> count` map. [`load_legacy`]
//! reads that pair back as one sheet.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_core::{EntryStore, Frequency, PersistError, Registry, RegistryStore, Sheet};
use thiserror::Error;

/// Schema version written by [`JsonStore::save`].
pub const SCHEMA_VERSION: u32 = 2;

/// Legacy single-sheet entries file name.
pub const LEGACY_ENTRIES_FILE: &str = "time_entries.json";

/// Legacy single-sheet frequency file name.
pub const LEGACY_FREQUENCY_FILE: &str = "description_frequency.json";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a file failed.
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A file was not valid JSON of the expected shape.
    #[error("invalid JSON in {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Serialize)]
struct FileOut<'a> {
    version: u32,
    #[serde(serialize_with = "tally_core::ordered::serialize")]
    sheets: Vec<(String, SheetOut<'a>)>,
}

/// A sheet as written: history plus idle runtime placeholders.
#[derive(Serialize)]
struct SheetOut<'a> {
    entries: &'a EntryStore,
    frequency: &'a Frequency,
    session: Option<String>,
    start_time: Option<String>,
    paused: bool,
    paused_elapsed: u64,
}

impl<'a> SheetOut<'a> {
    const fn idle(sheet: &'a Sheet) -> Self {
        Self {
            entries: sheet.entries(),
            frequency: sheet.frequency(),
            session: None,
            start_time: None,
            paused: false,
            paused_elapsed: 0,
        }
    }
}

#[derive(Deserialize)]
struct FileIn {
    #[serde(default)]
    version: Option<u32>,
    #[serde(with = "tally_core::ordered")]
    sheets: Vec<(String, SheetIn)>,
}

/// A sheet as read; runtime fields are not even looked at.
#[derive(Deserialize)]
struct SheetIn {
    #[serde(default)]
    entries: EntryStore,
    #[serde(default)]
    frequency: Frequency,
}

/// JSON file holding every sheet.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the registry, recovering from any problem with defaults.
    ///
    /// A missing file is normal on first run. An unreadable or malformed
    /// file is logged and treated as absent. The result always holds at
    /// least one sheet.
    pub fn load(&self) -> Registry {
        match self.try_load() {
            Ok(Some(registry)) => registry,
            Ok(None) => {
                tracing::debug!(path = %self.path.display(), "no sheets file; starting fresh");
                Registry::new()
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "could not load sheets; starting fresh"
                );
                Registry::new()
            }
        }
    }

    /// Loads the registry, reporting problems. `Ok(None)` means no file.
    pub fn try_load(&self) -> Result<Option<Registry>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let file: FileIn =
            serde_json::from_str(&content).map_err(|e| StoreError::json(&self.path, e))?;
        if let Some(version) = file.version.filter(|v| *v > SCHEMA_VERSION) {
            tracing::warn!(version, supported = SCHEMA_VERSION, "sheets file is newer than this build");
        }

        let sheets = file
            .sheets
            .into_iter()
            .map(|(name, sheet)| Sheet::with_history(name, sheet.entries, sheet.frequency));
        let registry = Registry::from_sheets(sheets);
        tracing::debug!(
            path = %self.path.display(),
            sheets = registry.len(),
            "loaded sheets"
        );
        Ok(Some(registry))
    }

    /// Writes the registry atomically through a temporary sibling file.
    pub fn write(&self, registry: &Registry) -> Result<(), StoreError> {
        let file = FileOut {
            version: SCHEMA_VERSION,
            sheets: registry
                .iter()
                .map(|sheet| (sheet.name().to_string(), SheetOut::idle(sheet)))
                .collect(),
        };
        let content =
            serde_json::to_string_pretty(&file).map_err(|e| StoreError::json(&self.path, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, content).map_err(|e| StoreError::io(&tmp_path, e))?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::io(&self.path, e));
        }

        tracing::debug!(path = %self.path.display(), sheets = registry.len(), "saved sheets");
        Ok(())
    }
}

impl RegistryStore for JsonStore {
    fn save(&self, registry: &Registry) -> Result<(), PersistError> {
        self.write(registry).map_err(|e| {
            let source = match e {
                StoreError::Io { source, .. } => source,
                StoreError::Json { source, .. } => io::Error::other(source),
            };
            PersistError {
                path: self.path.clone(),
                source,
            }
        })
    }
}

/// Reads the legacy single-sheet file pair into one sheet named `name`.
///
/// The entries file must exist. A missing frequency file yields an empty
/// table.
pub fn load_legacy(
    entries_path: &Path,
    frequency_path: &Path,
    name: &str,
) -> Result<Sheet, StoreError> {
    let content =
        fs::read_to_string(entries_path).map_err(|e| StoreError::io(entries_path, e))?;
    let entries: EntryStore =
        serde_json::from_str(&content).map_err(|e| StoreError::json(entries_path, e))?;

    let frequency = match fs::read_to_string(frequency_path) {
        Ok(content) => {
            serde_json::from_str(&content).map_err(|e| StoreError::json(frequency_path, e))?
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(
                path = %frequency_path.display(),
                "legacy frequency file missing; suggestions start empty"
            );
            Frequency::new()
        }
        Err(e) => return Err(StoreError::io(frequency_path, e)),
    };

    tracing::debug!(
        sheet = %name,
        entries = entries.len(),
        descriptions = frequency.len(),
        "loaded legacy sheet"
    );
    Ok(Sheet::with_history(name, entries, frequency))
}
