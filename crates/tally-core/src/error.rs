//! Errors reported by tracker operations.

use std::path::PathBuf;

use thiserror::Error;

/// Rejections and failures of tracker operations.
///
/// Every variant except [`TrackerError::Persist`] leaves state untouched.
///
/// A blank sheet name gets its own [`TrackerError::BlankName`] rather than
/// being reported as a name clash.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("a sheet named '{name}' already exists")]
    DuplicateName { name: String },

    #[error("sheet name cannot be empty")]
    BlankName,

    #[error("no sheet named '{name}'")]
    UnknownSheet { name: String },

    #[error("at least one sheet must remain")]
    LastSheet,

    #[error("sheet '{name}' has an active session; stop tracking first")]
    ActiveSession { name: String },

    #[error("sheet '{name}' is already tracking")]
    AlreadyTracking { name: String },

    #[error("sheet '{name}' is not tracking")]
    NotTracking { name: String },

    #[error("sheet '{name}' is not paused")]
    NotPaused { name: String },

    #[error("description cannot be empty")]
    EmptyDescription,

    /// The in-memory change was applied but could not be written out.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Failure to write the sheet registry to durable storage.
#[derive(Debug, Error)]
#[error("failed to save sheets to {}", path.display())]
pub struct PersistError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
