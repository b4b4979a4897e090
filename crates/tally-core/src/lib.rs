//! Core domain logic for the tally time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Sheets: independent timers with their own history and suggestions
//! - Tracking: the `Idle -> Running -> Paused` lifecycle and pause-others
//! - Export: weekly TXT and CSV reports of a sheet's entries
//! - Tickers: background threads publishing elapsed-time status lines
//!
//! Nothing here reads the wall clock; callers pass timestamps in.

pub mod duration;
pub mod entry;
pub mod error;
pub mod export;
pub mod ordered;
pub mod registry;
pub mod sheet;
pub mod suggest;
pub mod ticker;
pub mod tracker;

pub use duration::{format_clock, format_duration};
pub use entry::{DATE_FORMAT, Entry, EntryStore, TIME_FORMAT};
pub use error::{PersistError, TrackerError};
pub use export::{ExportError, ExportFormat, ExportOptions, ExportTarget};
pub use registry::{DEFAULT_SHEET_NAME, Registry};
pub use sheet::{ActiveSession, Sheet, SheetState, StartMode, StopOutcome};
pub use suggest::{Frequency, QUICK_PICK_COUNT, Suggestion, description_from_label};
pub use ticker::{DEFAULT_TICK_INTERVAL, StopFlag, Tick, Ticker, Tickers};
pub use tracker::{RegistryStore, SheetView, Started, Toggled, Tracker};
