//! Tally CLI library.
//!
//! This crate provides the command-line and interactive shell interfaces for
//! the tally time tracker.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, ExportArgs, SheetsAction};
pub use config::{Config, ExportNaming};
