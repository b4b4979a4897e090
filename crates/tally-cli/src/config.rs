//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tally_core::{ExportTarget, StartMode};

/// How export files are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportNaming {
    /// One file per sheet and ISO week under `export_dir`.
    #[default]
    Weekly,
    /// A single `export_base_name` file under `export_dir`.
    BaseName,
}

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the sheets file.
    pub data_path: PathBuf,
    /// Directory exports are written under.
    pub export_dir: PathBuf,
    pub export_naming: ExportNaming,
    /// File stem used with [`ExportNaming::BaseName`].
    pub export_base_name: String,
    /// What starting a sheet does to the other running sheets.
    pub start_mode: StartMode,
    /// Milliseconds between status updates in the shell.
    pub tick_interval_ms: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("data_path", &self.data_path)
            .field("export_dir", &self.export_dir)
            .field("export_naming", &self.export_naming)
            .field("export_base_name", &self.export_base_name)
            .field("start_mode", &self.start_mode)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            data_path: data_dir.join("sheets.json"),
            export_dir: PathBuf::from("exports"),
            export_naming: ExportNaming::Weekly,
            export_base_name: "time_entries".to_string(),
            start_mode: StartMode::PauseOthers,
            tick_interval_ms: 1000,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TALLY_*)
        figment = figment.merge(Env::prefixed("TALLY_"));

        figment.extract()
    }

    /// Destination for exports given the configured naming.
    pub fn export_target(&self) -> ExportTarget {
        match self.export_naming {
            ExportNaming::Weekly => ExportTarget::Weekly {
                dir: self.export_dir.clone(),
            },
            ExportNaming::BaseName => ExportTarget::BaseName {
                base: self.export_dir.join(&self.export_base_name),
            },
        }
    }

    /// Tick interval, never shorter than 10ms.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(10))
    }
}

/// Returns the platform-specific config directory for tally.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tally"))
}

/// Returns the platform-specific data directory for tally.
///
/// On Linux: `~/.local/share/tally`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tally"))
}
