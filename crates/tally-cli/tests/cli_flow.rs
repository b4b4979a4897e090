//! End-to-end tests running the `tally` binary against a temporary data file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// A temp home with a config file pointing every path inside it.
struct Env {
    dir: TempDir,
    config: PathBuf,
}

impl Env {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("tally.toml");
        let data_path = dir.path().join("data/sheets.json");
        let export_dir = dir.path().join("exports");
        std::fs::write(
            &config,
            format!(
                "data_path = {:?}\nexport_dir = {:?}\ntick_interval_ms = 50\n",
                data_path.to_string_lossy(),
                export_dir.to_string_lossy()
            ),
        )
        .unwrap();
        Self { dir, config }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn data_path(&self) -> PathBuf {
        self.path().join("data/sheets.json")
    }

    fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_tally"));
        command
            .env("HOME", self.path())
            .env_remove("XDG_CONFIG_HOME")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config);
        command
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .output()
            .expect("failed to run tally")
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "tally {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn shell(&self, script: &str) -> String {
        let mut child = self
            .command()
            .arg("shell")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn tally shell");

        child
            .stdin
            .as_mut()
            .unwrap()
            .write_all(script.as_bytes())
            .unwrap();
        let output = child.wait_with_output().unwrap();
        assert!(
            output.status.success(),
            "shell failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }
}

#[test]
fn test_no_subcommand_prints_help() {
    let env = Env::new();
    let stdout = env.run_ok(&[]);
    assert!(stdout.contains("Usage:"), "{stdout}");
    assert!(stdout.contains("shell"), "{stdout}");
}

#[test]
fn test_fresh_install_has_default_sheet() {
    let env = Env::new();
    let stdout = env.run_ok(&["sheets", "list", "--json"]);
    let sheets: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(sheets[0]["name"], "Default");
    assert_eq!(sheets[0]["state"], "idle");
    assert_eq!(sheets.as_array().unwrap().len(), 1);
}

#[test]
fn test_sheet_management_persists() {
    let env = Env::new();
    env.run_ok(&["sheets", "add", "Client work"]);
    env.run_ok(&["sheets", "add", "Internal"]);
    env.run_ok(&["sheets", "rename", "Internal", "Admin"]);

    let duplicate = env.run(&["sheets", "add", "Admin"]);
    assert!(!duplicate.status.success());
    assert!(String::from_utf8_lossy(&duplicate.stderr).contains("already exists"));

    env.run_ok(&["sheets", "remove", "Default"]);

    let stdout = env.run_ok(&["sheets", "list", "--json"]);
    let sheets: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let names: Vec<&str> = sheets
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Client work", "Admin"]);
}

#[test]
fn test_remove_last_sheet_fails() {
    let env = Env::new();
    let output = env.run(&["sheets", "remove", "Default"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("at least one sheet must remain"));
}

#[test]
fn test_shell_session_is_recorded_and_exported() {
    let env = Env::new();
    let stdout = env.shell("add Client work\nstart\nstop -m \"Design review\"\nquit\n");
    assert!(
        stdout.contains("[Client work] Session completed:"),
        "{stdout}"
    );

    let entries = env.run_ok(&["entries", "--sheet", "Client work", "--json"]);
    let entries: serde_json::Value = serde_json::from_str(&entries).unwrap();
    assert_eq!(entries[0]["description"], "Design review");

    let descriptions = env.run_ok(&["descriptions", "--sheet", "Client work"]);
    assert!(descriptions.contains("Design review"), "{descriptions}");

    let base = env.path().join("out/report");
    let stdout = env.run_ok(&[
        "export",
        "--sheet",
        "Client work",
        "--format",
        "csv",
        "--output",
        base.to_str().unwrap(),
    ]);
    assert!(stdout.contains("report.csv"), "{stdout}");

    let csv = std::fs::read_to_string(env.path().join("out/report.csv")).unwrap();
    assert!(csv.starts_with("Date,Start Time,End Time,Duration,Description\r\n"));
    assert!(csv.contains(",Design review\r\n"), "{csv}");
}

#[test]
fn test_weekly_export_uses_sheet_folder() {
    let env = Env::new();
    env.shell("add Client work\nstart\nstop -m Review\n");

    env.run_ok(&["export", "--sheet", "Client work"]);
    let folder = env.path().join("exports/Client_work");
    let files: Vec<_> = std::fs::read_dir(&folder)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("sheet_W"), "{files:?}");
    assert!(
        Path::new(&files[0])
            .extension()
            .is_some_and(|ext| ext == "txt")
    );
}

#[test]
fn test_export_empty_sheet_fails() {
    let env = Env::new();
    let output = env.run(&["export"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no time entries to export"));
    assert!(!env.path().join("exports").exists());
}

#[test]
fn test_reset_requires_yes() {
    let env = Env::new();
    env.shell("start\nstop -m Email\n");

    let refused = env.run(&["reset"]);
    assert!(!refused.status.success());

    let stdout = env.run_ok(&["reset", "--yes"]);
    assert_eq!(stdout.trim(), "[Default] All entries cleared");

    let entries = env.run_ok(&["entries", "--json"]);
    assert_eq!(entries.trim(), "[]");
    // frequency survives a reset
    let descriptions = env.run_ok(&["descriptions"]);
    assert!(descriptions.contains("Email"), "{descriptions}");
}

#[test]
fn test_running_session_is_not_persisted() {
    let env = Env::new();
    let stdout = env.shell("start\nstop -m Email\nstart\n");
    assert!(stdout.contains("Discarding unfinished sessions: Default"), "{stdout}");

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(env.data_path()).unwrap()).unwrap();
    assert_eq!(raw["version"], 2);
    assert!(
        raw["sheets"]
            .as_object()
            .unwrap()
            .values()
            .all(|s| s["session"].is_null())
    );
}

#[test]
fn test_corrupt_data_file_starts_fresh() {
    let env = Env::new();
    std::fs::create_dir_all(env.data_path().parent().unwrap()).unwrap();
    std::fs::write(env.data_path(), "{ broken").unwrap();

    let stdout = env.run_ok(&["sheets", "list"]);
    assert!(stdout.contains("Default"), "{stdout}");
}

#[test]
fn test_migrate_legacy_files() {
    let env = Env::new();
    let entries = env.path().join("time_entries.json");
    let frequency = env.path().join("description_frequency.json");
    std::fs::write(
        &entries,
        r#"{"2024-01-01": [{"date": "2024-01-01", "start_time": "09:00:00",
            "end_time": "09:30:00", "duration": "30m 0s", "description": "Standup"}]}"#,
    )
    .unwrap();
    std::fs::write(&frequency, r#"{"Standup": 3}"#).unwrap();

    let stdout = env.run_ok(&[
        "migrate",
        "--entries",
        entries.to_str().unwrap(),
        "--frequency",
        frequency.to_str().unwrap(),
        "--sheet",
        "Legacy",
    ]);
    assert!(stdout.contains("Migrated 1 entries and 1 descriptions"), "{stdout}");

    let descriptions = env.run_ok(&["descriptions", "--sheet", "Legacy"]);
    assert!(descriptions.contains("Standup (3 times)"), "{descriptions}");

    let again = env.run(&[
        "migrate",
        "--entries",
        entries.to_str().unwrap(),
        "--frequency",
        frequency.to_str().unwrap(),
        "--sheet",
        "Legacy",
    ]);
    assert!(!again.status.success());
}
