//! Interactive tracking shell (`tally shell`).
//!
//! The shell is the long-lived front end: it owns the tracker for the whole
//! process, so running and paused sessions exist only here. A background
//! ticker per running sheet keeps the latest status line current; `status`
//! prints it and `watch` follows it for a while.
//!
//! Input and output are generic so tests can drive the shell with a script.

use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use tally_core::{
    ExportTarget, RegistryStore, SheetState, StartMode, StopFlag, StopOutcome, Ticker, Tickers,
    TrackerError, Tracker,
};

use super::{descriptions, entries, export, reset, sheets};
use crate::cli::ExportArgs;

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// The local wall clock.
pub fn local_clock() -> Clock {
    Arc::new(|| Local::now().naive_local())
}

/// Longest `watch` accepted, in seconds.
const MAX_WATCH_SECONDS: u64 = 24 * 60 * 60;

/// Settings the shell takes from configuration.
#[derive(Debug, Clone)]
pub struct ShellOptions {
    pub start_mode: StartMode,
    pub tick_interval: Duration,
    pub export_target: ExportTarget,
}

/// One line of shell input.
#[derive(Debug, Parser)]
#[command(
    name = "tally",
    no_binary_name = true,
    disable_version_flag = true,
    help_template = "{subcommands}"
)]
struct Line {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    /// List sheets.
    Sheets,
    /// Switch the current sheet.
    Select { name: Vec<String> },
    /// Create a sheet and switch to it.
    Add { name: Vec<String> },
    /// Delete an idle sheet.
    Remove { name: Vec<String> },
    /// Rename a sheet (quote names with spaces).
    Rename { from: String, to: String },
    /// Start tracking the current sheet.
    Start {
        /// Leave other running sheets alone.
        #[arg(long)]
        concurrent: bool,
    },
    /// Stop the current sheet and record an entry.
    Stop {
        /// Description; prompts when omitted.
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Resume if paused, stop if running, start otherwise.
    Toggle {
        #[arg(long)]
        concurrent: bool,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Pause a running sheet (defaults to the current sheet).
    Pause { name: Vec<String> },
    /// Resume the current sheet.
    Resume,
    /// Show the current status line.
    Status,
    /// Follow the status line.
    Watch {
        #[arg(
            long,
            default_value_t = 5,
            value_parser = clap::value_parser!(u64).range(1..=MAX_WATCH_SECONDS)
        )]
        seconds: u64,
    },
    /// Show the current sheet's entries.
    Entries,
    /// Show ranked descriptions of the current sheet.
    Descriptions,
    /// Delete the current sheet's entries.
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Export the current sheet.
    Export(ExportArgs),
    /// Leave the shell.
    #[command(alias = "exit")]
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

/// Splits a line into words, keeping double-quoted runs together.
fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    words.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        words.push(current);
    }
    words
}

fn join_name(words: &[String]) -> String {
    words.join(" ")
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Interactive session over a tracker.
pub struct Shell<S> {
    tracker: Arc<Mutex<Tracker<S>>>,
    tickers: Tickers,
    status: Arc<Mutex<String>>,
    options: ShellOptions,
    clock: Clock,
}

impl<S: RegistryStore + Send + 'static> Shell<S> {
    pub fn new(tracker: Tracker<S>, options: ShellOptions, clock: Clock) -> Self {
        let status = tracker.tick(clock());
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            tickers: Tickers::new(),
            status: Arc::new(Mutex::new(status)),
            options,
            clock,
        }
    }

    /// Locks the shared tracker.
    pub fn tracker(&self) -> MutexGuard<'_, Tracker<S>> {
        lock(&self.tracker)
    }

    /// Whether a ticker is live for `sheet`.
    pub fn is_ticking(&self, sheet: &str) -> bool {
        self.tickers.is_active(sheet)
    }

    /// Reads commands until `quit` or end of input.
    ///
    /// Tickers keep running afterwards; call [`Shell::finish`] to end them.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> Result<()> {
        loop {
            write!(out, "{}> ", self.tracker().current_sheet())?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line).context("failed to read input")? == 0 {
                writeln!(out)?;
                return Ok(());
            }
            let words = split_words(&line);
            if words.is_empty() {
                continue;
            }

            match Line::try_parse_from(words) {
                Ok(parsed) => match self.dispatch(parsed.command, input, out) {
                    Ok(Flow::Quit) => return Ok(()),
                    Ok(Flow::Continue) => {}
                    Err(e) => writeln!(out, "error: {e:#}")?,
                },
                Err(e) => write!(out, "{}", e.render())?,
            }
            self.tickers.prune();
        }
    }

    fn dispatch<R: BufRead, W: Write>(
        &mut self,
        command: ShellCommand,
        input: &mut R,
        out: &mut W,
    ) -> Result<Flow> {
        let now = (self.clock)();
        match command {
            ShellCommand::Quit => return Ok(Flow::Quit),
            ShellCommand::Sheets => {
                let views = self.tracker().list_sheets();
                write!(out, "{}", sheets::format_sheets(&views))?;
            }
            ShellCommand::Select { name } => {
                self.tracker().select_sheet(&join_name(&name))?;
                self.refresh_status(now);
            }
            ShellCommand::Add { name } => {
                let name = self.tracker().add_sheet(&join_name(&name))?;
                self.refresh_status(now);
                writeln!(out, "Added sheet '{name}'")?;
            }
            ShellCommand::Remove { name } => {
                let name = join_name(&name);
                self.tracker().remove_sheet(&name)?;
                self.tickers.cancel(&name);
                self.refresh_status(now);
                writeln!(out, "Removed sheet '{name}'")?;
            }
            ShellCommand::Rename { from, to } => {
                let to = self.tracker().rename_sheet(&from, &to)?;
                // tickers are keyed by name
                if self.tickers.cancel(&from) {
                    self.spawn_ticker(&to)?;
                }
                self.refresh_status(now);
                writeln!(out, "Renamed sheet '{from}' to '{to}'")?;
            }
            ShellCommand::Start { concurrent } => self.start(self.mode(concurrent), now, out)?,
            ShellCommand::Stop { message } => self.stop(message, now, input, out)?,
            ShellCommand::Toggle {
                concurrent,
                message,
            } => {
                let state = self.tracker().current().state();
                match state {
                    SheetState::Idle => self.start(self.mode(concurrent), now, out)?,
                    SheetState::Paused => self.resume(now, out)?,
                    SheetState::Running => self.stop(message, now, input, out)?,
                }
            }
            ShellCommand::Pause { name } => {
                let name = if name.is_empty() {
                    self.tracker().current_sheet().to_string()
                } else {
                    join_name(&name)
                };
                self.tracker().pause_sheet(&name, now)?;
                self.tickers.cancel(&name);
                self.refresh_status(now);
                writeln!(out, "Paused '{name}'")?;
            }
            ShellCommand::Resume => self.resume(now, out)?,
            ShellCommand::Status => {
                self.refresh_status(now);
                writeln!(out, "{}", lock(&self.status))?;
            }
            ShellCommand::Watch { seconds } => self.watch(Duration::from_secs(seconds), out)?,
            ShellCommand::Entries => {
                let text = {
                    let tracker = self.tracker();
                    entries::format_entries(tracker.current_sheet(), &tracker.entry_rows())
                };
                write!(out, "{text}")?;
            }
            ShellCommand::Descriptions => {
                let text = descriptions::format_suggestions(&self.tracker().suggestions());
                write!(out, "{text}")?;
            }
            ShellCommand::Reset { yes } => {
                if yes || confirm(input, out, "Delete every entry on this sheet? [y/N] ")? {
                    let line = reset::reset(&mut *self.tracker())?;
                    writeln!(out, "{line}")?;
                    self.set_status(line);
                } else {
                    writeln!(out, "Reset cancelled")?;
                }
            }
            ShellCommand::Export(args) => self.export(&args, now, out)?,
        }
        Ok(Flow::Continue)
    }

    const fn mode(&self, concurrent: bool) -> StartMode {
        if concurrent {
            StartMode::Concurrent
        } else {
            self.options.start_mode
        }
    }

    fn start<W: Write>(&mut self, mode: StartMode, now: NaiveDateTime, out: &mut W) -> Result<()> {
        let started = self.tracker().start_tracking(mode, now)?;
        for name in &started.paused {
            self.tickers.cancel(name);
            writeln!(out, "Paused '{name}'")?;
        }
        self.spawn_ticker(&started.sheet)?;
        self.refresh_status(now);
        writeln!(out, "{}", lock(&self.status))?;
        Ok(())
    }

    fn resume<W: Write>(&mut self, now: NaiveDateTime, out: &mut W) -> Result<()> {
        let sheet = {
            let mut tracker = self.tracker();
            tracker.resume_tracking(now)?;
            tracker.current_sheet().to_string()
        };
        self.spawn_ticker(&sheet)?;
        self.refresh_status(now);
        writeln!(out, "{}", lock(&self.status))?;
        Ok(())
    }

    fn stop<R: BufRead, W: Write>(
        &mut self,
        message: Option<String>,
        now: NaiveDateTime,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        let (sheet, suggestions, listing) = {
            let tracker = self.tracker();
            let sheet = tracker.current();
            if sheet.state() == SheetState::Idle {
                return Err(TrackerError::NotTracking {
                    name: sheet.name().to_string(),
                }
                .into());
            }
            let ranked = tracker.suggestions();
            (
                sheet.name().to_string(),
                ranked
                    .iter()
                    .map(|s| s.description.to_string())
                    .collect::<Vec<_>>(),
                descriptions::format_suggestions(&ranked),
            )
        };

        let description = match message {
            Some(message) => Some(message),
            None => prompt_description(input, out, &suggestions, &listing)?,
        };

        let outcome = self.tracker().stop_tracking(description.as_deref(), now);
        // the session is over even if saving failed
        if self.tracker().sheet(&sheet).is_ok_and(|s| s.state() == SheetState::Idle) {
            self.tickers.cancel(&sheet);
        }
        let line = match outcome? {
            StopOutcome::Recorded(entry) => {
                format!(
                    "[{sheet}] Session completed: {} - {}",
                    entry.duration, entry.description
                )
            }
            StopOutcome::Cancelled => format!("[{sheet}] Session discarded"),
        };
        self.set_status(line.clone());
        writeln!(out, "{line}")?;
        Ok(())
    }

    fn export<W: Write>(&self, args: &ExportArgs, now: NaiveDateTime, out: &mut W) -> Result<()> {
        let mut tracker = self.tracker();
        let previous = tracker.current_sheet().to_string();
        if let Some(sheet) = &args.sheet {
            tracker.select_sheet(sheet)?;
        }
        let result = export::export(&*tracker, args, &self.options.export_target, now.date());
        tracker.select_sheet(&previous)?;
        drop(tracker);

        writeln!(out, "Exported to {}", result?.display())?;
        Ok(())
    }

    /// Prints the status line whenever it changes, for `duration`.
    fn watch<W: Write>(&mut self, duration: Duration, out: &mut W) -> Result<()> {
        let deadline = Instant::now() + duration.min(Duration::from_secs(MAX_WATCH_SECONDS));
        self.refresh_status((self.clock)());
        let mut last = String::new();
        loop {
            let current = lock(&self.status).clone();
            if current != last {
                writeln!(out, "{current}")?;
                out.flush()?;
                last = current;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(self.options.tick_interval.min(deadline - now));
        }
        Ok(())
    }

    fn spawn_ticker(&mut self, sheet: &str) -> Result<()> {
        let tracker = Arc::clone(&self.tracker);
        let clock = Arc::clone(&self.clock);
        let status = Arc::clone(&self.status);
        let name = sheet.to_string();

        let ticker = Ticker::spawn(
            sheet,
            self.options.tick_interval,
            move || lock(&tracker).tick_sheet(&name, clock()),
            move |text, stopped: &StopFlag| {
                let mut status = lock(&status);
                if !stopped.is_set() {
                    *status = text;
                }
            },
        )
        .context("failed to start ticker thread")?;
        self.tickers.insert(ticker);
        Ok(())
    }

    fn refresh_status(&self, now: NaiveDateTime) {
        let text = self.tracker().tick(now);
        self.set_status(text);
    }

    fn set_status(&self, text: String) {
        *lock(&self.status) = text;
    }

    /// Stops every ticker and reports sessions that will be lost.
    pub fn finish<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.tickers.cancel_all();
        let active: Vec<String> = self
            .tracker()
            .list_sheets()
            .into_iter()
            .filter(|v| v.state != SheetState::Idle)
            .map(|v| v.name)
            .collect();
        if !active.is_empty() {
            tracing::warn!(sheets = ?active, "discarding unfinished sessions");
            writeln!(out, "Discarding unfinished sessions: {}", active.join(", "))?;
        }
        Ok(())
    }
}

/// Asks for a description until one is given or the user cancels.
///
/// A blank line or end of input cancels. `#N` picks the Nth suggestion.
fn prompt_description<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    suggestions: &[String],
    listing: &str,
) -> Result<Option<String>> {
    if !suggestions.is_empty() {
        write!(out, "{listing}")?;
    }
    loop {
        write!(out, "Description (blank to cancel): ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).context("failed to read input")? == 0 {
            return Ok(None);
        }
        let answer = line.trim();
        if answer.is_empty() {
            return Ok(None);
        }

        let Some(pick) = answer.strip_prefix('#') else {
            return Ok(Some(answer.to_string()));
        };
        match pick.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
            Some(index) if index < suggestions.len() => {
                return Ok(Some(suggestions[index].clone()));
            }
            _ => writeln!(out, "No suggestion {answer}")?,
        }
    }
}

fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<bool> {
    write!(out, "{question}")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("failed to read input")?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

/// Runs `tally shell` on stdin and stdout.
pub fn run<S: RegistryStore + Send + 'static>(tracker: Tracker<S>, options: ShellOptions) -> Result<()> {
    let mut shell = Shell::new(tracker, options, local_clock());
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "tally shell. Type 'help' for commands.")?;
    shell.run(&mut stdin.lock(), &mut out)?;
    shell.finish(&mut out)
}
