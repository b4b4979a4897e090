//! Background elapsed-time tickers, one per running sheet.
//!
//! A ticker repeatedly takes a snapshot through its probe and publishes the
//! resulting display string. It ends when the probe reports [`Tick::Stop`],
//! when [`Ticker::stop`] is called, or when the handle is dropped. The stop
//! signal is a channel the ticker waits on between ticks, so cancellation
//! does not wait for the interval to elapse.
//!
//! Publishers receive the ticker's [`StopFlag`]. A publisher that writes
//! shared state should check it under the same lock the canceller takes, so
//! a snapshot taken just before [`Ticker::stop`] is never written after it.
//!
//! Probes must only read shared state. If they lock a mutex, they must not
//! hold it across ticks.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default time between ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// The sheet is running and observed; show this text.
    Publish(String),
    /// The sheet is running but not observed; keep ticking quietly.
    Skip,
    /// The sheet stopped, paused or disappeared; end the ticker.
    Stop,
}

/// Set once a ticker has been told to stop.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Handle to a running ticker thread.
#[derive(Debug)]
pub struct Ticker {
    sheet: String,
    stopped: StopFlag,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Starts a ticker thread for `sheet`.
    pub fn spawn<P, F>(
        sheet: impl Into<String>,
        interval: Duration,
        probe: P,
        publish: F,
    ) -> io::Result<Self>
    where
        P: FnMut() -> Tick + Send + 'static,
        F: FnMut(String, &StopFlag) + Send + 'static,
    {
        let sheet = sheet.into();
        let stopped = StopFlag::default();
        let flag = stopped.clone();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name(format!("ticker:{sheet}"))
            .spawn(move || run(&stop_rx, &flag, interval, probe, publish))?;

        tracing::debug!(sheet = %sheet, interval_ms = interval.as_millis(), "ticker started");
        Ok(Self {
            sheet,
            stopped,
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Signals the thread to end without waiting for it.
    pub fn stop(&mut self) {
        self.stopped.set();
        if self.stop.take().is_some() {
            tracing::debug!(sheet = %self.sheet, "ticker stopped");
        }
    }

    /// Whether the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Signals the thread and waits for it to exit.
    ///
    /// Must not be called while holding a lock the probe takes.
    pub fn join(mut self) -> thread::Result<()> {
        self.stop();
        self.handle.take().map_or(Ok(()), JoinHandle::join)
    }

    /// Waits for the thread to end on its own, without signalling it.
    ///
    /// Blocks until the probe reports [`Tick::Stop`].
    pub fn wait(mut self) -> thread::Result<()> {
        self.handle.take().map_or(Ok(()), JoinHandle::join)
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<P, F>(
    stop: &mpsc::Receiver<()>,
    stopped: &StopFlag,
    interval: Duration,
    mut probe: P,
    mut publish: F,
) where
    P: FnMut() -> Tick,
    F: FnMut(String, &StopFlag),
{
    loop {
        match probe() {
            Tick::Stop => break,
            Tick::Skip => {}
            Tick::Publish(_) if stopped.is_set() => break,
            Tick::Publish(text) => publish(text, stopped),
        }

        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// At most one ticker per sheet.
#[derive(Debug, Default)]
pub struct Tickers {
    running: HashMap<String, Ticker>,
}

impl Tickers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a ticker, stopping any previous one for the same sheet.
    pub fn insert(&mut self, ticker: Ticker) {
        if let Some(mut previous) = self.running.insert(ticker.sheet().to_string(), ticker) {
            previous.stop();
        }
    }

    /// Stops the ticker of `sheet`; returns whether one was registered.
    pub fn cancel(&mut self, sheet: &str) -> bool {
        self.running.remove(sheet).map(|mut t| t.stop()).is_some()
    }

    pub fn cancel_all(&mut self) {
        for (_, mut ticker) in self.running.drain() {
            ticker.stop();
        }
    }

    /// Whether `sheet` has a live ticker.
    pub fn is_active(&self, sheet: &str) -> bool {
        self.running.get(sheet).is_some_and(|t| !t.is_finished())
    }

    /// Forgets tickers whose threads already exited.
    pub fn prune(&mut self) {
        self.running.retain(|_, ticker| !ticker.is_finished());
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }
}
