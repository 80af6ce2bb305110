use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::analysis::AnalysisOutcome;

/// Unified event type consumed by the app runner
#[derive(Debug)]
pub enum PulseEvent {
    /// A key event stamped with the instant the reader saw it
    Key { key: KeyEvent, at: Instant },
    Resize,
    Tick,
    Analysis(AnalysisOutcome),
}

impl PulseEvent {
    pub fn key(key: KeyEvent) -> Self {
        PulseEvent::Key {
            key,
            at: Instant::now(),
        }
    }
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait PulseEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<PulseEvent, RecvTimeoutError>;

    /// Handle other producers (the analysis worker) use to post into this source
    fn sender(&self) -> Sender<PulseEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<PulseEvent>,
    rx: Receiver<PulseEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let reader_tx = tx.clone();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if reader_tx.send(PulseEvent::key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if reader_tx.send(PulseEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PulseEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<PulseEvent> {
        self.tx.clone()
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-backed event source for headless runs and tests
pub struct TestEventSource {
    tx: Sender<PulseEvent>,
    rx: Receiver<PulseEvent>,
}

impl TestEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for TestEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PulseEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<PulseEvent> {
        self.tx.clone()
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: PulseEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: PulseEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn sender(&self) -> Sender<PulseEvent> {
        self.event_source.sender()
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> PulseEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => PulseEvent::Tick,
        }
    }
}
