use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::fix::Fix;

/// User-issued lifecycle triggers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Start when stopped, stop otherwise
    StartStop,
    Pause,
    Resume,
}

/// Unified event type consumed by the tracker loop
#[derive(Clone, Debug, PartialEq)]
pub enum RunEvent {
    Trigger(Trigger),
    Fix(Fix),
    /// Position acquisition failed
    PositionUnavailable,
    /// One timer period elapsed for the given timer generation
    Tick { generation: u64 },
    /// Nothing arrived within the runner's wait interval
    Idle,
}

/// Source of tracker events (triggers, fixes, ticks)
pub trait RunEventSource: 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<RunEvent, RecvTimeoutError>;
}

/// Channel-backed event source; producers hold clones of the sender
pub struct ChannelEventSource {
    tx: Sender<RunEvent>,
    rx: Receiver<RunEvent>,
}

impl ChannelEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<RunEvent> {
        self.tx.clone()
    }
}

impl Default for ChannelEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RunEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<RunEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
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

/// Runner that hands the tracker one event at a time
pub struct Runner<E: RunEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: RunEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn event_source(&self) -> &E {
        &self.event_source
    }

    /// Blocks up to one ticker interval and returns the next event, or Idle on timeout
    pub fn step(&self) -> RunEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => RunEvent::Idle,
        }
    }
}
