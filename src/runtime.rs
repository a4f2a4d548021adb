use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};
use tracing::error;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// Redraw heartbeat, sent when nothing else arrived within the tick interval
    Tick,
    /// One clock second from the timer run with this generation
    Second(u64),
}

/// Source of app events (keyboard, resize, clock seconds)
pub trait AppEventSource: Send + 'static {
    /// Next event, or `Err(Timeout)` once `timeout` passes without one
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;

    /// Sender feeding this source, handed to the clock timer
    fn sender(&self) -> Sender<AppEvent>;
}

/// Events queued on an in-process channel. Tests push to it directly.
pub struct ChannelEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

pub type TestEventSource = ChannelEventSource;

impl ChannelEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for ChannelEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

/// Terminal input read on a background thread and queued with the clock seconds
pub struct CrosstermEventSource {
    queue: ChannelEventSource,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let queue = ChannelEventSource::new();
        let input_tx = queue.sender();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // windows reports both press and release
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    input_tx.send(AppEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => input_tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    error!("terminal input failed: {e}");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { queue }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.queue.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<AppEvent> {
        self.queue.sender()
    }
}

/// How long the runner waits before yielding a redraw tick
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

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

/// Hands the app one event at a time, falling back to `Tick`
pub struct Runner<E: AppEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: AppEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn sender(&self) -> Sender<AppEvent> {
        self.event_source.sender()
    }

    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(_) => AppEvent::Tick,
        }
    }
}
