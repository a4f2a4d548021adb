use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::trace;

use crate::runtime::AppEvent;

pub const CLOCK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
}

/// Background thread posting [`AppEvent::Second`] every interval until cancelled.
///
/// The thread never touches clock state, it only sends messages tagged with
/// the generation it was started for.
#[derive(Debug)]
pub struct RepeatingTimer {
    cancel_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RepeatingTimer {
    pub fn spawn(interval: Duration, generation: u64, tx: Sender<AppEvent>) -> Self {
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || loop {
            match cancel_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    if tx.send(AppEvent::Second(generation)).is_err() {
                        break;
                    }
                }
                // explicit cancel or the owner went away
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        Self {
            cancel_tx: Some(cancel_tx),
            handle: Some(handle),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Session stopwatch: counts whole seconds while running.
///
/// Each tick adds exactly one second. Nothing is derived from wall-clock
/// time, so a suspended process under-counts rather than jumps.
#[derive(Debug)]
pub struct Clock {
    state: ClockState,
    elapsed_seconds: u64,
    generation: u64,
    interval: Duration,
    tick_tx: Option<Sender<AppEvent>>,
    timer: Option<RepeatingTimer>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::manual()
    }
}

impl Clock {
    /// Clock that schedules its own ticks on `tick_tx`
    pub fn new(tick_tx: Sender<AppEvent>, interval: Duration) -> Self {
        let mut clock = Self::manual();
        clock.tick_tx = Some(tick_tx);
        clock.interval = interval;
        clock
    }

    /// Clock without a timer thread; ticks are fed through [`Clock::tick`]
    pub fn manual() -> Self {
        Self {
            state: ClockState::Stopped,
            elapsed_seconds: 0,
            generation: 0,
            interval: CLOCK_INTERVAL,
            tick_tx: None,
            timer: None,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Generation of the current run; ticks from earlier runs are stale
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false when the clock was already running
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = ClockState::Running;
        self.generation += 1;
        if let Some(tx) = &self.tick_tx {
            self.timer = Some(RepeatingTimer::spawn(
                self.interval,
                self.generation,
                tx.clone(),
            ));
        }
        trace!(generation = self.generation, "clock started");
        true
    }

    /// Returns false when the clock was already stopped
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = ClockState::Stopped;
        self.cancel_timer();
        trace!(elapsed = self.elapsed_seconds, "clock stopped");
        true
    }

    /// Advance by one second if running
    pub fn tick(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.elapsed_seconds += 1;
        true
    }

    /// Handle a timer message, ignoring any that belong to a cancelled run
    pub fn on_timer(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.tick()
    }

    /// Back to zero and stopped
    pub fn reset(&mut self) {
        self.stop();
        self.elapsed_seconds = 0;
    }

    fn cancel_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
