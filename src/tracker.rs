use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::{Clock, ClockState};
use crate::history::{History, HistoryRow};
use crate::i18n::Locale;
use crate::store::{HistoryStore, KeyValueStore, LocaleStore, StorageError};
use crate::util::{date_key, epoch_millis, format_duration, LocalTimeSource, TimeSource};

/// Notification published after every state mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerChange {
    Ticked { elapsed_seconds: u64 },
    ClockStarted,
    ClockStopped,
    SessionSaved { date: String, seconds: u64 },
    SessionReset,
    HistoryCleared,
    LocaleChanged(Locale),
    StorageFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodaySummary {
    pub date: String,
    pub total_seconds: u64,
    pub session_count: usize,
}

impl TodaySummary {
    pub fn for_date(history: &History, date: &str) -> Self {
        let (total_seconds, session_count) = history.summary_for(date);
        TodaySummary {
            date: date.to_string(),
            total_seconds,
            session_count,
        }
    }

    pub fn total_display(&self) -> String {
        format_duration(self.total_seconds)
    }
}

/// Application state: the running clock, the saved history and the label
/// language, plus the stores they persist to.
pub struct SessionTracker {
    clock: Clock,
    history: History,
    history_store: HistoryStore,
    locale: Locale,
    locale_store: LocaleStore,
    time: Box<dyn TimeSource>,
    last_storage_error: Option<String>,
    subscribers: Vec<Sender<TrackerChange>>,
}

impl SessionTracker {
    /// Load history and language from `kv`.
    ///
    /// `locale_override` wins over the stored language and is persisted; with
    /// neither, the language is detected from the environment.
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Clock, locale_override: Option<Locale>) -> Self {
        Self::with_time_source(kv, clock, locale_override, Box::new(LocalTimeSource))
    }

    pub fn with_time_source(
        kv: Arc<dyn KeyValueStore>,
        clock: Clock,
        locale_override: Option<Locale>,
        time: Box<dyn TimeSource>,
    ) -> Self {
        let history_store = HistoryStore::new(kv.clone());
        let locale_store = LocaleStore::new(kv);

        let history = history_store.load();
        let stored_locale = locale_store.load();
        let locale = Locale::resolve(locale_override, stored_locale);

        let mut tracker = Self {
            clock,
            history,
            history_store,
            locale,
            locale_store,
            time,
            last_storage_error: None,
            subscribers: Vec::new(),
        };

        if stored_locale != Some(locale) {
            tracker.persist_locale();
        }

        info!(
            days = tracker.history.len(),
            locale = %tracker.locale,
            "session tracker ready"
        );
        tracker
    }

    /// Receive a [`TrackerChange`] for every later mutation
    pub fn subscribe(&mut self) -> Receiver<TrackerChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, change: TrackerChange) {
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }

    fn storage_failed(&mut self, err: &StorageError) {
        warn!("storage write failed, continuing in memory: {err}");
        let message = err.to_string();
        self.last_storage_error = Some(message.clone());
        self.publish(TrackerChange::StorageFailed(message));
    }

    pub fn start(&mut self) {
        if self.clock.start() {
            debug!("session started");
            self.publish(TrackerChange::ClockStarted);
        }
    }

    pub fn stop(&mut self) {
        if self.clock.stop() {
            debug!(elapsed = self.clock.elapsed_seconds(), "session paused");
            self.publish(TrackerChange::ClockStopped);
        }
    }

    /// Feed one clock second from timer run `generation`
    pub fn on_second(&mut self, generation: u64) {
        if self.clock.on_timer(generation) {
            let elapsed_seconds = self.clock.elapsed_seconds();
            self.publish(TrackerChange::Ticked { elapsed_seconds });
        }
    }

    /// Add one second directly, for callers driving the clock by hand
    pub fn tick(&mut self) {
        let generation = self.clock.generation();
        self.on_second(generation);
    }

    /// Fold the current session into today's record and reset the clock.
    ///
    /// Returns `Ok(false)` when there is nothing to save. The date is taken
    /// at the moment of the save. If persisting fails the session is still
    /// kept in memory and the clock still resets; the error is returned.
    pub fn save(&mut self) -> Result<bool, StorageError> {
        let elapsed = self.clock.elapsed_seconds();
        if elapsed == 0 {
            return Ok(false);
        }

        let now = self.time.now();
        let date = date_key(&now);
        let duration = i64::try_from(elapsed).unwrap_or(i64::MAX);
        let result =
            self.history_store
                .record_session(&mut self.history, &date, duration, epoch_millis(&now));

        self.clock.reset();
        info!(%date, seconds = elapsed, "session saved");
        self.publish(TrackerChange::SessionSaved {
            date,
            seconds: elapsed,
        });

        match result {
            Ok(recorded) => {
                self.last_storage_error = None;
                Ok(recorded)
            }
            Err(e) => {
                self.storage_failed(&e);
                Err(e)
            }
        }
    }

    /// Discard the unsaved session
    pub fn reset_session(&mut self) {
        self.clock.reset();
        debug!("session reset");
        self.publish(TrackerChange::SessionReset);
    }

    /// Delete every saved day. Callers confirm with the user first.
    pub fn clear_all(&mut self) -> Result<(), StorageError> {
        let result = self.history_store.clear_all(&mut self.history);
        self.clock.reset();
        info!("history cleared");
        self.publish(TrackerChange::HistoryCleared);

        match result {
            Ok(()) => {
                self.last_storage_error = None;
                Ok(())
            }
            Err(e) => {
                self.storage_failed(&e);
                Err(e)
            }
        }
    }

    pub fn set_locale(&mut self, locale: Locale) {
        if self.locale == locale {
            return;
        }
        self.locale = locale;
        self.persist_locale();
        self.publish(TrackerChange::LocaleChanged(locale));
    }

    pub fn toggle_locale(&mut self) {
        self.set_locale(self.locale.toggled());
    }

    fn persist_locale(&mut self) {
        if let Err(e) = self.locale_store.save(self.locale) {
            self.storage_failed(&e);
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn clock_state(&self) -> ClockState {
        self.clock.state()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Generation of the current clock run, see [`Clock::generation`]
    pub fn clock_generation(&self) -> u64 {
        self.clock.generation()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.clock.elapsed_seconds()
    }

    pub fn elapsed_display(&self) -> String {
        format_duration(self.clock.elapsed_seconds())
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_rows(&self) -> Vec<HistoryRow<'_>> {
        self.history.rows()
    }

    pub fn today_key(&self) -> String {
        date_key(&self.time.now())
    }

    pub fn today_summary(&self) -> TodaySummary {
        TodaySummary::for_date(&self.history, &self.today_key())
    }

    pub fn last_storage_error(&self) -> Option<&str> {
        self.last_storage_error.as_deref()
    }
}
