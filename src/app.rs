use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::i18n::{Label, Locale};
use crate::runtime::AppEvent;
use crate::tracker::SessionTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Timer,
    ConfirmClear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Top-level TUI state: the tracker plus what is on screen
pub struct App {
    pub tracker: SessionTracker,
    pub screen: Screen,
    pub history_scroll: usize,
    /// Ask before `clear_all`
    pub confirm_clear: bool,
    /// One-line feedback from the last action
    pub status: Option<Label>,
}

impl App {
    pub fn new(tracker: SessionTracker, confirm_clear: bool) -> Self {
        Self {
            tracker,
            screen: Screen::Timer,
            history_scroll: 0,
            confirm_clear,
            status: None,
        }
    }

    pub fn on_event(&mut self, event: AppEvent) -> Flow {
        match event {
            AppEvent::Key(key) => self.on_key(key),
            AppEvent::Second(generation) => {
                self.tracker.on_second(generation);
                Flow::Continue
            }
            AppEvent::Tick | AppEvent::Resize => Flow::Continue,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        match self.screen {
            Screen::Timer => self.on_timer_key(key),
            Screen::ConfirmClear => {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => {
                        self.clear_all();
                        self.screen = Screen::Timer;
                    }
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                        debug!("clear all cancelled");
                        self.screen = Screen::Timer;
                    }
                    _ => {}
                }
                Flow::Continue
            }
        }
    }

    fn on_timer_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Char('s') => {
                self.status = None;
                self.tracker.start();
            }
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                self.status = None;
                self.tracker.stop();
            }
            KeyCode::Enter | KeyCode::Char('w') => {
                self.status = match self.tracker.save() {
                    Ok(true) => Some(Label::Saved),
                    Ok(false) => None,
                    Err(_) => Some(Label::StorageWarning),
                };
            }
            KeyCode::Char('r') => {
                self.status = None;
                self.tracker.reset_session();
            }
            KeyCode::Char('D') => {
                if self.confirm_clear {
                    self.screen = Screen::ConfirmClear;
                } else {
                    self.clear_all();
                }
            }
            KeyCode::Char('l') => self.tracker.toggle_locale(),
            KeyCode::Char('k') => self.tracker.set_locale(Locale::Ko),
            KeyCode::Char('e') => self.tracker.set_locale(Locale::En),
            KeyCode::Up => {
                self.history_scroll = self.history_scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                // clamped against the visible height while rendering
                self.history_scroll += 1;
            }
            KeyCode::Home => self.history_scroll = 0,
            _ => {}
        }
        Flow::Continue
    }

    fn clear_all(&mut self) {
        self.history_scroll = 0;
        self.status = match self.tracker.clear_all() {
            Ok(()) => None,
            Err(_) => Some(Label::StorageWarning),
        };
    }
}
