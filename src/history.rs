use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One saved focus session. Never mutated after it is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "seconds")]
    pub duration_seconds: u64,
    /// Epoch milliseconds at the moment of save
    #[serde(rename = "at")]
    pub created_at: i64,
}

/// Everything saved on one calendar date.
///
/// `total_seconds` always equals the sum of the session durations; sessions
/// are kept in the order they were saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub total_seconds: u64,
    pub sessions: Vec<Session>,
}

impl DayRecord {
    /// Totals saturate; stored values are trusted and may already be huge
    fn push(&mut self, session: Session) {
        self.total_seconds = self.total_seconds.saturating_add(session.duration_seconds);
        self.sessions.push(session);
    }

    /// Sessions newest first, the order they are shown in
    pub fn sessions_latest_first(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter().rev()
    }
}

/// Date (`YYYY-MM-DD`) to [`DayRecord`] mapping.
///
/// Serialized as a plain JSON object keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    days: BTreeMap<String, DayRecord>,
}

/// A history table row, ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow<'a> {
    pub date: &'a str,
    pub total_seconds: u64,
    pub session_count: usize,
    /// Durations newest first
    pub sessions: Vec<u64>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn day(&self, date: &str) -> Option<&DayRecord> {
        self.days.get(date)
    }

    /// Total seconds and session count for `date`, zero when nothing was saved
    pub fn summary_for(&self, date: &str) -> (u64, usize) {
        self.day(date)
            .map(|d| (d.total_seconds, d.sessions.len()))
            .unwrap_or((0, 0))
    }

    /// Return a copy of this history with one more session under `date`.
    ///
    /// Durations of zero or less are not sessions; the history comes back
    /// unchanged for them.
    pub fn record_session(&self, date: &str, duration_seconds: i64, created_at: i64) -> History {
        let mut next = self.clone();
        if duration_seconds <= 0 {
            return next;
        }

        next.days.entry(date.to_string()).or_default().push(Session {
            duration_seconds: duration_seconds as u64,
            created_at,
        });
        next
    }

    /// Days newest first. Keys are zero-padded dates, so string order is
    /// calendar order.
    pub fn days_latest_first(&self) -> impl Iterator<Item = (&str, &DayRecord)> {
        self.days.iter().rev().map(|(k, v)| (k.as_str(), v))
    }

    /// Days oldest first, sessions in saved order
    pub fn days_chronological(&self) -> impl Iterator<Item = (&str, &DayRecord)> {
        self.days.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn rows(&self) -> Vec<HistoryRow<'_>> {
        self.days_latest_first()
            .map(|(date, record)| HistoryRow {
                date,
                total_seconds: record.total_seconds,
                session_count: record.sessions.len(),
                sessions: record
                    .sessions_latest_first()
                    .map(|s| s.duration_seconds)
                    .collect(),
            })
            .collect()
    }

    pub fn total_seconds(&self) -> u64 {
        self.days
            .values()
            .fold(0u64, |acc, d| acc.saturating_add(d.total_seconds))
    }
}
