use std::io::Write;

use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::history::History;
use crate::util::format_duration;

#[derive(Debug, Serialize)]
struct SessionCsvRow<'a> {
    date: &'a str,
    seconds: u64,
    duration: String,
    saved_at: String,
}

/// Write one CSV row per saved session, oldest day first and sessions in
/// saved order. Returns the number of rows written.
pub fn write_sessions_csv<W: Write>(history: &History, out: W) -> Result<usize, csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    let mut rows = 0;

    for (date, record) in history.days_chronological() {
        for session in &record.sessions {
            let saved_at = Local
                .timestamp_millis_opt(session.created_at)
                .single()
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();

            writer.serialize(SessionCsvRow {
                date,
                seconds: session.duration_seconds,
                duration: format_duration(session.duration_seconds),
                saved_at,
            })?;
            rows += 1;
        }
    }

    writer.flush()?;
    Ok(rows)
}
