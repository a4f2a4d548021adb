use itertools::Itertools;
use unicode_width::UnicodeWidthStr;

use crate::history::History;
use crate::i18n::{Label, Locale};
use crate::tracker::TodaySummary;
use crate::util::format_duration;

/// Pad `s` with spaces to `width` terminal columns
fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{s}{}", " ".repeat(fill))
}

/// Plain-text summary and history table, as printed by `--print-history`
pub fn render_text(history: &History, today: &TodaySummary, locale: Locale) -> String {
    let t = |label| locale.text(label);
    let mut out = String::new();

    out.push_str(&format!(
        "{} {} ({} {})\n\n",
        t(Label::TodayAccum),
        today.total_display(),
        today.session_count,
        t(Label::Sessions)
    ));
    out.push_str(t(Label::HistoryTitle));
    out.push('\n');

    let rows = history.rows();
    if rows.is_empty() {
        out.push_str(&format!(
            "{}{}{}\n",
            t(Label::NoHistory),
            t(Label::PressSave),
            t(Label::NoHistoryTail)
        ));
        return out;
    }

    let headers = [
        t(Label::Date),
        t(Label::Total),
        t(Label::SessionCount),
        t(Label::SessionList),
    ];
    let body: Vec<[String; 4]> = rows
        .iter()
        .map(|r| {
            [
                r.date.to_string(),
                format_duration(r.total_seconds),
                r.session_count.to_string(),
                r.sessions.iter().map(|s| format_duration(*s)).join(" "),
            ]
        })
        .collect();

    // last column is left ragged
    let widths: Vec<usize> = (0..3)
        .map(|col| {
            body.iter()
                .map(|row| row[col].width())
                .chain(std::iter::once(headers[col].width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: [&str; 4]| {
        format!(
            "{}  {}  {}  {}",
            pad(cells[0], widths[0]),
            pad(cells[1], widths[1]),
            pad(cells[2], widths[2]),
            cells[3]
        )
        .trim_end()
        .to_string()
    };

    out.push_str(&line(headers));
    out.push('\n');
    for row in &body {
        out.push_str(&line([
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
        ]));
        out.push('\n');
    }
    out
}
