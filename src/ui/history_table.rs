use itertools::Itertools;
use ratatui::{
    layout::Constraint,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
};

use crate::history::HistoryRow;
use crate::i18n::{Label, Locale};
use crate::util::format_duration;

pub const COLUMN_WIDTHS: [Constraint; 4] = [
    Constraint::Length(20), // date, with today's marker
    Constraint::Length(12), // total
    Constraint::Length(10), // session count
    Constraint::Min(10),    // session list
];

/// Pure presenter for a single day row
pub fn present_row(row: &HistoryRow<'_>, today: &str, locale: Locale) -> Row<'static> {
    let date = if row.date == today {
        Cell::from(format!("{} · {}", row.date, locale.text(Label::Today))).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Cell::from(row.date.to_string()).style(Style::default().add_modifier(Modifier::BOLD))
    };

    Row::new(vec![
        date,
        Cell::from(format_duration(row.total_seconds)),
        Cell::from(row.session_count.to_string()),
        Cell::from(row.sessions.iter().map(|s| format_duration(*s)).join("  "))
            .style(Style::default().fg(Color::Gray)),
    ])
}

pub fn header(locale: Locale) -> Row<'static> {
    Row::new(vec![
        Cell::from(locale.text(Label::Date)),
        Cell::from(locale.text(Label::Total)),
        Cell::from(locale.text(Label::SessionCount)),
        Cell::from(locale.text(Label::SessionList)),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )
}

/// Table of the visible slice of `rows`, starting at `offset`
pub fn history_table(
    rows: &[HistoryRow<'_>],
    today: &str,
    locale: Locale,
    offset: usize,
    visible: usize,
) -> Table<'static> {
    let scroll_info = if rows.len() > visible {
        format!(
            " ({}/{})",
            (offset + visible).min(rows.len()),
            rows.len()
        )
    } else {
        String::new()
    };

    let body: Vec<Row> = rows
        .iter()
        .skip(offset)
        .take(visible)
        .map(|r| present_row(r, today, locale))
        .collect();

    Table::new(body, COLUMN_WIDTHS)
        .header(header(locale))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{}{}", locale.text(Label::HistoryTitle), scroll_info)),
        )
}
