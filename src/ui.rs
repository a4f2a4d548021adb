pub mod history_table;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Screen};
use crate::i18n::{Label, Locale};

const HORIZONTAL_MARGIN: u16 = 2;

/// Draw the whole screen. Clamps the history scroll offset to what fits.
pub fn draw(app: &mut App, f: &mut Frame) {
    let area = f.area();
    let locale = app.tracker.locale();
    let t = |label| locale.text(label);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title + language switch
            Constraint::Length(1), // subtitle
            Constraint::Length(7), // timer card
            Constraint::Length(1), // status
            Constraint::Min(4),    // history
            Constraint::Length(1), // local note
            Constraint::Length(2), // tips
        ])
        .split(area);

    render_title(f, chunks[0], locale);

    let subtitle = Paragraph::new(Span::styled(
        t(Label::Subtitle),
        Style::default().fg(Color::Gray),
    ));
    f.render_widget(subtitle, chunks[1]);

    render_timer_card(app, f, chunks[2]);
    render_status(app, f, chunks[3]);
    render_history(app, f, chunks[4]);

    let note = Paragraph::new(Span::styled(
        t(Label::LocalNote),
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(note, chunks[5]);

    let tips = Paragraph::new(Span::styled(
        t(Label::Tips),
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    ))
    .wrap(Wrap { trim: true });
    f.render_widget(tips, chunks[6]);

    if app.screen == Screen::ConfirmClear {
        render_confirm(f, area, locale);
    }
}

fn render_title(f: &mut Frame, area: Rect, locale: Locale) {
    let selected = Style::default()
        .fg(Color::Black)
        .bg(Color::White)
        .add_modifier(Modifier::BOLD);
    let unselected = Style::default().fg(Color::Gray);
    let pick = |l: Locale| if l == locale { selected } else { unselected };

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(20)])
        .split(area);

    let title = Paragraph::new(Span::styled(
        locale.text(Label::Title),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    f.render_widget(title, halves[0]);

    let switch = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {} ", locale.text(Label::LangKo)), pick(Locale::Ko)),
        Span::raw(" "),
        Span::styled(format!(" {} ", locale.text(Label::LangEn)), pick(Locale::En)),
    ]))
    .alignment(Alignment::Right);
    f.render_widget(switch, halves[1]);
}

fn render_timer_card(app: &App, f: &mut Frame, area: Rect) {
    let locale = app.tracker.locale();
    let t = |label| locale.text(label);

    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // elapsed
            Constraint::Length(1), // running / paused
            Constraint::Length(1), // actions
            Constraint::Length(1), // key hints
            Constraint::Length(1), // today
        ])
        .split(inner);

    let (state_label, state_color) = if app.tracker.is_running() {
        (Label::Running, Color::Green)
    } else {
        (Label::Paused, Color::Yellow)
    };

    let elapsed = Paragraph::new(Span::styled(
        app.tracker.elapsed_display(),
        Style::default()
            .fg(state_color)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    f.render_widget(elapsed, rows[0]);

    let state = Paragraph::new(Span::styled(
        t(state_label),
        Style::default()
            .fg(state_color)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    f.render_widget(state, rows[1]);

    f.render_widget(
        Paragraph::new(action_line(app)).alignment(Alignment::Center),
        rows[2],
    );

    let hints = Paragraph::new(Span::styled(
        t(Label::KeyHints),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    f.render_widget(hints, rows[3]);

    let today = app.tracker.today_summary();
    let summary = Paragraph::new(Line::from(vec![
        Span::raw(format!("{} ", t(Label::TodayAccum))),
        Span::styled(
            today.total_display(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" ({} {})", today.session_count, t(Label::Sessions))),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(summary, rows[4]);
}

/// Start, stop, save and reset with their keys. Start is dimmed while
/// running, stop while paused, save while there is nothing to save.
fn action_line(app: &App) -> Line<'static> {
    let locale = app.tracker.locale();
    let running = app.tracker.is_running();
    let has_elapsed = app.tracker.elapsed_seconds() > 0;

    let action = |key: &str, label: Label, enabled: bool, color: Color| {
        let style = if enabled {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Span::styled(format!("[{key}] {}", locale.text(label)), style)
    };

    Line::from(vec![
        action("s", Label::Start, !running, Color::Green),
        Span::raw("  "),
        action("p", Label::Stop, running, Color::Yellow),
        Span::raw("  "),
        action("enter", Label::Save, has_elapsed, Color::Blue),
        Span::raw("  "),
        action("r", Label::Reset, true, Color::White),
    ])
}

fn render_status(app: &App, f: &mut Frame, area: Rect) {
    let locale = app.tracker.locale();
    let line = match (app.status, app.tracker.last_storage_error()) {
        (_, Some(err)) => Span::styled(
            format!("{} {err}", locale.text(Label::StorageWarning)),
            Style::default().fg(Color::Red),
        ),
        (Some(label), None) => Span::styled(locale.text(label), Style::default().fg(Color::Green)),
        (None, None) => Span::raw(""),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn render_history(app: &mut App, f: &mut Frame, area: Rect) {
    let locale = app.tracker.locale();
    let rows = app.tracker.history_rows();

    if rows.is_empty() {
        let empty = Paragraph::new(Line::from(vec![
            Span::raw(locale.text(Label::NoHistory)),
            Span::styled(
                locale.text(Label::PressSave),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(locale.text(Label::NoHistoryTail)),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(locale.text(Label::HistoryTitle)),
        )
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        return;
    }

    // borders and header
    let visible = area.height.saturating_sub(3) as usize;
    let max_scroll = rows.len().saturating_sub(visible);
    let offset = app.history_scroll.min(max_scroll);
    let today = app.tracker.today_key();

    let table = history_table::history_table(&rows, &today, locale, offset, visible);
    f.render_widget(table, area);

    app.history_scroll = offset;
}

fn render_confirm(f: &mut Frame, area: Rect, locale: Locale) {
    let popup = centered_rect(60, 5, area);
    f.render_widget(Clear, popup);

    let text = vec![
        Line::from(Span::styled(
            locale.text(Label::ConfirmClear),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            locale.text(Label::ConfirmKeys),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];
    let dialog = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(locale.text(Label::DeleteAll)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(dialog, popup);
}

/// Rect of `percent_x` width and `height` rows centred in `area`
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x.min(100)) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::store::MemoryKeyValueStore;
    use crate::tracker::SessionTracker;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn create_test_app(locale: Locale) -> App {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let tracker = SessionTracker::new(kv, Clock::manual(), Some(locale));
        App::new(tracker, true)
    }

    fn render(app: &mut App, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_empty_history_screen() {
        let mut app = create_test_app(Locale::En);
        let rendered = render(&mut app, 100, 30);
        assert!(rendered.contains("00:00:00"));
        assert!(rendered.contains("No records yet"));
        assert!(rendered.contains("paused"));
    }

    #[test]
    fn test_running_and_saved_screen() {
        let mut app = create_test_app(Locale::En);
        app.tracker.start();
        for _ in 0..65 {
            app.tracker.tick();
        }
        let rendered = render(&mut app, 100, 30);
        assert!(rendered.contains("00:01:05"));
        assert!(rendered.contains("running"));

        app.tracker.save().unwrap();
        let rendered = render(&mut app, 100, 30);
        assert!(rendered.contains("00:00:00"));
        assert!(rendered.contains("Total Time"));
        assert!(rendered.contains(&app.tracker.today_key()));
    }

    #[test]
    fn test_confirm_dialog_rendered() {
        let mut app = create_test_app(Locale::En);
        app.screen = Screen::ConfirmClear;
        let rendered = render(&mut app, 100, 30);
        assert!(rendered.contains("Delete ALL history?"));
    }

    #[test]
    fn test_korean_screen_renders() {
        let mut app = create_test_app(Locale::Ko);
        let rendered = render(&mut app, 100, 30);
        assert!(rendered.contains("00:00:00"));
        assert!(rendered.contains("English"));
    }

    #[test]
    fn test_scroll_is_clamped() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let mut history = crate::history::History::new();
        for day in 1..=20 {
            history = history.record_session(&format!("2024-01-{day:02}"), 60, day);
        }
        crate::store::HistoryStore::new(kv.clone())
            .save(&history)
            .unwrap();

        let tracker = SessionTracker::new(kv, Clock::manual(), Some(Locale::En));
        let mut app = App::new(tracker, true);
        app.history_scroll = 50;
        let rendered = render(&mut app, 100, 30);

        // only part of the 20 days fit, scrolled as far as it goes
        assert!(app.history_scroll > 0 && app.history_scroll < 20);
        assert!(rendered.contains("(20/20)"));
        assert!(rendered.contains("2024-01-01"));
        assert!(!rendered.contains("2024-01-20"));
    }

    #[test]
    fn test_small_terminal_does_not_panic() {
        let mut app = create_test_app(Locale::En);
        app.screen = Screen::ConfirmClear;
        render(&mut app, 20, 5);
    }

    #[test]
    fn test_centered_rect() {
        let r = centered_rect(50, 4, Rect::new(0, 0, 80, 20));
        assert_eq!(r, Rect::new(20, 8, 40, 4));
    }

    #[test]
    fn test_centered_rect_on_very_wide_terminal() {
        let r = centered_rect(60, 5, Rect::new(0, 0, 2000, 50));
        assert_eq!(r, Rect::new(400, 22, 1200, 5));
    }

    /// Style of the first cell of `needle`, searched row by row
    fn style_of(buffer: &ratatui::buffer::Buffer, needle: &str) -> Option<Style> {
        let area = buffer.area;
        let wanted: Vec<String> = needle.chars().map(|c| c.to_string()).collect();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let matches = wanted.iter().enumerate().all(|(i, sym)| {
                    let cx = x + i as u16;
                    cx < area.right() && buffer[(cx, y)].symbol() == sym
                });
                if matches {
                    return Some(buffer[(x, y)].style());
                }
            }
        }
        None
    }

    fn render_buffer(app: &mut App) -> ratatui::buffer::Buffer {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        terminal.backend().buffer().clone()
    }

    #[test]
    fn test_action_row_dims_unavailable_actions() {
        let mut app = create_test_app(Locale::En);

        // paused at zero: start available, stop and save dimmed
        let buffer = render_buffer(&mut app);
        let start = style_of(&buffer, "[s] Start").unwrap();
        let stop = style_of(&buffer, "[p] Stop").unwrap();
        let save = style_of(&buffer, "[enter] Save").unwrap();
        assert_eq!(start.fg, Some(Color::Green));
        assert_eq!(stop.fg, Some(Color::DarkGray));
        assert_eq!(save.fg, Some(Color::DarkGray));

        // running with time on the clock: start dimmed, stop and save lit
        app.tracker.start();
        app.tracker.tick();
        let buffer = render_buffer(&mut app);
        assert_eq!(style_of(&buffer, "[s] Start").unwrap().fg, Some(Color::DarkGray));
        assert_eq!(style_of(&buffer, "[p] Stop").unwrap().fg, Some(Color::Yellow));
        assert_eq!(style_of(&buffer, "[enter] Save").unwrap().fg, Some(Color::Blue));

        // paused with time: save stays available
        app.tracker.stop();
        let buffer = render_buffer(&mut app);
        assert_eq!(style_of(&buffer, "[s] Start").unwrap().fg, Some(Color::Green));
        assert_eq!(style_of(&buffer, "[enter] Save").unwrap().fg, Some(Color::Blue));
    }

    #[test]
    fn test_action_row_in_korean() {
        let mut app = create_test_app(Locale::Ko);
        let line = action_line(&app);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("[s] 시작"));
        assert!(text.contains("[enter] 저장 (오늘에 합산)"));

        app.tracker.start();
        let line = action_line(&app);
        assert_eq!(line.spans[0].style.fg, Some(Color::DarkGray));
    }
}
