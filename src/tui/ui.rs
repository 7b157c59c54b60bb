//! Drawing for the interactive selector.

use crate::output::runs;
use crate::tui::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // query input
            Constraint::Min(3),    // result list
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    draw_query_input(f, app, chunks[0]);
    draw_results(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);
}

fn draw_query_input(f: &mut Frame, app: &App, area: Rect) {
    let input = Paragraph::new(app.query.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(" Query "));
    f.render_widget(input, area);
    f.set_cursor_position((area.x + app.query.chars().count() as u16 + 1, area.y + 1));
}

fn draw_results(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .results
        .iter()
        .map(|hit| ListItem::new(Line::from(highlight_line(&hit.info.text, &hit.result.positions))))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Lines ({}) ", app.results.len())),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut state = ListState::default();
    if !app.results.is_empty() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let status = Paragraph::new(app.status.as_str()).style(Style::default().fg(Color::Cyan));
    f.render_widget(status, area);
}

/// Split a line into spans with the matched byte positions highlighted.
/// Positions that do not fall on character boundaries (multi-byte text)
/// lose their highlight rather than splitting a character.
fn highlight_line(text: &str, positions: &[usize]) -> Vec<Span<'static>> {
    let match_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::new();
    let mut cursor = 0;
    for (start, end) in runs(positions) {
        let start = start.min(text.len());
        let end = end.min(text.len());
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            continue;
        }
        if cursor < start {
            spans.push(Span::raw(text[cursor..start].to_string()));
        }
        if start < end && start >= cursor {
            spans.push(Span::styled(text[start..end].to_string(), match_style));
            cursor = end;
        }
    }
    if cursor < text.len() {
        spans.push(Span::raw(text[cursor..].to_string()));
    }
    spans
}
