//! Interactive terminal selector.
//!
//! Raw-mode event loop on the alternate screen: printable keys edit the
//! query (each edit re-runs the search), arrows and paging move the
//! selection, Enter accepts, Esc/Ctrl-C cancel. The accepted line is
//! returned to the caller after the terminal is restored, so it can be
//! printed to stdout for the next command in the pipe.

mod app;
mod ui;

use crate::config::SearchConfig;
use anyhow::Result;
use app::App;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

const PAGE: usize = 10;

/// Run the selector over `lines`; returns the accepted line, or `None` when
/// cancelled.
pub fn run(lines: Vec<String>, cfg: SearchConfig) -> Result<Option<String>> {
    enable_raw_mode()?;
    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stderr);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(lines, cfg);
    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<Option<String>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Ok(None),
            (KeyModifiers::CONTROL, KeyCode::Char('w')) => app.delete_word(),
            (KeyModifiers::CONTROL, KeyCode::Char('n')) => app.select_next(),
            (KeyModifiers::CONTROL, KeyCode::Char('p')) => app.select_prev(),
            (_, KeyCode::Esc) => {
                if app.query.is_empty() {
                    return Ok(None);
                }
                app.clear_query();
            }
            (_, KeyCode::Enter) => return Ok(app.selected_text()),
            (_, KeyCode::Down) | (_, KeyCode::Tab) => app.select_next(),
            (_, KeyCode::Up) | (_, KeyCode::BackTab) => app.select_prev(),
            (_, KeyCode::PageDown) => app.select_page_down(PAGE),
            (_, KeyCode::PageUp) => app.select_page_up(PAGE),
            (_, KeyCode::Backspace) => app.pop_char(),
            (_, KeyCode::Char(c)) => app.push_char(c),
            _ => {}
        }
    }
}
