//! Selector state.

use crate::config::SearchConfig;
use crate::search::{self, Hit, MatchInfo};

/// Interactive selector state: the loaded lines, the live query, and the
/// current results. Every query edit re-runs the core search over the
/// loaded lines.
pub struct App {
    pub lines: Vec<String>,
    pub query: String,
    pub results: Vec<Hit>,
    pub selected: usize,
    pub status: String,
    cfg: SearchConfig,
}

impl App {
    pub fn new(lines: Vec<String>, cfg: SearchConfig) -> Self {
        let mut app = Self {
            lines,
            query: String::new(),
            results: Vec::new(),
            selected: 0,
            status: String::new(),
            cfg,
        };
        app.execute_search();
        app
    }

    /// Re-filter the loaded lines with the current query. Parse errors land
    /// in the status line; the previous results stay on screen.
    pub fn execute_search(&mut self) {
        if self.query.trim().is_empty() {
            self.results = self
                .lines
                .iter()
                .take(self.cfg.top_k)
                .enumerate()
                .map(|(i, line)| Hit {
                    result: crate::fuzzy::ScoreResult {
                        score: 0.0,
                        positions: Vec::new(),
                    },
                    info: MatchInfo {
                        text: line.clone(),
                        filename: String::new(),
                        lineno: (i + 1) as u64,
                    },
                })
                .collect();
            self.selected = 0;
            self.status = format!("{} lines", self.lines.len());
            return;
        }

        let mut cfg = self.cfg.clone();
        cfg.query = self.query.clone();
        match search::search_lines(&cfg, &self.lines) {
            Ok(hits) => {
                self.status = format!("{}/{} matched", hits.len(), self.lines.len());
                self.results = hits;
                self.selected = 0;
            }
            Err(err) => {
                self.status = err.to_string();
            }
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.execute_search();
    }

    pub fn pop_char(&mut self) {
        self.query.pop();
        self.execute_search();
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
        self.execute_search();
    }

    /// Delete the trailing word of the query (Ctrl-W).
    pub fn delete_word(&mut self) {
        while self.query.ends_with(' ') {
            self.query.pop();
        }
        while matches!(self.query.chars().last(), Some(c) if c != ' ') {
            self.query.pop();
        }
        self.execute_search();
    }

    pub fn select_next(&mut self) {
        if !self.results.is_empty() {
            self.selected = (self.selected + 1).min(self.results.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_page_down(&mut self, page: usize) {
        if !self.results.is_empty() {
            self.selected = (self.selected + page).min(self.results.len() - 1);
        }
    }

    pub fn select_page_up(&mut self, page: usize) {
        self.selected = self.selected.saturating_sub(page);
    }

    pub fn selected_text(&self) -> Option<String> {
        self.results.get(self.selected).map(|h| h.info.text.clone())
    }
}
