//! # FZL - Fuzzy Line Selector
//!
//! FZL is an interactive terminal line selector: point it at a stream of
//! lines (stdin or files) and drive an input box that filters them with
//! fuzzy, boolean, and regex queries.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`query`] - Query grammar parsing, leaf matchers, and the boolean
//!   filter tree
//! - [`fuzzy`] - Fuzzy subsequence matching and minimum-cost embedding
//!   scoring
//! - [`search`] - The batch/parallel top-k search driver and the regex
//!   filter
//! - [`config`] - Search configuration and the JSON defaults file
//! - [`tui`] - The interactive selector
//! - [`output`] - Result formatting for one-shot searches
//!
//! ## Quick Start
//!
//! ```
//! use fzl::config::SearchConfig;
//! use fzl::search::search_lines;
//!
//! let lines: Vec<String> = ["fn main()", "struct Main;", "mod tests;"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//!
//! let cfg = SearchConfig {
//!     query: "fnmain".to_string(),
//!     ..SearchConfig::default()
//! };
//! let hits = search_lines(&cfg, &lines).unwrap();
//! assert_eq!(hits[0].info.text, "fn main()");
//! ```
//!
//! ## Query syntax
//!
//! `fuzzy terms ; boolean part` — the fuzzy terms before ` ;` are scored
//! subsequence matches; the boolean part combines leaves with spaces (AND),
//! `|` (OR), `(...)` groups, and `!` negation. Leaves select a primitive
//! with `^` (prefix), `$` (suffix), `=` (substring), `~` (fuzzy); `"..."`
//! quotes a phrase and `\` escapes the next byte.

pub mod config;
pub mod error;
pub mod fuzzy;
pub mod output;
pub mod query;
pub mod search;
pub mod tui;
