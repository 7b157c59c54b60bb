//! Error types surfaced by query parsing, configuration, and the search
//! driver.
//!
//! Parse errors are user-visible and fatal for the query that produced them;
//! the interactive UI shows them in the status line. I/O failures on a single
//! input file are reported and skipped by the driver and never appear here.

use thiserror::Error;

/// A query string that violates the grammar.
///
/// The messages are part of the user interface: the TUI prints them verbatim
/// in the status line, so they are phrased as complete sentences.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Query can't be empty.")]
    EmptyQuery,
    #[error("No string given. Maybe you forgot to escape a meta character or close a phrase.")]
    MissingText,
    #[error("Phrase can't be empty.")]
    EmptyPhrase,
    #[error("Closing \" not found.")]
    UnclosedPhrase,
    #[error("Extra symbols after closing \".")]
    TrailingPhrase,
    #[error("Empty `{0}`. Use \\ to escape the space, wrap the operand in \", or write \\{0} to match a literal `{0}`.")]
    EmptyOperand(char),
    #[error("Missing text after `|`.")]
    MissingTextAfterOr,
    #[error("Missing text before `|`.")]
    MissingTextBeforeOr,
    #[error("Can't end in `|` or `(`.")]
    DanglingOpen,
    #[error("Can't begin in `|` or `)`.")]
    LeadingClose,
    #[error("Unbalanced parentheses.")]
    UnbalancedParens,
}

/// An invalid configuration value. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be a positive integer")]
    NonPositive(&'static str),
    #[error("unknown gap penalty `{0}` (expected `linear` or `log`)")]
    UnknownGapPenalty(String),
    #[error("can't read config file `{path}`: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file `{path}`: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Top-level error for a search pass.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
