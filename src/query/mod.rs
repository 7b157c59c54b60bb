//! Query parsing and representation.
//!
//! [`parse_query`] turns a configuration's query string into a [`Query`]:
//! the fuzzy pipeline (scored terms) plus the boolean filter tree. The two
//! are evaluated together per line by [`Query::eval`].

pub mod data;
pub mod filters;
pub mod parser;
pub mod tree;

pub use data::QueryData;
pub use parser::{parse, ParsedQuery};
pub use tree::{Filter, FilterTree, FilterToken, LeafKind, TokenKind};

use crate::config::SearchConfig;
use crate::error::ParseError;
use crate::fuzzy::{FuzzyPipeline, GapScorer, ScoreResult};

/// A parsed query, ready to evaluate lines. Holds per-line scratch, so each
/// worker clones its own.
#[derive(Debug, Clone)]
pub struct Query<S: GapScorer> {
    pub fuzzy: FuzzyPipeline<S>,
    pub tree: FilterTree,
}

/// Parse `cfg.query` into a ready-to-run [`Query`]. Smart case must already
/// be resolved into `cfg.ignore_case`.
pub fn parse_query<S: GapScorer>(cfg: &SearchConfig) -> Result<Query<S>, ParseError> {
    let parsed = parser::parse(cfg)?;
    Ok(Query {
        fuzzy: FuzzyPipeline::new(parsed.fuzzy, cfg.word_delims.as_bytes()),
        tree: FilterTree::build(parsed.tokens),
    })
}

impl<S: GapScorer> Query<S> {
    /// Evaluate one line: fuzzy presence, then the filter tree, then (only
    /// on a full match) the fuzzy score. Fusing match and score here keeps
    /// the scorer's "haystack contains the query" precondition satisfied by
    /// construction.
    pub fn eval(&mut self, line: &[u8]) -> Option<ScoreResult> {
        if !self.fuzzy.is_match(line) {
            return None;
        }
        if !self.tree.is_match(line) {
            return None;
        }
        Some(self.fuzzy.calc_score(line))
    }
}
