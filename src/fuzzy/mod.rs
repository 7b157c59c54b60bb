//! Fuzzy matching and scoring.
//!
//! A [`FuzzyPipeline`] owns the ordered fuzzy terms of one query plus all
//! per-line scratch. [`FuzzyPipeline::is_match`] tests subsequence presence
//! of every term (recording where each match starts);
//! [`FuzzyPipeline::calc_score`] then searches for each term's cheapest
//! embedding and combines them. Scoring requires a prior successful
//! `is_match` on the same line; [`crate::query::Query::eval`] fuses the two
//! so callers cannot get it wrong.

mod graph;
mod search;
pub mod score;

pub use score::{GapScorer, LinearScorer, LogScorer};

pub(crate) use graph::{GraphNode, HaystackData};

use crate::query::data::QueryData;
use crate::query::filters;

/// Outcome of scoring one line: the combined score (lower is better) and the
/// matched haystack positions, merged across terms.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub score: f32,
    pub positions: Vec<usize>,
}

/// The fuzzy part of a query: ordered terms and owned scratch buffers.
/// Each search worker holds its own clone, so nothing here is shared.
#[derive(Debug, Clone)]
pub struct FuzzyPipeline<S: GapScorer> {
    queries: Vec<QueryData>,
    /// Start position of each term's match in the current line, filled by
    /// `is_match`.
    offsets: Vec<usize>,
    /// Byte -> sorted haystack positions, for the terms' accepted bytes.
    buckets: Vec<Vec<usize>>,
    delim_table: [bool; 256],
    stack: Vec<GraphNode>,
    hd: HaystackData<S>,
    tot_query_len: usize,
}

impl<S: GapScorer> FuzzyPipeline<S> {
    /// `default_delims` is only consulted when there are no terms; otherwise
    /// the delimiter set travels with the terms themselves.
    pub fn new(queries: Vec<QueryData>, default_delims: &[u8]) -> Self {
        let max_len = queries.iter().map(QueryData::q_len).max().unwrap_or(0);
        let tot_query_len = queries.iter().map(QueryData::q_len).sum();
        let delims = queries
            .first()
            .map(|q| q.word_delims.as_slice())
            .unwrap_or(default_delims);
        let mut delim_table = [false; 256];
        for &b in delims {
            delim_table[b as usize] = true;
        }
        Self {
            offsets: vec![0; queries.len()],
            buckets: vec![Vec::new(); 256],
            delim_table,
            stack: Vec::new(),
            hd: HaystackData::new(max_len * 4),
            tot_query_len,
            queries,
        }
    }

    pub fn num_terms(&self) -> usize {
        self.queries.len()
    }

    /// Do all terms occur in the line as subsequences? Records each term's
    /// match start for the scorer. With `preserve_order`, every term must
    /// start after the previous term's match end.
    pub fn is_match(&mut self, line: &[u8]) -> bool {
        let mut from = 0usize;
        for j in 0..self.queries.len() {
            let qd = &self.queries[j];
            let Some((start, end)) = filters::find_subseq_range(&line[from.min(line.len())..], qd)
            else {
                return false;
            };
            let (start, end) = (start + from, end + from);
            if j > 0 && qd.preserve_order && start < self.offsets[j - 1] {
                return false;
            }
            self.offsets[j] = start;
            from = if qd.preserve_order { end + 1 } else { 0 };
        }
        true
    }

    /// Sum of per-term minimum embedding costs, each nudged toward the next
    /// integer in proportion to line length so shorter lines win ties.
    ///
    /// Requires `is_match` to have returned true for this exact line.
    pub fn calc_score(&mut self, line: &[u8]) -> ScoreResult {
        self.hd.find_delims(line, &self.delim_table);
        let mut score = 0.0f32;
        let mut positions = vec![0usize; self.tot_query_len];
        let mut filled = 0;

        for j in 0..self.queries.len() {
            let qd = &self.queries[j];
            for &b in qd.include_set() {
                self.buckets[b as usize].clear();
            }
            map_buckets(line, self.offsets[j], qd, &mut self.buckets);

            self.hd.prepare(qd, &self.buckets, line);
            self.hd.seed_leftmost(qd.q_len());
            score += search::best_embedding_score(qd, &mut self.stack, &mut self.hd);

            // Tie-breaker: push the fractional part toward the next integer,
            // scaled by 1 - 1/len, so of two lines with equal embedding cost
            // the shorter one scores lower.
            let ceiling = score.trunc() + 1.0;
            score += (ceiling - score) * (1.0 - 1.0 / line.len() as f32);

            positions[filled..filled + qd.q_len()].copy_from_slice(&self.hd.best_path[..qd.q_len()]);
            filled += qd.q_len();
        }

        if self.queries.len() > 1 {
            positions.sort_unstable();
        }
        ScoreResult { score, positions }
    }
}

/// Index every accepted byte of `qd` occurring in `line[from..]` under its
/// (case-folded) query byte.
fn map_buckets(line: &[u8], from: usize, qd: &QueryData, buckets: &mut [Vec<usize>]) {
    for (i, &b) in line.iter().enumerate().skip(from) {
        if qd.is_included(b) {
            let key = if qd.ignore_case {
                b.to_ascii_lowercase()
            } else {
                b
            };
            buckets[key as usize].push(i);
        }
    }
}
