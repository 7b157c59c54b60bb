//! Per-line scratch for the fuzzy scorer.
//!
//! For one haystack and one query, [`HaystackData`] holds the layered
//! position graph (`graph[j]` = sorted haystack positions matching query
//! byte `j`), the memoised best-known score per graph node, the word
//! delimiter positions, and the per-position caches the cost model reads.
//! Buffers are owned by one worker, grown monotonically, and reset (never
//! reallocated) for each line.

use crate::fuzzy::score::GapScorer;
use crate::query::data::QueryData;

/// Score sentinel standing in for "no embedding found yet".
pub(crate) const SCORE_INF: f32 = 20_000_000.0;

/// One DFS frame: a graph node plus the path state needed to expand it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GraphNode {
    pub idx: usize,
    pub depth: usize,
    pub score: f32,
    /// Index of this node within `graph[depth]`, addressing `score_graph`.
    pub branch: usize,
    /// Index into `delim_indices` of the first delimiter right of `idx`.
    pub right_delim: usize,
    /// Haystack index of the node this frame was expanded from; -1 at roots.
    pub parent_idx: isize,
}

#[derive(Debug, Clone)]
pub(crate) struct HaystackData<S> {
    /// Word-delimiter positions in the line, terminated by the line length.
    pub delim_indices: Vec<usize>,
    /// Haystack index -> index into `delim_indices` of the next delimiter
    /// strictly to the right. Filled only for surviving graph positions.
    pub idx_to_right_delim: Vec<usize>,
    /// Haystack index -> is the byte lowercase. Same coverage as above.
    pub idx_to_islower: Vec<bool>,
    /// Layer `j` holds the sorted positions matching query byte `j`.
    pub graph: Vec<Vec<usize>>,
    /// Best known score per graph node, `SCORE_INF` until a completed path
    /// writes it back.
    pub score_graph: Vec<Vec<f32>>,
    pub path: Vec<usize>,
    pub path_scores: Vec<f32>,
    pub path_branches: Vec<usize>,
    pub best_path: Vec<usize>,
    pub scorer: S,
}

impl<S: GapScorer> HaystackData<S> {
    /// `layers` bounds the deepest query this scratch will see.
    pub fn new(layers: usize) -> Self {
        Self {
            delim_indices: Vec::new(),
            idx_to_right_delim: Vec::new(),
            idx_to_islower: Vec::new(),
            graph: vec![Vec::new(); layers],
            score_graph: vec![Vec::new(); layers],
            path: vec![0; layers],
            path_scores: vec![0.0; layers],
            path_branches: vec![0; layers],
            best_path: vec![0; layers],
            scorer: S::default(),
        }
    }

    /// Record the positions of word delimiters plus the terminal entry.
    pub fn find_delims(&mut self, line: &[u8], delim_table: &[bool; 256]) {
        self.delim_indices.clear();
        for (i, &b) in line.iter().enumerate() {
            if delim_table[b as usize] {
                self.delim_indices.push(i);
            }
        }
        self.delim_indices.push(line.len());
    }

    /// Build and prune the layered graph for `qd`, reset the score memo, and
    /// fill the per-position caches.
    ///
    /// Panics if any layer comes out empty: that means the haystack does not
    /// contain the query, which callers must have established before scoring.
    pub fn prepare(&mut self, qd: &QueryData, buckets: &[Vec<usize>], line: &[u8]) {
        let q_len = qd.q_len();
        for (k, &b) in qd.q().iter().enumerate() {
            self.graph[k].clone_from(&buckets[b as usize]);
        }

        let layers = &mut self.graph[..q_len];
        remove_out_of_bounds(layers);
        remove_max_nodes(layers);
        remove_min_nodes(layers);
        for layer in layers.iter() {
            assert!(
                !layer.is_empty(),
                "fuzzy scorer invoked on a non-matching haystack"
            );
        }

        for j in 0..q_len {
            let len = self.graph[j].len();
            self.score_graph[j].clear();
            self.score_graph[j].resize(len, SCORE_INF);
        }

        self.fill_position_caches(line, q_len);
    }

    fn fill_position_caches(&mut self, line: &[u8], q_len: usize) {
        if self.idx_to_right_delim.len() < line.len() {
            self.idx_to_right_delim.resize(line.len(), 0);
            self.idx_to_islower.resize(line.len(), false);
        }
        for j in 0..q_len {
            let mut di = 0;
            for n in 0..self.graph[j].len() {
                let idx = self.graph[j][n];
                // The terminal delimiter entry guarantees a hit.
                while self.delim_indices[di] <= idx {
                    di += 1;
                }
                self.idx_to_right_delim[idx] = di;
                self.idx_to_islower[idx] = line[idx].is_ascii_lowercase();
            }
        }
    }

    /// Seed `best_path` with the leftmost embedding so a search in which the
    /// reachability gate prunes every complete path still reports valid
    /// positions (with the sentinel score).
    pub fn seed_leftmost(&mut self, q_len: usize) {
        let mut prev: isize = -1;
        for j in 0..q_len {
            let idx = self.graph[j]
                .iter()
                .copied()
                .find(|&i| i as isize > prev)
                .expect("fuzzy scorer invoked on a non-matching haystack");
            self.best_path[j] = idx;
            prev = idx as isize;
        }
    }

    /// Cost of starting an embedding at `idx` (the self-edge convention:
    /// same word, zero-length hop).
    pub fn root_cost(&self, idx: usize) -> f32 {
        let delim_idx = self.idx_to_right_delim[idx];
        self.scorer.word_len(delim_idx, false, &self.delim_indices)
            + self.scorer.word_dist(idx, idx, true)
            + self.scorer.is_new_word(false)
            + self.scorer.is_not_word_beg(
                idx,
                delim_idx,
                &self.idx_to_islower,
                &self.delim_indices,
            )
            + self.scorer.is_noncontiguous(idx, idx)
    }

    /// Path cost of extending `parent` with `child_idx`: the parent's score
    /// plus the edge cost.
    pub fn cost_through(&self, parent: &GraphNode, child_idx: usize) -> f32 {
        let child_delim = self.idx_to_right_delim[child_idx];
        let same_word = child_delim == parent.right_delim;
        parent.score
            + self
                .scorer
                .word_len(child_delim, same_word, &self.delim_indices)
            + self
                .scorer
                .word_dist(child_delim, parent.right_delim, same_word)
            + self.scorer.is_new_word(same_word)
            + self.scorer.is_not_word_beg(
                child_idx,
                child_delim,
                &self.idx_to_islower,
                &self.delim_indices,
            )
            + self.scorer.is_noncontiguous(child_idx, parent.idx)
    }
}

/// Drop nodes that sit too close to the end of the line for the remaining
/// layers to fit after them.
fn remove_out_of_bounds(graph: &mut [Vec<usize>]) {
    let max_depth = graph.len() - 1;
    if max_depth == 0 {
        return;
    }
    let Some(&max_idx) = graph[max_depth].last() else {
        return;
    };
    for depth in 0..max_depth {
        let hops = max_depth - depth;
        while graph[depth].last().is_some_and(|&i| i + hops > max_idx) {
            graph[depth].pop();
        }
    }
}

/// Walking back from the last layer, drop nodes beyond the next layer's
/// maximum: nothing could follow them.
fn remove_max_nodes(graph: &mut [Vec<usize>]) {
    for depth in (1..graph.len()).rev() {
        let Some(&cur_max) = graph[depth].last() else {
            continue;
        };
        while graph[depth - 1].last().is_some_and(|&i| i > cur_max) {
            graph[depth - 1].pop();
        }
    }
}

/// Walking forward, drop nodes below the previous layer's minimum: nothing
/// could precede them.
fn remove_min_nodes(graph: &mut [Vec<usize>]) {
    for depth in 0..graph.len().saturating_sub(1) {
        let Some(&cur_min) = graph[depth].first() else {
            continue;
        };
        let keep_from = graph[depth + 1].partition_point(|&i| i < cur_min);
        graph[depth + 1].drain(..keep_from);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::fuzzy::score::LinearScorer;

    fn delim_table(delims: &[u8]) -> [bool; 256] {
        let mut table = [false; 256];
        for &d in delims {
            table[d as usize] = true;
        }
        table
    }

    fn buckets_for(line: &[u8], qd: &QueryData) -> Vec<Vec<usize>> {
        let mut buckets = vec![Vec::new(); 256];
        for (i, &b) in line.iter().enumerate() {
            if qd.is_included(b) {
                let key = if qd.ignore_case {
                    b.to_ascii_lowercase()
                } else {
                    b
                };
                buckets[key as usize].push(i);
            }
        }
        buckets
    }

    fn qd(query: &str) -> QueryData {
        QueryData::new(query, &SearchConfig::default())
    }

    #[test]
    fn delims_end_with_terminal_entry() {
        let mut hd: HaystackData<LinearScorer> = HaystackData::new(4);
        hd.find_delims(b"ab cd.e", &delim_table(b" ."));
        assert_eq!(hd.delim_indices, [2, 5, 7]);

        hd.find_delims(b"abc", &delim_table(b" "));
        assert_eq!(hd.delim_indices, [3]);
    }

    #[test]
    fn graph_layers_hold_matching_positions() {
        let q = qd("ab");
        let line = b"abxab";
        let mut hd: HaystackData<LinearScorer> = HaystackData::new(8);
        hd.find_delims(line, &delim_table(b" "));
        hd.prepare(&q, &buckets_for(line, &q), line);
        assert_eq!(hd.graph[0], [0, 3]);
        assert_eq!(hd.graph[1], [1, 4]);
        assert!(hd.score_graph[0].iter().all(|&s| s == SCORE_INF));
    }

    #[test]
    fn out_of_bounds_nodes_are_pruned() {
        // Trailing 'a' at index 4 cannot start "ab" when the last 'b' is at 3.
        let q = qd("ab");
        let line = b"aabba";
        let mut hd: HaystackData<LinearScorer> = HaystackData::new(8);
        hd.find_delims(line, &delim_table(b" "));
        hd.prepare(&q, &buckets_for(line, &q), line);
        assert_eq!(hd.graph[0], [0, 1]);
        assert_eq!(hd.graph[1], [2, 3]);
    }

    #[test]
    fn min_nodes_before_first_layer_are_pruned() {
        // The 'b' at index 0 precedes every 'a' and can't continue any path.
        let q = qd("ab");
        let line = b"bab";
        let mut hd: HaystackData<LinearScorer> = HaystackData::new(8);
        hd.find_delims(line, &delim_table(b" "));
        hd.prepare(&q, &buckets_for(line, &q), line);
        assert_eq!(hd.graph[0], [1]);
        assert_eq!(hd.graph[1], [2]);
    }

    #[test]
    #[should_panic(expected = "non-matching haystack")]
    fn preparing_a_non_match_panics() {
        let q = qd("xy");
        let line = b"only x here";
        let mut hd: HaystackData<LinearScorer> = HaystackData::new(8);
        hd.find_delims(line, &delim_table(b" "));
        hd.prepare(&q, &buckets_for(line, &q), line);
    }

    #[test]
    fn position_caches_cover_graph_nodes() {
        let q = qd("ad");
        let line = b"ab cd";
        let mut hd: HaystackData<LinearScorer> = HaystackData::new(8);
        hd.find_delims(line, &delim_table(b" "));
        hd.prepare(&q, &buckets_for(line, &q), line);
        // 'a' at 0 sits before the delimiter at 2; 'd' at 4 before the
        // terminal delimiter.
        assert_eq!(hd.idx_to_right_delim[0], 0);
        assert_eq!(hd.idx_to_right_delim[4], 1);
        assert!(hd.idx_to_islower[0]);
    }

    #[test]
    fn seed_leftmost_produces_increasing_embedding() {
        let q = qd("aba");
        let line = b"aabbaa";
        let mut hd: HaystackData<LinearScorer> = HaystackData::new(12);
        hd.find_delims(line, &delim_table(b" "));
        hd.prepare(&q, &buckets_for(line, &q), line);
        hd.seed_leftmost(3);
        assert_eq!(&hd.best_path[..3], &[0, 2, 4]);
    }
}
