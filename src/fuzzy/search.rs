//! Bounded depth-first search for the cheapest embedding.
//!
//! The stack starts with every layer-0 node at its root cost. Each popped
//! frame is discarded if a completed path has already reached its node at
//! an equal or lower score (`score_graph`); otherwise its prefix is recorded
//! and either a completed embedding updates the best score (writing the
//! path's scores back into `score_graph` so sibling subtrees prune against
//! them), or its children in the next layer are expanded. A child is pushed
//! only when its path cost still beats the best completed score.

use crate::fuzzy::graph::{GraphNode, HaystackData, SCORE_INF};
use crate::fuzzy::score::GapScorer;
use crate::query::data::QueryData;

/// Minimum embedding cost of `qd` in the prepared haystack, or the sentinel
/// when the reachability gate prunes every complete path. On return
/// `hd.best_path[..q_len]` holds the winning embedding (or the pre-seeded
/// leftmost one in the sentinel case).
pub(crate) fn best_embedding_score<S: GapScorer>(
    qd: &QueryData,
    stack: &mut Vec<GraphNode>,
    hd: &mut HaystackData<S>,
) -> f32 {
    let q_len = qd.q_len();
    let gap = qd.max_symbol_gap as isize;
    let mut best = SCORE_INF;

    stack.clear();
    for (branch, &idx) in hd.graph[0].iter().enumerate() {
        stack.push(GraphNode {
            idx,
            depth: 0,
            score: hd.root_cost(idx),
            branch,
            right_delim: hd.idx_to_right_delim[idx],
            parent_idx: -1,
        });
    }

    while let Some(parent) = stack.pop() {
        // A completed path already reached this node at least as cheaply.
        if parent.score >= hd.score_graph[parent.depth][parent.branch] {
            continue;
        }

        hd.path[parent.depth] = parent.idx;
        hd.path_scores[parent.depth] = parent.score;
        hd.path_branches[parent.depth] = parent.branch;

        if parent.depth + 1 == q_len {
            if parent.score < best {
                best = parent.score;
                for j in 0..q_len {
                    hd.score_graph[j][hd.path_branches[j]] = hd.path_scores[j];
                    hd.best_path[j] = hd.path[j];
                }
            }
            continue;
        }

        let dist = parent.idx as isize - parent.parent_idx;
        for branch in 0..hd.graph[parent.depth + 1].len() {
            let child_idx = hd.graph[parent.depth + 1][branch];
            if child_idx <= parent.idx {
                continue;
            }
            // Reachability gate, kept in its original dual form: a short
            // incoming hop licenses a long outgoing one, and a short
            // outgoing hop is always allowed.
            if dist >= gap && (child_idx - parent.idx) as isize >= gap {
                continue;
            }
            let score = hd.cost_through(&parent, child_idx);
            if score < best {
                stack.push(GraphNode {
                    idx: child_idx,
                    depth: parent.depth + 1,
                    score,
                    branch,
                    right_delim: hd.idx_to_right_delim[child_idx],
                    parent_idx: parent.idx as isize,
                });
            }
        }
    }

    best
}
