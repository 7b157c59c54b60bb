//! Gap cost models for fuzzy embeddings.
//!
//! An embedding's cost is the sum of edge costs between consecutive matched
//! positions. Each edge cost is assembled from five ingredients: the length
//! of the word the child lands in, the distance in words from the parent,
//! whether a new word was entered, whether the child misses the start of its
//! word, and whether the hop broke contiguity. Two models weight these:
//! [`LinearScorer`] charges raw distances, [`LogScorer`] compresses them
//! through a cached pseudo-log2.
//!
//! These run in the DFS inner loop; implementations are monomorphised into
//! the search, never called through a vtable.

/// Cost ingredients queried by the DFS for each explored edge.
///
/// `delim_indices` is the per-line list of word-delimiter positions with the
/// line length appended as a terminal entry; a "delim index" below is an
/// index into that list, identifying the first delimiter to the right of a
/// position. A virtual delimiter sits just before the line, so delim index 0
/// means "inside the first word".
pub trait GapScorer: Clone + Default + Send {
    /// Words crossed between the parent's word and the child's.
    fn word_dist(&self, child_delim: usize, parent_delim: usize, same_word: bool) -> f32;
    /// Length of the word the child landed in (0 when staying in the same
    /// word).
    fn word_len(&self, delim_idx: usize, same_word: bool, delim_indices: &[usize]) -> f32;
    /// Flat charge for entering a new word.
    fn is_new_word(&self, same_word: bool) -> f32;
    /// Charge (or bonus) depending on whether `idx` is the first byte of
    /// its word.
    fn is_not_word_beg(
        &self,
        idx: usize,
        delim_idx: usize,
        idx_to_islower: &[bool],
        delim_indices: &[usize],
    ) -> f32;
    /// Charge for a hop that skipped at least one byte.
    fn is_noncontiguous(&self, child_idx: usize, parent_idx: usize) -> f32;
}

/// First byte of the word that ends at `delim_indices[delim_idx]`.
fn word_start(delim_idx: usize, delim_indices: &[usize]) -> usize {
    if delim_idx == 0 {
        0
    } else {
        delim_indices[delim_idx - 1] + 1
    }
}

/// Word length including its trailing delimiter; the virtual delimiter at
/// position -1 makes the first word one longer than its byte count.
fn word_span(delim_idx: usize, delim_indices: &[usize]) -> isize {
    let prev = if delim_idx == 0 {
        -1
    } else {
        delim_indices[delim_idx - 1] as isize
    };
    delim_indices[delim_idx] as isize - prev
}

/// Gap cost grows linearly with distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScorer;

impl GapScorer for LinearScorer {
    fn word_dist(&self, child_delim: usize, parent_delim: usize, same_word: bool) -> f32 {
        if same_word {
            0.0
        } else {
            (child_delim - parent_delim) as f32
        }
    }

    fn word_len(&self, delim_idx: usize, same_word: bool, delim_indices: &[usize]) -> f32 {
        if same_word {
            0.0
        } else {
            word_span(delim_idx, delim_indices) as f32
        }
    }

    fn is_new_word(&self, same_word: bool) -> f32 {
        if same_word {
            0.0
        } else {
            1.0
        }
    }

    fn is_not_word_beg(
        &self,
        idx: usize,
        delim_idx: usize,
        idx_to_islower: &[bool],
        delim_indices: &[usize],
    ) -> f32 {
        if idx_to_islower[idx] && idx != word_start(delim_idx, delim_indices) {
            1.0
        } else {
            0.0
        }
    }

    fn is_noncontiguous(&self, child_idx: usize, parent_idx: usize) -> f32 {
        if child_idx != parent_idx + 1 {
            1.0
        } else {
            0.0
        }
    }
}

/// Gap cost grows with a pseudo-log2 of distance, so long gaps inside long
/// lines stay competitive. Word-start hits earn a bonus instead of merely
/// avoiding a charge.
#[derive(Debug, Clone)]
pub struct LogScorer {
    table: [f32; 128],
}

impl Default for LogScorer {
    fn default() -> Self {
        let mut table = [0.0f32; 128];
        for (x, slot) in table.iter_mut().enumerate() {
            *slot = pseudo_log2(x as i64);
        }
        Self { table }
    }
}

/// `floor`-ish log2 plus a fractional nudge that keeps the mapping strictly
/// monotonic between powers of two. Not a true logarithm; only the ordering
/// matters.
fn pseudo_log2(x: i64) -> f32 {
    if x < 2 {
        return 0.0;
    }
    let q = x as f32;
    let mut c = 0u32;
    let mut v = x;
    while v > 1 {
        v >>= 1;
        c += 1;
    }
    c as f32 + q / (1i64 << (c + 1)) as f32
}

impl LogScorer {
    fn log2(&self, x: i64) -> f32 {
        if x < 2 {
            return 0.0;
        }
        if (x as usize) < self.table.len() {
            return self.table[x as usize];
        }
        let q = x as f32;
        let mut c = self.table[self.table.len() - 1] as i64;
        let mut v = x;
        while v > self.table.len() as i64 {
            v >>= 1;
            c += 1;
        }
        c as f32 + q / (1i64 << (c + 1)) as f32
    }
}

impl GapScorer for LogScorer {
    fn word_dist(&self, child_delim: usize, parent_delim: usize, same_word: bool) -> f32 {
        if same_word {
            0.0
        } else {
            self.log2((child_delim - parent_delim) as i64)
        }
    }

    fn word_len(&self, delim_idx: usize, same_word: bool, delim_indices: &[usize]) -> f32 {
        if same_word {
            0.0
        } else {
            self.log2(word_span(delim_idx, delim_indices) as i64)
        }
    }

    fn is_new_word(&self, _same_word: bool) -> f32 {
        0.0
    }

    fn is_not_word_beg(
        &self,
        idx: usize,
        delim_idx: usize,
        idx_to_islower: &[bool],
        delim_indices: &[usize],
    ) -> f32 {
        if idx == word_start(delim_idx, delim_indices) {
            return -1.0;
        }
        if idx_to_islower[idx] {
            1.0
        } else {
            0.0
        }
    }

    fn is_noncontiguous(&self, child_idx: usize, parent_idx: usize) -> f32 {
        self.log2(child_idx as i64 - parent_idx as i64 - 1)
    }
}
