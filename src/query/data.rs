//! Per-query precomputed data.
//!
//! [`QueryData`] holds one fuzzy or leaf query together with everything the
//! matchers and the scorer want ready-made: the (possibly lowercased) query
//! bytes, a per-position accepted-byte class, and a byte membership table for
//! the union of all accepted bytes. The classes exist so that a
//! case-insensitive scan never has to case-fold the haystack.

use crate::config::SearchConfig;

/// The set of bytes accepted at one query position: the query byte itself,
/// or both of its ASCII cases when matching case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteClass {
    bytes: [u8; 2],
    len: u8,
}

impl ByteClass {
    fn single(b: u8) -> Self {
        Self { bytes: [b, 0], len: 1 }
    }

    fn pair(a: u8, b: u8) -> Self {
        Self { bytes: [a, b], len: 2 }
    }

    /// Accepted bytes, in query order (lowercase first when folded).
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn contains(&self, b: u8) -> bool {
        self.bytes[0] == b || (self.len == 2 && self.bytes[1] == b)
    }
}

/// One query with its precomputed scanning tables and the matching knobs
/// copied out of the configuration.
#[derive(Debug, Clone)]
pub struct QueryData {
    /// Query bytes, lowercased when `ignore_case`.
    q: Vec<u8>,
    /// Accepted bytes per query position.
    qq: Vec<ByteClass>,
    /// Distinct accepted bytes across all positions, in first-seen order.
    include_set: Vec<u8>,
    /// Membership table over `include_set` for O(1) scan tests.
    included: [bool; 256],
    pub ignore_case: bool,
    pub preserve_order: bool,
    pub max_symbol_gap: usize,
    pub word_delims: Vec<u8>,
}

impl QueryData {
    pub fn new(query: &str, cfg: &SearchConfig) -> Self {
        let q: Vec<u8> = if cfg.ignore_case {
            query.bytes().map(|b| b.to_ascii_lowercase()).collect()
        } else {
            query.bytes().collect()
        };

        let mut qq = Vec::with_capacity(q.len());
        let mut include_set = Vec::new();
        let mut included = [false; 256];
        for &b in &q {
            let class = if cfg.ignore_case && b.is_ascii_lowercase() {
                ByteClass::pair(b, b.to_ascii_uppercase())
            } else {
                ByteClass::single(b)
            };
            for &cb in class.bytes() {
                if !included[cb as usize] {
                    included[cb as usize] = true;
                    include_set.push(cb);
                }
            }
            qq.push(class);
        }

        Self {
            q,
            qq,
            include_set,
            included,
            ignore_case: cfg.ignore_case,
            preserve_order: cfg.preserve_order,
            max_symbol_gap: cfg.max_symbol_gap,
            word_delims: cfg.word_delims.bytes().collect(),
        }
    }

    pub fn q(&self) -> &[u8] {
        &self.q
    }

    pub fn q_len(&self) -> usize {
        self.q.len()
    }

    /// Accepted-byte class for query position `j`.
    pub fn class(&self, j: usize) -> ByteClass {
        self.qq[j]
    }

    pub fn classes(&self) -> &[ByteClass] {
        &self.qq
    }

    pub fn include_set(&self) -> &[u8] {
        &self.include_set
    }

    /// Is `b` accepted at any query position?
    pub fn is_included(&self, b: u8) -> bool {
        self.included[b as usize]
    }
}
