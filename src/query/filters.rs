//! Leaf matchers: the primitive predicates evaluated against one line.
//!
//! All four operate on `(line, QueryData)` and report the match start (or the
//! subsequence bounds) as byte offsets. They match against the query's
//! accepted-byte classes, so case folding costs nothing per line.

use crate::query::data::{ByteClass, QueryData};
use memchr::{memchr, memchr2};

/// First position at or after `from` whose byte is in `class`.
fn find_class(line: &[u8], from: usize, class: ByteClass) -> Option<usize> {
    if from >= line.len() {
        return None;
    }
    let hay = &line[from..];
    let found = match class.bytes() {
        [a] => memchr(*a, hay),
        [a, b] => memchr2(*a, *b, hay),
        _ => unreachable!("byte class holds one or two bytes"),
    };
    found.map(|i| from + i)
}

/// Match the query against the start of the line. Returns `Some(0)` on match.
pub fn find_prefix(line: &[u8], qd: &QueryData) -> Option<usize> {
    if line.len() < qd.q_len() {
        return None;
    }
    for (j, class) in qd.classes().iter().enumerate() {
        if !class.contains(line[j]) {
            return None;
        }
    }
    Some(0)
}

/// Match the query against the end of the line. Returns the suffix start.
pub fn find_suffix(line: &[u8], qd: &QueryData) -> Option<usize> {
    if line.len() < qd.q_len() {
        return None;
    }
    let start = line.len() - qd.q_len();
    for (j, class) in qd.classes().iter().enumerate() {
        if !class.contains(line[start + j]) {
            return None;
        }
    }
    Some(start)
}

/// Find the first contiguous occurrence of the query. Candidate starts are
/// located with a first-byte scan, vetted by the last byte, and only then
/// checked in full.
pub fn find_substring(line: &[u8], qd: &QueryData) -> Option<usize> {
    let q_len = qd.q_len();
    if q_len == 0 || line.len() < q_len {
        return None;
    }
    let first = qd.class(0);
    let last = qd.class(q_len - 1);
    let mut pos = 0;
    while let Some(cand) = find_class(line, pos, first) {
        if line.len() - cand < q_len {
            return None;
        }
        pos = cand + 1;
        if !last.contains(line[cand + q_len - 1]) {
            continue;
        }
        if find_prefix(&line[cand..], qd).is_some() {
            return Some(cand);
        }
    }
    None
}

/// Find the query as a (not necessarily contiguous) subsequence. Returns the
/// positions of the first and last matched bytes; the range is what the
/// fuzzy scorer uses to bound its graph.
pub fn find_subseq_range(line: &[u8], qd: &QueryData) -> Option<(usize, usize)> {
    if qd.q_len() == 0 {
        return None;
    }
    let mut start = 0;
    let mut end = 0;
    let mut pos = 0;
    for (j, &class) in qd.classes().iter().enumerate() {
        let i = find_class(line, pos, class)?;
        if j == 0 {
            start = i;
        }
        end = i;
        pos = i + 1;
    }
    Some((start, end))
}

/// Subsequence presence; start position only.
pub fn find_subseq(line: &[u8], qd: &QueryData) -> Option<usize> {
    find_subseq_range(line, qd).map(|(start, _)| start)
}
