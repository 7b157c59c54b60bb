//! Boolean filter tree.
//!
//! The parser emits a flat token sequence (leaves plus `(`, `!(`, `)`, `|`);
//! [`FilterTree::build`] turns it into an expression tree by mutually
//! recursive descent. There is no AND token: adjacent leaves are AND'd, `|`
//! separates AND runs, and groups nest.
//!
//! When the expression contains no groups the tree is collapsed into a flat
//! OR-of-ANDs table — two nested loops with short-circuiting and no per-node
//! indirection, which is the common case for interactive queries.

use crate::query::data::QueryData;
use crate::query::filters;

/// Which primitive a leaf evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Prefix,
    Suffix,
    Substring,
    Subsequence,
}

/// A leaf predicate: a query, the primitive to run it through, and an
/// optional negation.
#[derive(Debug, Clone)]
pub struct Filter {
    pub qdata: QueryData,
    pub negate: bool,
    pub kind: LeafKind,
}

impl Filter {
    pub fn new(qdata: QueryData, kind: LeafKind) -> Self {
        Self {
            qdata,
            negate: false,
            kind,
        }
    }

    /// Evaluate the leaf against a line, applying the negation.
    pub fn is_match(&self, line: &[u8]) -> bool {
        let found = match self.kind {
            LeafKind::Prefix => filters::find_prefix(line, &self.qdata).is_some(),
            LeafKind::Suffix => filters::find_suffix(line, &self.qdata).is_some(),
            LeafKind::Substring => filters::find_substring(line, &self.qdata).is_some(),
            LeafKind::Subsequence => filters::find_subseq(line, &self.qdata).is_some(),
        };
        found != self.negate
    }
}

/// Token kind in the parsed boolean expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Variable,
    GrpBegin,
    NotGrpBegin,
    GrpEnd,
    Or,
}

/// One token of the boolean part: a structural symbol, or a leaf carrying
/// its filter.
#[derive(Debug, Clone)]
pub struct FilterToken {
    pub kind: TokenKind,
    pub filter: Option<Filter>,
}

impl FilterToken {
    pub fn structural(kind: TokenKind) -> Self {
        Self { kind, filter: None }
    }

    pub fn leaf(filter: Filter) -> Self {
        Self {
            kind: TokenKind::Variable,
            filter: Some(filter),
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Or { negate: bool, children: Vec<Node> },
    And(Vec<Node>),
    Variable(Filter),
}

impl Node {
    fn is_match(&self, line: &[u8]) -> bool {
        match self {
            Node::Or { negate, children } => {
                children.iter().any(|c| c.is_match(line) != *negate)
            }
            Node::And(children) => children.iter().all(|c| c.is_match(line)),
            Node::Variable(filter) => filter.is_match(line),
        }
    }
}

/// A parsed boolean expression, evaluated per line.
///
/// Exactly one of `root` / `flat` is populated after [`build`](Self::build)
/// unless the token list was empty, in which case the tree is the constant
/// `true` predicate.
#[derive(Debug, Clone, Default)]
pub struct FilterTree {
    root: Option<Node>,
    flat: Option<Vec<Vec<Filter>>>,
    node_count: usize,
}

impl FilterTree {
    /// Build the tree for a validated token sequence.
    ///
    /// The sequence is assumed well-formed (the parser rejects anything
    /// else); this function does no validation of its own.
    pub fn build(tokens: Vec<FilterToken>) -> Self {
        if tokens.is_empty() {
            return Self::default();
        }

        let mut it = tokens.into_iter().peekable();
        let mut info = TreeInfo::default();
        let root = make_or(&mut it, false, false, &mut info);

        let mut tree = Self {
            root: Some(root),
            flat: None,
            node_count: info.n_nodes,
        };
        // No subgroups anywhere: collapse into the OR-of-ANDs table.
        if info.depth == 0 {
            tree.flatten();
        }
        tree
    }

    /// Evaluate the expression on a line. An empty tree matches everything.
    pub fn is_match(&self, line: &[u8]) -> bool {
        if let Some(rows) = &self.flat {
            return rows
                .iter()
                .any(|row| row.iter().all(|filter| filter.is_match(line)));
        }
        match &self.root {
            Some(root) => root.is_match(line),
            None => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.flat.is_none()
    }

    /// Number of leaf filters in the expression.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    fn flatten(&mut self) {
        let Some(Node::Or { children, .. }) = self.root.take() else {
            return;
        };
        let mut rows = Vec::with_capacity(children.len());
        for and in children {
            let Node::And(vars) = and else {
                unreachable!("or children are and nodes");
            };
            let row = vars
                .into_iter()
                .map(|v| match v {
                    Node::Variable(filter) => filter,
                    // depth == 0 means no groups were parsed anywhere.
                    _ => unreachable!("flat and children are variables"),
                })
                .collect();
            rows.push(row);
        }
        self.flat = Some(rows);
    }
}

#[derive(Default)]
struct TreeInfo {
    depth: usize,
    n_nodes: usize,
}

type Tokens = std::iter::Peekable<std::vec::IntoIter<FilterToken>>;

/// OR node: one AND child per `|`-separated run. Inside a group, stops at
/// and consumes the matching `)`.
fn make_or(it: &mut Tokens, negate: bool, in_group: bool, info: &mut TreeInfo) -> Node {
    let mut children = vec![make_and(it, info)];
    while let Some(tok) = it.peek() {
        match tok.kind {
            TokenKind::Or => {
                it.next();
                children.push(make_and(it, info));
            }
            TokenKind::GrpEnd => {
                if in_group {
                    it.next();
                }
                break;
            }
            _ => unreachable!("make_and stops only at `|`, `)`, or end"),
        }
    }
    Node::Or { negate, children }
}

/// AND node: consecutive variables/groups up to the next `|`, `)`, or end.
fn make_and(it: &mut Tokens, info: &mut TreeInfo) -> Node {
    let mut children = Vec::new();
    while let Some(tok) = it.peek() {
        match tok.kind {
            TokenKind::Or | TokenKind::GrpEnd => break,
            _ => children.push(make_variable(it, info)),
        }
    }
    Node::And(children)
}

/// A leaf, or a (possibly negated) subgroup parsed up to its matching `)`.
fn make_variable(it: &mut Tokens, info: &mut TreeInfo) -> Node {
    let tok = it.next().expect("caller peeked a token");
    match tok.kind {
        TokenKind::GrpBegin | TokenKind::NotGrpBegin => {
            info.depth += 1;
            make_or(it, tok.kind == TokenKind::NotGrpBegin, true, info)
        }
        TokenKind::Variable => {
            info.n_nodes += 1;
            Node::Variable(tok.filter.expect("variable token carries a filter"))
        }
        _ => unreachable!("validated token stream"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;

    fn leaf(q: &str) -> FilterToken {
        leaf_kind(q, LeafKind::Substring, false)
    }

    fn leaf_kind(q: &str, kind: LeafKind, negate: bool) -> FilterToken {
        let cfg = SearchConfig::default();
        let mut filter = Filter::new(QueryData::new(q, &cfg), kind);
        filter.negate = negate;
        FilterToken::leaf(filter)
    }

    fn tok(kind: TokenKind) -> FilterToken {
        FilterToken::structural(kind)
    }

    #[test]
    fn empty_tree_matches_everything() {
        let tree = FilterTree::build(Vec::new());
        assert!(tree.is_empty());
        assert!(tree.is_match(b"anything"));
        assert!(tree.is_match(b""));
    }

    #[test]
    fn single_leaf() {
        let tree = FilterTree::build(vec![leaf("foo")]);
        assert!(tree.is_match(b"a foo b"));
        assert!(!tree.is_match(b"bar"));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn adjacent_leaves_are_anded() {
        let tree = FilterTree::build(vec![leaf("a"), leaf("b")]);
        assert!(tree.is_match(b"ab"));
        assert!(tree.is_match(b"b then a"));
        assert!(!tree.is_match(b"a only"));
    }

    #[test]
    fn pipe_is_or() {
        let tree = FilterTree::build(vec![leaf("x"), tok(TokenKind::Or), leaf("y")]);
        assert!(tree.is_match(b"axb"));
        assert!(tree.is_match(b"ayb"));
        assert!(!tree.is_match(b"azb"));
    }

    #[test]
    fn flat_and_nested_agree() {
        // x a | y a  without groups (flattened) ...
        let flat = FilterTree::build(vec![
            leaf("x"),
            leaf("a"),
            tok(TokenKind::Or),
            leaf("y"),
            leaf("a"),
        ]);
        // ... and the same expression with redundant groups (tree path).
        let nested = FilterTree::build(vec![
            tok(TokenKind::GrpBegin),
            leaf("x"),
            leaf("a"),
            tok(TokenKind::GrpEnd),
            tok(TokenKind::Or),
            tok(TokenKind::GrpBegin),
            leaf("y"),
            leaf("a"),
            tok(TokenKind::GrpEnd),
        ]);
        for line in [&b"xa"[..], b"ya", b"xb", b"yb", b"a", b""] {
            assert_eq!(flat.is_match(line), nested.is_match(line), "{line:?}");
        }
    }

    #[test]
    fn negated_group() {
        // !(a b): true unless the line contains both a and b.
        let tree = FilterTree::build(vec![
            tok(TokenKind::NotGrpBegin),
            leaf("a"),
            leaf("b"),
            tok(TokenKind::GrpEnd),
        ]);
        assert!(!tree.is_match(b"a b"));
        assert!(tree.is_match(b"a c"));
        assert!(tree.is_match(b"x"));
    }

    #[test]
    fn nested_groups() {
        // c (a | (b d))
        let tree = FilterTree::build(vec![
            leaf("c"),
            tok(TokenKind::GrpBegin),
            leaf("a"),
            tok(TokenKind::Or),
            tok(TokenKind::GrpBegin),
            leaf("b"),
            leaf("d"),
            tok(TokenKind::GrpEnd),
            tok(TokenKind::GrpEnd),
        ]);
        assert!(tree.is_match(b"ca"));
        assert!(tree.is_match(b"cbd"));
        assert!(!tree.is_match(b"cb"));
        assert!(!tree.is_match(b"abd"));
    }

    #[test]
    fn negated_leaf() {
        let tree = FilterTree::build(vec![leaf_kind("a", LeafKind::Substring, true)]);
        assert!(!tree.is_match(b"has a"));
        assert!(tree.is_match(b"nothing"));
    }

    #[test]
    fn leaf_kinds_dispatch() {
        let prefix = FilterTree::build(vec![leaf_kind("foo", LeafKind::Prefix, false)]);
        assert!(prefix.is_match(b"foobar"));
        assert!(!prefix.is_match(b"xfoo"));

        let suffix = FilterTree::build(vec![leaf_kind("foo", LeafKind::Suffix, false)]);
        assert!(suffix.is_match(b"xfoo"));
        assert!(!suffix.is_match(b"foox"));

        let subseq = FilterTree::build(vec![leaf_kind("fb", LeafKind::Subsequence, false)]);
        assert!(subseq.is_match(b"foobar"));
        assert!(!subseq.is_match(b"barfo"));
    }

    /// Naive reference evaluation for randomized-ish cross-checks.
    fn expected(line: &[u8], a: bool, b: bool, c: bool) -> bool {
        let _ = line;
        // (a b) | !c
        (a && b) || !c
    }

    #[test]
    fn matches_naive_boolean_evaluation() {
        // (a b) | !c over lines drawn from {a,b,c} subsets.
        let tree = FilterTree::build(vec![
            tok(TokenKind::GrpBegin),
            leaf("a"),
            leaf("b"),
            tok(TokenKind::GrpEnd),
            tok(TokenKind::Or),
            leaf_kind("c", LeafKind::Substring, true),
        ]);
        for line in [
            &b""[..],
            b"a",
            b"b",
            b"c",
            b"ab",
            b"ac",
            b"bc",
            b"abc",
        ] {
            let a = line.contains(&b'a');
            let b = line.contains(&b'b');
            let c = line.contains(&b'c');
            assert_eq!(tree.is_match(line), expected(line, a, b, c), "{line:?}");
        }
    }
}
