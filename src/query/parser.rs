//! Query grammar parser.
//!
//! A query is `fuzzy_part [ ' ;' boolean_part ]`. The fuzzy part is one or
//! more space-separated terms (bare words or `"..."` phrases). The boolean
//! part is a sequence of leaves and the structural symbols `(`, `!(`, `)`,
//! `|`; leaves pick their primitive with a prefix operator (`^` prefix,
//! `$` suffix, `=` substring, `~` fuzzy; bare words and phrases default to
//! fuzzy) and `!` negates the token that follows it. `\` escapes the next
//! byte everywhere.
//!
//! The parser walks a byte cursor and yields the fuzzy-term list and a flat,
//! validated token sequence for [`FilterTree::build`]. Everything it rejects
//! comes back as a [`ParseError`] with a user-facing message.
//!
//! [`FilterTree::build`]: crate::query::tree::FilterTree::build

use crate::config::SearchConfig;
use crate::error::ParseError;
use crate::query::data::QueryData;
use crate::query::tree::{Filter, FilterToken, LeafKind, TokenKind};

/// Parser output: the fuzzy pipeline terms and the boolean token sequence.
#[derive(Debug)]
pub struct ParsedQuery {
    pub fuzzy: Vec<QueryData>,
    pub tokens: Vec<FilterToken>,
}

/// Parse `cfg.query`. Smart case must already be resolved into
/// `cfg.ignore_case`.
pub fn parse(cfg: &SearchConfig) -> Result<ParsedQuery, ParseError> {
    let mut cur = Cursor::new(cfg.query.as_bytes());
    let fuzzy = parse_fuzzies(&mut cur, cfg)?;
    let tokens = parse_boolean(&mut cur, cfg)?;
    Ok(ParsedQuery { fuzzy, tokens })
}

struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.bump();
        }
    }
}

/// Collect bytes until an unescaped delimiter or the end of input. `\` drops
/// out and the byte after it is taken literally, delimiter or not.
fn parse_exact(cur: &mut Cursor, delims: &[u8]) -> Result<String, ParseError> {
    if cur.eof() {
        return Err(ParseError::MissingText);
    }
    let mut out = Vec::new();
    while let Some(b) = cur.peek() {
        if b == b'\\' {
            cur.bump();
            if let Some(escaped) = cur.peek() {
                out.push(escaped);
                cur.bump();
            }
        } else if delims.contains(&b) {
            break;
        } else {
            out.push(b);
            cur.bump();
        }
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Body of a `"..."` phrase, the opening quote already consumed. The byte
/// after the closing quote must be a space, `)`, `|`, or the end of input;
/// anything else is ambiguous and rejected.
fn parse_phrase(cur: &mut Cursor) -> Result<String, ParseError> {
    let s = parse_exact(cur, b"\"")?;
    if s.is_empty() {
        return Err(ParseError::EmptyPhrase);
    }
    if cur.eof() {
        return Err(ParseError::UnclosedPhrase);
    }
    if let Some(after) = cur.peek_at(1) {
        if !matches!(after, b' ' | b')' | b'|') {
            return Err(ParseError::TrailingPhrase);
        }
    }
    cur.bump(); // closing quote
    Ok(s)
}

/// Operand of a leaf operator (`meta` names the operator in errors): either
/// a phrase or a bare word ending at space, `)`, or `|`.
fn parse_meta(cur: &mut Cursor, meta: char) -> Result<String, ParseError> {
    match cur.peek() {
        Some(b'"') => {
            cur.bump();
            parse_phrase(cur)
        }
        Some(b' ') => Err(ParseError::EmptyOperand(meta)),
        _ => parse_exact(cur, b" )|"),
    }
}

/// Fuzzy part: space-separated terms up to an unquoted `;` term or the end
/// of input. A query that starts with `;` has no fuzzy terms and is boolean
/// only.
fn parse_fuzzies(cur: &mut Cursor, cfg: &SearchConfig) -> Result<Vec<QueryData>, ParseError> {
    if cur.eof() {
        return Err(ParseError::EmptyQuery);
    }
    cur.skip_spaces();
    if cur.eof() {
        return Err(ParseError::EmptyQuery);
    }

    let mut terms = Vec::new();
    while !cur.eof() {
        let term = match cur.peek() {
            Some(b'"') => {
                cur.bump();
                let s = parse_phrase(cur)?;
                if let Some(b) = cur.peek() {
                    if b != b' ' {
                        return Err(ParseError::TrailingPhrase);
                    }
                }
                s
            }
            Some(b';') => {
                cur.bump();
                break;
            }
            _ => parse_exact(cur, b" ")?,
        };
        terms.push(QueryData::new(&term, cfg));
        cur.skip_spaces();
    }
    Ok(terms)
}

fn leaf(operand: &str, kind: LeafKind, cfg: &SearchConfig) -> FilterToken {
    FilterToken::leaf(Filter::new(QueryData::new(operand, cfg), kind))
}

/// Produce the next token. `ignore_neg` is set while parsing the token right
/// after a `!`: it turns `(` into a negated group opener and makes a further
/// `!` start a literal bare word (so `!!x` matches the text `!x`).
fn select_parse(
    cur: &mut Cursor,
    cfg: &SearchConfig,
    ignore_neg: bool,
) -> Result<FilterToken, ParseError> {
    let Some(b) = cur.peek() else {
        return Err(ParseError::MissingText);
    };
    match b {
        b'^' => {
            cur.bump();
            Ok(leaf(&parse_meta(cur, '^')?, LeafKind::Prefix, cfg))
        }
        b'$' => {
            cur.bump();
            Ok(leaf(&parse_meta(cur, '$')?, LeafKind::Suffix, cfg))
        }
        b'=' => {
            cur.bump();
            Ok(leaf(&parse_meta(cur, '=')?, LeafKind::Substring, cfg))
        }
        b'~' => {
            cur.bump();
            Ok(leaf(&parse_meta(cur, '~')?, LeafKind::Subsequence, cfg))
        }
        b'"' => {
            cur.bump();
            Ok(leaf(&parse_phrase(cur)?, LeafKind::Subsequence, cfg))
        }
        b'!' if !ignore_neg => {
            cur.bump();
            let mut tok = select_parse(cur, cfg, true)?;
            if let Some(filter) = tok.filter.as_mut() {
                filter.negate = true;
            }
            Ok(tok)
        }
        b'(' => {
            cur.bump();
            Ok(FilterToken::structural(if ignore_neg {
                TokenKind::NotGrpBegin
            } else {
                TokenKind::GrpBegin
            }))
        }
        b')' => {
            cur.bump();
            Ok(FilterToken::structural(TokenKind::GrpEnd))
        }
        b'|' => {
            cur.bump();
            Ok(FilterToken::structural(TokenKind::Or))
        }
        _ => Ok(leaf(&parse_meta(cur, '~')?, LeafKind::Subsequence, cfg)),
    }
}

/// Boolean part: tokenise to the end of input, rejecting token sequences
/// that cannot form a valid expression.
fn parse_boolean(cur: &mut Cursor, cfg: &SearchConfig) -> Result<Vec<FilterToken>, ParseError> {
    let mut tokens: Vec<FilterToken> = Vec::new();
    let mut n_beg = 0usize;
    let mut n_end = 0usize;
    let mut close_before_open = false;

    cur.skip_spaces();
    while !cur.eof() {
        let tok = select_parse(cur, cfg, false)?;

        if let Some(last) = tokens.last() {
            match tok.kind {
                TokenKind::Or => match last.kind {
                    TokenKind::Or => return Err(ParseError::MissingTextAfterOr),
                    TokenKind::GrpBegin | TokenKind::NotGrpBegin => {
                        return Err(ParseError::MissingTextBeforeOr)
                    }
                    _ => {}
                },
                TokenKind::GrpEnd if last.kind == TokenKind::Or => {
                    return Err(ParseError::MissingTextAfterOr)
                }
                _ => {}
            }
        }
        match tok.kind {
            TokenKind::GrpBegin | TokenKind::NotGrpBegin => n_beg += 1,
            TokenKind::GrpEnd => {
                n_end += 1;
                if n_end > n_beg {
                    close_before_open = true;
                }
            }
            _ => {}
        }

        tokens.push(tok);
        cur.skip_spaces();
    }

    if let Some(last) = tokens.last() {
        if matches!(
            last.kind,
            TokenKind::GrpBegin | TokenKind::NotGrpBegin | TokenKind::Or
        ) {
            return Err(ParseError::DanglingOpen);
        }
    }
    if let Some(first) = tokens.first() {
        if matches!(first.kind, TokenKind::GrpEnd | TokenKind::Or) {
            return Err(ParseError::LeadingClose);
        }
    }
    if n_beg != n_end || close_before_open {
        return Err(ParseError::UnbalancedParens);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(query: &str) -> SearchConfig {
        SearchConfig {
            query: query.to_string(),
            ..SearchConfig::default()
        }
    }

    fn parse_ok(query: &str) -> ParsedQuery {
        parse(&cfg(query)).unwrap()
    }

    fn parse_err(query: &str) -> ParseError {
        parse(&cfg(query)).unwrap_err()
    }

    fn fuzzy_terms(parsed: &ParsedQuery) -> Vec<String> {
        parsed
            .fuzzy
            .iter()
            .map(|q| String::from_utf8_lossy(q.q()).into_owned())
            .collect()
    }

    fn kinds(parsed: &ParsedQuery) -> Vec<TokenKind> {
        parsed.tokens.iter().map(|t| t.kind).collect()
    }

    fn leaf_at(parsed: &ParsedQuery, idx: usize) -> &Filter {
        parsed.tokens[idx].filter.as_ref().unwrap()
    }

    #[test]
    fn single_fuzzy_term() {
        let p = parse_ok("abc");
        assert_eq!(fuzzy_terms(&p), ["abc"]);
        assert!(p.tokens.is_empty());
    }

    #[test]
    fn multiple_fuzzy_terms() {
        let p = parse_ok("foo  bar baz");
        assert_eq!(fuzzy_terms(&p), ["foo", "bar", "baz"]);
    }

    #[test]
    fn fuzzy_phrase() {
        let p = parse_ok("\"a b\" c");
        assert_eq!(fuzzy_terms(&p), ["a b", "c"]);
    }

    #[test]
    fn fuzzy_phrase_followed_by_garbage() {
        assert_eq!(parse_err("\"ab\"x"), ParseError::TrailingPhrase);
    }

    #[test]
    fn escaped_space_in_bare_word() {
        let p = parse_ok("a\\ b");
        assert_eq!(fuzzy_terms(&p), ["a b"]);
    }

    #[test]
    fn escaped_quote_in_phrase() {
        let p = parse_ok("\"a\\\"b\"");
        assert_eq!(fuzzy_terms(&p), ["a\"b"]);
    }

    #[test]
    fn semicolon_splits_fuzzy_and_boolean() {
        let p = parse_ok("fz ; x y");
        assert_eq!(fuzzy_terms(&p), ["fz"]);
        assert_eq!(kinds(&p), [TokenKind::Variable, TokenKind::Variable]);
    }

    #[test]
    fn semicolon_inside_word_is_literal() {
        let p = parse_ok("a;b");
        assert_eq!(fuzzy_terms(&p), ["a;b"]);
        assert!(p.tokens.is_empty());
    }

    #[test]
    fn leading_semicolon_means_boolean_only() {
        let p = parse_ok("; a b");
        assert!(p.fuzzy.is_empty());
        assert_eq!(p.tokens.len(), 2);
    }

    #[test]
    fn leaf_operators_select_matchers() {
        let p = parse_ok("; ^pre $suf =sub ~fz bare \"phr\"");
        let kinds: Vec<LeafKind> = (0..6).map(|i| leaf_at(&p, i).kind).collect();
        assert_eq!(
            kinds,
            [
                LeafKind::Prefix,
                LeafKind::Suffix,
                LeafKind::Substring,
                LeafKind::Subsequence,
                LeafKind::Subsequence,
                LeafKind::Subsequence,
            ]
        );
        assert_eq!(leaf_at(&p, 0).qdata.q(), b"pre");
        assert_eq!(leaf_at(&p, 2).qdata.q(), b"sub");
        assert_eq!(leaf_at(&p, 5).qdata.q(), b"phr");
    }

    #[test]
    fn operator_with_phrase_operand() {
        let p = parse_ok("; ^\"as df\"");
        assert_eq!(leaf_at(&p, 0).kind, LeafKind::Prefix);
        assert_eq!(leaf_at(&p, 0).qdata.q(), b"as df");
    }

    #[test]
    fn negation_binds_to_next_token() {
        let p = parse_ok("; !foo !$bar");
        assert!(leaf_at(&p, 0).negate);
        assert_eq!(leaf_at(&p, 0).qdata.q(), b"foo");
        assert!(leaf_at(&p, 1).negate);
        assert_eq!(leaf_at(&p, 1).kind, LeafKind::Suffix);
    }

    #[test]
    fn double_bang_is_literal() {
        let p = parse_ok("; !!foo");
        let f = leaf_at(&p, 0);
        assert!(f.negate);
        assert_eq!(f.qdata.q(), b"!foo");
    }

    #[test]
    fn negated_group_token() {
        let p = parse_ok("; !(a b)");
        assert_eq!(
            kinds(&p),
            [
                TokenKind::NotGrpBegin,
                TokenKind::Variable,
                TokenKind::Variable,
                TokenKind::GrpEnd,
            ]
        );
    }

    #[test]
    fn groups_and_ors_tokenise() {
        let p = parse_ok("; a | (b c) | d");
        assert_eq!(
            kinds(&p),
            [
                TokenKind::Variable,
                TokenKind::Or,
                TokenKind::GrpBegin,
                TokenKind::Variable,
                TokenKind::Variable,
                TokenKind::GrpEnd,
                TokenKind::Or,
                TokenKind::Variable,
            ]
        );
    }

    #[test]
    fn parens_and_pipes_end_bare_words() {
        let p = parse_ok("; a|b");
        assert_eq!(
            kinds(&p),
            [TokenKind::Variable, TokenKind::Or, TokenKind::Variable]
        );
        let p = parse_ok("; (a)b");
        assert_eq!(
            kinds(&p),
            [
                TokenKind::GrpBegin,
                TokenKind::Variable,
                TokenKind::GrpEnd,
                TokenKind::Variable,
            ]
        );
    }

    #[test]
    fn escaped_meta_characters_are_literal() {
        let p = parse_ok("; \\(a\\)");
        assert_eq!(p.tokens.len(), 1);
        assert_eq!(leaf_at(&p, 0).qdata.q(), b"(a)");
    }

    #[test]
    fn empty_query_errors() {
        assert_eq!(parse_err(""), ParseError::EmptyQuery);
        assert_eq!(parse_err("   "), ParseError::EmptyQuery);
    }

    #[test]
    fn empty_phrase_errors() {
        assert_eq!(parse_err("\"\""), ParseError::EmptyPhrase);
    }

    #[test]
    fn unclosed_phrase_errors() {
        assert_eq!(parse_err("\"abc"), ParseError::UnclosedPhrase);
    }

    #[test]
    fn empty_operator_operand_errors() {
        assert_eq!(parse_err("; ^ foo"), ParseError::EmptyOperand('^'));
        assert_eq!(parse_err("; $ foo"), ParseError::EmptyOperand('$'));
        assert_eq!(parse_err("; ~ foo"), ParseError::EmptyOperand('~'));
    }

    #[test]
    fn dangling_or_and_open_errors() {
        assert_eq!(parse_err("; ("), ParseError::DanglingOpen);
        assert_eq!(parse_err("; a |"), ParseError::DanglingOpen);
        assert_eq!(parse_err("; a ("), ParseError::DanglingOpen);
    }

    #[test]
    fn leading_or_and_close_errors() {
        assert_eq!(parse_err("; ) a"), ParseError::LeadingClose);
        assert_eq!(parse_err("; | a"), ParseError::LeadingClose);
    }

    #[test]
    fn double_or_errors() {
        assert_eq!(parse_err("; a||b"), ParseError::MissingTextAfterOr);
        assert_eq!(parse_err("; a | | b"), ParseError::MissingTextAfterOr);
    }

    #[test]
    fn or_against_group_boundaries_errors() {
        assert_eq!(parse_err("; (| a)"), ParseError::MissingTextBeforeOr);
        assert_eq!(parse_err("; (a |) b"), ParseError::MissingTextAfterOr);
    }

    #[test]
    fn unbalanced_parens_errors() {
        assert_eq!(parse_err("; (a"), ParseError::UnbalancedParens);
        assert_eq!(parse_err("; a ) ( b"), ParseError::UnbalancedParens);
    }

    #[test]
    fn ignore_case_flows_into_query_data() {
        let mut c = cfg("AbC ; =DeF");
        c.ignore_case = true;
        let p = parse(&c).unwrap();
        assert_eq!(p.fuzzy[0].q(), b"abc");
        assert_eq!(p.tokens[0].filter.as_ref().unwrap().qdata.q(), b"def");
    }
}
