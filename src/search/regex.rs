//! Parallel regex filtering.
//!
//! The selector can repopulate its list from a regular expression instead of
//! the fuzzy query. Evaluation is delegated entirely to the `regex` crate;
//! this module only fans the lines out with rayon and shapes the matches
//! into [`Hit`]s (score 0, positions covering every match span) so the rest
//! of the pipeline treats them like any other result.

use crate::error::SearchError;
use crate::search::{Hit, MatchInfo};
use rayon::prelude::*;
use regex::Regex;

/// Keep the lines matching `pattern`, in input order.
pub fn regex_search_lines(pattern: &str, lines: &[String]) -> Result<Vec<Hit>, SearchError> {
    let re = Regex::new(pattern)?;
    let hits = lines
        .par_iter()
        .enumerate()
        .filter_map(|(i, line)| {
            let mut positions = Vec::new();
            for m in re.find_iter(line) {
                positions.extend(m.range());
            }
            if positions.is_empty() {
                return None;
            }
            Some(Hit {
                result: crate::fuzzy::ScoreResult {
                    score: 0.0,
                    positions,
                },
                info: MatchInfo {
                    text: line.clone(),
                    filename: String::new(),
                    lineno: (i + 1) as u64,
                },
            })
        })
        .collect();
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keeps_matching_lines_in_order() {
        let lines = lines(&["foo 1", "bar 2", "foo 3"]);
        let hits = regex_search_lines("^foo", &lines).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].info.lineno, 1);
        assert_eq!(hits[1].info.lineno, 3);
    }

    #[test]
    fn positions_cover_all_match_spans() {
        let lines = lines(&["xaxa"]);
        let hits = regex_search_lines("a", &lines).unwrap();
        assert_eq!(hits[0].result.positions, vec![1, 3]);
    }

    #[test]
    fn zero_width_matches_do_not_count() {
        let lines = lines(&["abc"]);
        let hits = regex_search_lines("x*", &lines).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(matches!(
            regex_search_lines("(", &lines(&["x"])),
            Err(SearchError::Regex(_))
        ));
    }
}
