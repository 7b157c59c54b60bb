//! Search driver.
//!
//! Runs a parsed query over in-memory lines, files, or stdin, sequentially
//! or in parallel. The parallel path keeps one worker per logical CPU; each
//! round it fills the workers' batches round-robin from the input, then maps
//! the batch evaluation across the workers with rayon. Each worker owns its
//! query clone (scratch included) and its own top-k heap; nothing is shared
//! during evaluation. Heaps are merged at the end and sorted ascending by
//! score.
//!
//! Failure to open or read an input file is reported on stderr with the
//! filename and the driver continues with the remaining files; only parse
//! errors abort a search.

pub mod heap;
pub mod regex;

pub use self::regex::regex_search_lines;

use crate::config::{GapPenalty, SearchConfig};
use crate::error::SearchError;
use crate::fuzzy::{GapScorer, LinearScorer, LogScorer, ScoreResult};
use crate::query::{parse_query, Query};
use heap::TopK;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Where a hit came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    pub text: String,
    /// Empty for stdin and in-memory input.
    pub filename: String,
    /// 1-based, assigned at read time, per file.
    pub lineno: u64,
}

/// One search result: the score with its embedding positions, plus the line
/// it came from.
#[derive(Debug, Clone)]
pub struct Hit {
    pub result: ScoreResult,
    pub info: MatchInfo,
}

/// Search in-memory lines with the configured query.
pub fn search_lines(cfg: &SearchConfig, lines: &[String]) -> Result<Vec<Hit>, SearchError> {
    let mut cfg = cfg.clone();
    cfg.resolve_smart_case();
    match cfg.gap_penalty {
        GapPenalty::Linear => search_lines_with::<LinearScorer>(&cfg, lines),
        GapPenalty::Log => search_lines_with::<LogScorer>(&cfg, lines),
    }
}

/// Search the configured input files (stdin when the list is empty).
pub fn search_input(cfg: &SearchConfig) -> Result<Vec<Hit>, SearchError> {
    let mut cfg = cfg.clone();
    cfg.resolve_smart_case();
    match cfg.gap_penalty {
        GapPenalty::Linear => search_input_with::<LinearScorer>(&cfg),
        GapPenalty::Log => search_input_with::<LogScorer>(&cfg),
    }
}

fn search_lines_with<S: GapScorer>(
    cfg: &SearchConfig,
    lines: &[String],
) -> Result<Vec<Hit>, SearchError> {
    let query: Query<S> = parse_query(cfg)?;

    if !cfg.parallel {
        let mut query = query;
        let mut top = TopK::new(cfg.top_k);
        for (i, line) in lines.iter().enumerate() {
            eval_line(&mut query, line, "", (i + 1) as u64, &mut top);
        }
        return Ok(merge(vec![top], cfg.top_k));
    }

    let mut workers = make_workers(&query, cfg.top_k);
    let mut batches: Vec<Vec<MatchInfo>> = vec![Vec::new(); workers.len()];
    let mut source = lines.iter().enumerate().map(|(i, line)| MatchInfo {
        text: line.clone(),
        filename: String::new(),
        lineno: (i + 1) as u64,
    });

    loop {
        let exhausted = fill_batches(&mut batches, &mut source, cfg.batch_size);
        run_batches(&mut workers, &batches);
        if exhausted {
            break;
        }
    }

    Ok(merge(workers.into_iter().map(|w| w.top).collect(), cfg.top_k))
}

fn search_input_with<S: GapScorer>(cfg: &SearchConfig) -> Result<Vec<Hit>, SearchError> {
    let query: Query<S> = parse_query(cfg)?;
    let stdin_only = [PathBuf::new()];
    let files: &[PathBuf] = if cfg.files.is_empty() {
        &stdin_only
    } else {
        &cfg.files
    };

    if !cfg.parallel {
        let mut query = query;
        let mut top = TopK::new(cfg.top_k);
        for path in files {
            let Some((reader, name)) = open_input(path) else {
                continue;
            };
            let mut lineno = 0u64;
            for line in read_lines(reader, &name) {
                lineno += 1;
                eval_line(&mut query, &line, &name, lineno, &mut top);
            }
        }
        return Ok(merge(vec![top], cfg.top_k));
    }

    let mut workers = make_workers(&query, cfg.top_k);
    let mut batches: Vec<Vec<MatchInfo>> = vec![Vec::new(); workers.len()];

    for path in files {
        let Some((reader, name)) = open_input(path) else {
            continue;
        };
        let mut lineno = 0u64;
        let mut source = read_lines(reader, &name).map(|text| {
            lineno += 1;
            MatchInfo {
                text,
                filename: name.clone(),
                lineno,
            }
        });
        loop {
            let exhausted = fill_batches(&mut batches, &mut source, cfg.batch_size);
            run_batches(&mut workers, &batches);
            if exhausted {
                break;
            }
        }
    }

    Ok(merge(workers.into_iter().map(|w| w.top).collect(), cfg.top_k))
}

/// Read every line of the configured inputs into memory (for the TUI and the
/// regex filter). Unreadable files are skipped with a diagnostic.
pub fn load_lines(files: &[PathBuf]) -> Vec<String> {
    let stdin_only = [PathBuf::new()];
    let files: &[PathBuf] = if files.is_empty() { &stdin_only } else { files };
    let mut lines = Vec::new();
    for path in files {
        let Some((reader, name)) = open_input(path) else {
            continue;
        };
        lines.extend(read_lines(reader, &name));
    }
    lines
}

struct Worker<S: GapScorer> {
    query: Query<S>,
    top: TopK,
}

fn make_workers<S: GapScorer>(query: &Query<S>, top_k: usize) -> Vec<Worker<S>> {
    let n = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (0..n)
        .map(|_| Worker {
            query: query.clone(),
            top: TopK::new(top_k),
        })
        .collect()
}

/// Round-robin-fill each worker's batch with up to `batch_size` lines.
/// Returns true when the source ran dry.
fn fill_batches(
    batches: &mut [Vec<MatchInfo>],
    source: &mut impl Iterator<Item = MatchInfo>,
    batch_size: usize,
) -> bool {
    for batch in batches.iter_mut() {
        batch.clear();
    }
    for _ in 0..batch_size {
        for batch in batches.iter_mut() {
            match source.next() {
                Some(info) => batch.push(info),
                None => return true,
            }
        }
    }
    false
}

fn run_batches<S: GapScorer>(workers: &mut [Worker<S>], batches: &[Vec<MatchInfo>]) {
    workers
        .par_iter_mut()
        .zip(batches.par_iter())
        .for_each(|(worker, batch)| {
            for info in batch {
                eval_line(
                    &mut worker.query,
                    &info.text,
                    &info.filename,
                    info.lineno,
                    &mut worker.top,
                );
            }
        });
}

fn eval_line<S: GapScorer>(
    query: &mut Query<S>,
    text: &str,
    filename: &str,
    lineno: u64,
    top: &mut TopK,
) -> bool {
    let Some(result) = query.eval(text.as_bytes()) else {
        return false;
    };
    top.offer(Hit {
        result,
        info: MatchInfo {
            text: text.to_string(),
            filename: filename.to_string(),
            lineno,
        },
    });
    true
}

/// Concatenate the per-worker heaps, sort ascending by score, and keep the
/// best `top_k`. The sort is stable, so score ties resolve to the order the
/// heaps yield them, worker by worker.
fn merge(heaps: Vec<TopK>, top_k: usize) -> Vec<Hit> {
    let mut hits: Vec<Hit> = Vec::with_capacity(heaps.iter().map(TopK::len).sum());
    for heap in heaps {
        let mut part = heap.into_vec();
        part.sort_by(|a, b| a.result.score.total_cmp(&b.result.score));
        hits.extend(part);
    }
    hits.sort_by(|a, b| a.result.score.total_cmp(&b.result.score));
    hits.truncate(top_k);
    hits
}

/// Open one input: an empty path or `-` means stdin. Open failures are
/// reported and yield `None`.
fn open_input(path: &Path) -> Option<(Box<dyn BufRead>, String)> {
    if path.as_os_str().is_empty() || path.as_os_str() == "-" {
        return Some((Box::new(BufReader::new(io::stdin())), String::new()));
    }
    match File::open(path) {
        Ok(file) => Some((
            Box::new(BufReader::new(file)),
            path.display().to_string(),
        )),
        Err(err) => {
            eprintln!("fzl: {}: {}", path.display(), err);
            None
        }
    }
}

/// Iterate the lines of a reader, stopping (with a diagnostic) on the first
/// read error.
fn read_lines<'a>(reader: Box<dyn BufRead>, name: &'a str) -> impl Iterator<Item = String> + 'a {
    reader.lines().map_while(move |line| match line {
        Ok(line) => Some(line),
        Err(err) => {
            let shown = if name.is_empty() { "<stdin>" } else { name };
            eprintln!("fzl: {}: {}", shown, err);
            None
        }
    })
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

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sequential_search_finds_and_ranks() {
        let lines = lines(&["no match here", "xabcx", "a-b-c spread"]);
        let hits = search_lines(&cfg("abc"), &lines).unwrap();
        assert_eq!(hits.len(), 2);
        // The tight embedding ranks first.
        assert_eq!(hits[0].info.text, "xabcx");
        assert_eq!(hits[0].info.lineno, 2);
        assert!(hits[0].result.score <= hits[1].result.score);
    }

    #[test]
    fn results_are_sorted_and_bounded() {
        let texts: Vec<String> = (0..100).map(|i| format!("abc pad {i:03}")).collect();
        let mut c = cfg("abc");
        c.top_k = 7;
        let hits = search_lines(&c, &texts).unwrap();
        assert_eq!(hits.len(), 7);
        assert!(hits
            .windows(2)
            .all(|w| w[0].result.score <= w[1].result.score));
    }

    #[test]
    fn parallel_matches_sequential() {
        let texts: Vec<String> = (0..500)
            .map(|i| match i % 3 {
                0 => format!("fuzzy line {i}"),
                1 => format!("f-u-z-z-y spread {i}"),
                _ => format!("nothing here {i}"),
            })
            .collect();

        let mut seq_cfg = cfg("fzy");
        seq_cfg.top_k = 20;
        let mut par_cfg = seq_cfg.clone();
        par_cfg.parallel = true;
        par_cfg.batch_size = 17; // force several fill rounds

        let seq = search_lines(&seq_cfg, &texts).unwrap();
        let par = search_lines(&par_cfg, &texts).unwrap();

        assert_eq!(seq.len(), par.len());
        // Ties at the cut-off may retain different lines; the kept score
        // multiset is what both modes must agree on.
        let key = |hits: &[Hit]| -> Vec<String> {
            let mut v: Vec<String> = hits
                .iter()
                .map(|h| format!("{:.4}", h.result.score))
                .collect();
            v.sort();
            v
        };
        assert_eq!(key(&seq), key(&par));
    }

    #[test]
    fn smart_case_is_resolved_before_parsing() {
        let lines = lines(&["ABC", "abc"]);
        let mut c = cfg("abc");
        c.smart_case = true;
        let hits = search_lines(&c, &lines).unwrap();
        assert_eq!(hits.len(), 2);

        let mut c = cfg("ABC");
        c.smart_case = true;
        let hits = search_lines(&c, &lines).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].info.text, "ABC");
    }

    #[test]
    fn boolean_part_filters_results() {
        let lines = lines(&["axb", "ayb", "azb"]);
        let mut c = cfg("ab ; x | y");
        c.top_k = 2;
        let hits = search_lines(&c, &lines).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.info.text != "azb"));
    }

    #[test]
    fn parse_errors_abort_the_search() {
        let lines = lines(&["anything"]);
        assert!(matches!(
            search_lines(&cfg(""), &lines),
            Err(SearchError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_skipped() {
        let mut c = cfg("abc");
        c.files = vec![PathBuf::from("/nonexistent/fzl-test-input")];
        let hits = search_input(&c).unwrap();
        assert!(hits.is_empty());
    }
}
