use anyhow::Result;
use clap::Parser;
use fzl::config::{ConfigFile, GapPenalty, SearchConfig};
use fzl::{output, search, tui};
use std::io::BufRead;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "fzl")]
#[command(about = "Interactive fuzzy line selector for the terminal")]
struct Cli {
    /// Input files (stdin when omitted)
    files: Vec<PathBuf>,

    /// Run one search with this query and print the results (no TUI)
    #[arg(short = 'f', long, value_name = "QUERY")]
    filter: Option<String>,

    /// Filter lines with a regular expression and print the results (no TUI)
    #[arg(long, value_name = "PATTERN", conflicts_with = "filter")]
    regex: Option<String>,

    /// Case insensitive matching (-i)
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// Case insensitive unless the query contains an uppercase character
    #[arg(short = 's', long)]
    smart_case: bool,

    /// Fuzzy terms must match in query order
    #[arg(short = 'o', long)]
    preserve_order: bool,

    /// Evaluate lines on one worker per logical CPU
    #[arg(short = 'p', long)]
    parallel: bool,

    /// Number of results to keep
    #[arg(short = 'k', long, value_name = "N")]
    top_k: Option<usize>,

    /// Lines handed to each worker per batch
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,

    /// Largest embedding hop the fuzzy scorer explores
    #[arg(long, value_name = "N")]
    max_gap: Option<usize>,

    /// Gap cost model: linear or log
    #[arg(long, value_name = "MODEL")]
    gap_penalty: Option<String>,

    /// Bytes treated as word boundaries by the scorer
    #[arg(long, value_name = "CHARS")]
    word_delims: Option<String>,

    /// JSON defaults file
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read the list of input files from stdin, one path per line
    #[arg(long)]
    stdin_files: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = SearchConfig::default();
    if let Some(path) = &cli.config {
        ConfigFile::load(path)?.apply(&mut cfg);
    }

    if cli.ignore_case {
        cfg.ignore_case = true;
    }
    if cli.smart_case {
        cfg.smart_case = true;
    }
    if cli.preserve_order {
        cfg.preserve_order = true;
    }
    if cli.parallel {
        cfg.parallel = true;
    }
    if let Some(k) = cli.top_k {
        cfg.top_k = k;
    }
    if let Some(n) = cli.batch_size {
        cfg.batch_size = n;
    }
    if let Some(n) = cli.max_gap {
        cfg.max_symbol_gap = n;
    }
    if let Some(model) = &cli.gap_penalty {
        cfg.gap_penalty = GapPenalty::from_str(model)?;
    }
    if let Some(delims) = &cli.word_delims {
        cfg.word_delims = delims.clone();
    }
    cfg.validate()?;

    cfg.files = cli.files;
    if cli.stdin_files {
        cfg.files.extend(filenames_from_stdin());
    }

    if let Some(query) = cli.filter {
        cfg.query = query;
        let hits = search::search_input(&cfg)?;
        output::print_hits(&hits, !cli.no_color)?;
        return Ok(());
    }

    if let Some(pattern) = cli.regex {
        let lines = search::load_lines(&cfg.files);
        let hits = search::regex_search_lines(&pattern, &lines)?;
        output::print_hits(&hits, !cli.no_color)?;
        return Ok(());
    }

    let lines = search::load_lines(&cfg.files);
    if let Some(selection) = tui::run(lines, cfg)? {
        println!("{selection}");
    }
    Ok(())
}

fn filenames_from_stdin() -> Vec<PathBuf> {
    std::io::stdin()
        .lock()
        .lines()
        .map_while(Result::ok)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}
