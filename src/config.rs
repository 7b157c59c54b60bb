//! Search configuration.
//!
//! A [`SearchConfig`] is the value object describing one search pass: the
//! query string, matching flags, batching parameters, and input files. It is
//! immutable once the pass starts; smart case is resolved into `ignore_case`
//! up front by [`SearchConfig::resolve_smart_case`].
//!
//! Defaults can also be loaded from a small JSON file ([`ConfigFile`]);
//! command-line flags take precedence over it.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Cost model for gaps in a fuzzy embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapPenalty {
    /// Gap cost grows with index distance.
    #[default]
    Linear,
    /// Gap cost grows with log2 of the index distance.
    Log,
}

impl FromStr for GapPenalty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s {
            "linear" => Ok(GapPenalty::Linear),
            "log" => Ok(GapPenalty::Log),
            other => Err(ConfigError::UnknownGapPenalty(other.to_string())),
        }
    }
}

/// Word-delimiter set used for boundary scoring when nothing else is
/// configured.
pub const DEFAULT_WORD_DELIMS: &str = ":;,./-_ \t";

/// Everything the core needs to run one search pass.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// The raw query string (fuzzy part plus optional boolean part).
    pub query: String,
    /// Match case-insensitively.
    pub ignore_case: bool,
    /// Derive `ignore_case` from the query: insensitive unless it contains
    /// an uppercase character.
    pub smart_case: bool,
    /// Force each fuzzy term to match after the previous term's match.
    pub preserve_order: bool,
    /// Spread line evaluation across one worker per logical CPU.
    pub parallel: bool,
    /// Number of results to keep.
    pub top_k: usize,
    /// Lines handed to each worker per fill round.
    pub batch_size: usize,
    /// Largest hop between consecutive embedding positions the scorer will
    /// explore (see the reachability gate in the DFS).
    pub max_symbol_gap: usize,
    /// Input files, searched in order. Empty means stdin.
    pub files: Vec<PathBuf>,
    /// Bytes treated as word boundaries by the scorer.
    pub word_delims: String,
    /// Gap cost model.
    pub gap_penalty: GapPenalty,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: String::new(),
            ignore_case: false,
            smart_case: false,
            preserve_order: false,
            parallel: false,
            top_k: 100,
            batch_size: 10_000,
            max_symbol_gap: 10,
            files: Vec::new(),
            word_delims: DEFAULT_WORD_DELIMS.to_string(),
            gap_penalty: GapPenalty::Linear,
        }
    }
}

impl SearchConfig {
    /// Apply the smart-case rule: when `smart_case` is set, the pass is
    /// case-insensitive iff the query contains no uppercase character.
    ///
    /// Runs once, before parsing, so the resolved `ignore_case` is what the
    /// parser and scanners see.
    pub fn resolve_smart_case(&mut self) {
        if !self.smart_case {
            return;
        }
        let has_upper = self.query.bytes().any(|b| b.is_ascii_uppercase());
        self.ignore_case = !has_upper;
    }

    /// Reject non-positive numeric knobs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::NonPositive("top_k"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::NonPositive("batch_size"));
        }
        if self.max_symbol_gap == 0 {
            return Err(ConfigError::NonPositive("max_symbol_gap"));
        }
        Ok(())
    }
}

/// Optional JSON defaults file. Every field is optional; present fields
/// override the built-in defaults and are in turn overridden by CLI flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub ignore_case: Option<bool>,
    pub smart_case: Option<bool>,
    pub preserve_order: Option<bool>,
    pub parallel: Option<bool>,
    pub top_k: Option<usize>,
    pub batch_size: Option<usize>,
    pub max_symbol_gap: Option<usize>,
    pub word_delims: Option<String>,
    pub gap_penalty: Option<GapPenalty>,
}

impl ConfigFile {
    /// Read and parse a defaults file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Fold the file's settings into `cfg`.
    pub fn apply(&self, cfg: &mut SearchConfig) {
        if let Some(v) = self.ignore_case {
            cfg.ignore_case = v;
        }
        if let Some(v) = self.smart_case {
            cfg.smart_case = v;
        }
        if let Some(v) = self.preserve_order {
            cfg.preserve_order = v;
        }
        if let Some(v) = self.parallel {
            cfg.parallel = v;
        }
        if let Some(v) = self.top_k {
            cfg.top_k = v;
        }
        if let Some(v) = self.batch_size {
            cfg.batch_size = v;
        }
        if let Some(v) = self.max_symbol_gap {
            cfg.max_symbol_gap = v;
        }
        if let Some(ref v) = self.word_delims {
            cfg.word_delims = v.clone();
        }
        if let Some(v) = self.gap_penalty {
            cfg.gap_penalty = v;
        }
    }
}
