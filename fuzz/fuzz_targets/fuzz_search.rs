#![no_main]

use fzl::config::SearchConfig;
use fzl::search::search_lines;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (String, Vec<String>)| {
    // A parseable query must evaluate against arbitrary lines without
    // panicking, and every reported embedding must be in bounds.
    let (query, lines) = data;
    let cfg = SearchConfig {
        query,
        ..SearchConfig::default()
    };
    if let Ok(hits) = search_lines(&cfg, &lines) {
        for hit in hits {
            for &p in &hit.result.positions {
                assert!(p < hit.info.text.len());
            }
        }
    }
});
