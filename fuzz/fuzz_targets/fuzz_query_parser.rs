#![no_main]

use fzl::config::SearchConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Fuzz the query parser with arbitrary strings
    // This should not panic or cause undefined behavior
    let cfg = SearchConfig {
        query: data.to_string(),
        ..SearchConfig::default()
    };
    let _ = fzl::query::parse(&cfg);
});
