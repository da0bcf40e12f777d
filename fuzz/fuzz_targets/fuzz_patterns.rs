//! Fuzz target for include/exclude pattern compilation and matching.
//!
//! Arbitrary pattern lists must either compile or return an error, and a
//! compiled filter must answer any relative path without panicking.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sb_collect::CollectionSpec;

#[derive(Debug, Arbitrary)]
struct Input {
    include: String,
    exclude: String,
    case_sensitive: bool,
    suffix: Option<String>,
    relative_path: String,
}

fuzz_target!(|input: Input| {
    let Ok(mut spec) = CollectionSpec::new(&input.include, &input.exclude, input.case_sensitive, 10)
    else {
        return;
    };
    if let Some(suffix) = input.suffix {
        spec = spec.with_allowed_suffix(suffix);
    }

    let file_name = input
        .relative_path
        .rsplit('/')
        .next()
        .unwrap_or(&input.relative_path);
    let _ = spec.accepts(file_name, &input.relative_path);
});
