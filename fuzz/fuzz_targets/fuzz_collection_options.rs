//! Fuzz target for collection config parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sb_collect::CollectionOptions;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(options) = CollectionOptions::from_json(json) {
        let _ = options.to_spec();
    }
});
