//! Fuzz target for support bundle reading.
//!
//! Bundles are uploaded by users, so opening and verifying one must never
//! panic on malformed input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sb_bundle::BundleReader;

fuzz_target!(|data: &[u8]| {
    // Most random input fails at the ZIP header.
    if let Ok(mut reader) = BundleReader::from_bytes(data.to_vec()) {
        let _ = reader.verify_all();
        let _ = reader.contents();
    }
});
