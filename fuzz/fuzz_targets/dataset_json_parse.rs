//! Fuzz target for catalog dataset responses.
//!
//! Feeds arbitrary bytes to the dataset record parser, checking for panics,
//! crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use scicat_ingest::model::io_json::record_from_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = record_from_slice(data);
});
