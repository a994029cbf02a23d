//! Fuzz target for datablock list responses.
//!
//! Any record that parses must serialize again without error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use scicat_ingest::model::io_json::datablocks_from_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(blocks) = datablocks_from_slice(data) {
        serde_json::to_vec(&blocks).expect("parsed datablocks serialize");
    }
});
