#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use scicat_ingest::file::FileRecord;
use scicat_ingest::model::DataFile;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Relative file paths with up to two directory levels.
pub fn arb_source_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z][a-z0-9_]{0,7}", 1..=3)
        .prop_map(|parts| format!("{}.dat", parts.join("/")))
}

/// Absolute remote folders from a small pool, so collisions are common.
pub fn arb_folder() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("/remote/a".to_string()),
        Just("/remote/b".to_string()),
        Just("/data/beamline/2024".to_string()),
    ]
}

/// Catalog-backed file records: path, size, folder.
pub fn arb_remote_files(max_files: usize) -> impl Strategy<Value = Vec<(String, u64, String)>> {
    prop::collection::vec(
        (arb_source_path(), 0u64..=1 << 40, arb_folder()),
        0..=max_files,
    )
}

pub fn to_file_records(files: &[(String, u64, String)]) -> Vec<FileRecord> {
    files
        .iter()
        .map(|(path, size, folder)| FileRecord::from_catalog(DataFile::new(path, *size), folder))
        .collect()
}
