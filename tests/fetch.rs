//! Integration tests for rebuilding a stage from the catalog.

use scicat_ingest::dataset::{DatasetStage, StageState};
use scicat_ingest::model::{DataFile, DatasetId, OrigDatablock};
use scicat_ingest::IngestError;

mod common;
use common::{raw_record, FakeCatalog};

fn datablock(pid: &str, files: &[(&str, u64)]) -> OrigDatablock {
    OrigDatablock {
        id: Some("block-1".to_string()),
        size: files.iter().map(|(_, size)| size).sum(),
        dataset_id: DatasetId::new(pid),
        owner_group: "ownerGroup".to_string(),
        access_groups: vec!["group1".to_string()],
        chk_alg: None,
        data_file_list: files
            .iter()
            .map(|(path, size)| DataFile::new(*path, *size).with_time("2022-06-14T12:34:56+00:00"))
            .collect(),
    }
}

fn catalog_with(manifests: Vec<OrigDatablock>) -> FakeCatalog {
    let mut record = raw_record();
    record.pid = Some(DatasetId::new("PID/42"));
    record.source_folder = "/remote/source".to_string();
    FakeCatalog {
        stored_record: Some(record),
        stored_manifests: manifests,
        ..FakeCatalog::default()
    }
}

#[test]
fn fetch_with_one_datablock_builds_remote_files() {
    let catalog = catalog_with(vec![datablock(
        "PID/42",
        &[("file1.nxs", 100), ("sub/file2.nxs", 50)],
    )]);

    let stage = DatasetStage::fetch(&catalog, &DatasetId::new("PID/42")).expect("fetch");
    assert_eq!(stage.state(), StageState::Uploaded);
    assert_eq!(stage.record().source_folder, "/remote/source");

    let remote: Vec<_> = stage
        .files()
        .iter()
        .map(|file| file.remote_access_path())
        .collect();
    assert_eq!(
        remote,
        vec![
            Some("/remote/source/file1.nxs".to_string()),
            Some("/remote/source/sub/file2.nxs".to_string()),
        ]
    );
    assert!(stage.files().iter().all(|file| file.local_path().is_none()));
    assert_eq!(stage.files()[1].metadata().map(|m| m.size), Some(50));
    assert_eq!(stage.manifest().map(|m| m.size), Some(150));
}

#[test]
fn fetch_with_two_datablocks_is_unsupported() {
    let catalog = catalog_with(vec![
        datablock("PID/42", &[("file1.nxs", 100)]),
        datablock("PID/42", &[("file2.nxs", 100)]),
    ]);

    let err = DatasetStage::fetch(&catalog, &DatasetId::new("PID/42")).expect_err("should fail");
    assert!(matches!(err, IngestError::Unsupported(_)));
}

#[test]
fn fetch_without_datablocks_is_unsupported() {
    let catalog = catalog_with(Vec::new());
    let err = DatasetStage::fetch(&catalog, &DatasetId::new("PID/42")).expect_err("should fail");
    assert!(matches!(err, IngestError::Unsupported(_)));
}

#[test]
fn fetch_propagates_catalog_failures() {
    let catalog = FakeCatalog::default();
    let err = DatasetStage::fetch(&catalog, &DatasetId::new("PID/42")).expect_err("should fail");
    assert!(err.is_catalog_comm());
}

#[test]
fn fetched_stage_can_be_finalized_again() {
    let catalog = catalog_with(vec![datablock(
        "PID/42",
        &[("file1.nxs", 100), ("sub/file2.nxs", 50)],
    )]);
    let stage = DatasetStage::fetch(&catalog, &DatasetId::new("PID/42")).expect("fetch");

    let finalized = stage.finalize_for_upload(None).expect("finalize");
    assert_eq!(finalized.record().source_folder, "/remote/source");
    assert_eq!(finalized.record().size(), Some(150));
    assert_eq!(finalized.record().number_of_files(), Some(2));
}
