//! Two-phase upload of a staged dataset.
//!
//! Phase one places the files through a [`FileTransfer`] agent and creates
//! the catalog record. If the record cannot be created, every placed file is
//! reverted and the original error is returned. Phase two registers the file
//! manifest. A failure there is reported as
//! [`IngestError::InconsistentUpload`] and deliberately left for manual
//! repair: the record and files exist, they are just not linked.

use std::path::PathBuf;

use crate::catalog::CatalogGateway;
use crate::dataset::{DatasetStage, FinalizeOptions, StageState};
use crate::error::IngestError;
use crate::model::DatasetId;
use crate::transfer::{FileTransfer, TransferFactory};

/// Uploads the files of `stage` and registers it in the catalog.
///
/// Drafts are finalized first, with the transfer agent's base path as the
/// storage location. Finalized stages are moved to the agent's base path.
///
/// # Errors
/// - [`IngestError::Precondition`] if the stage is already in the catalog
/// - the agent's error if a file cannot be placed (earlier files are reverted)
/// - the gateway's error if the record cannot be created (all files are reverted)
/// - [`IngestError::InconsistentUpload`] if the manifest cannot be registered
pub fn upload_new_dataset<G, F>(
    stage: DatasetStage,
    gateway: &G,
    factory: &F,
) -> Result<DatasetStage, IngestError>
where
    G: CatalogGateway + ?Sized,
    F: TransferFactory + ?Sized,
{
    let (mut dset, mut agent) = match stage.state() {
        StageState::Uploaded => {
            return Err(IngestError::Precondition(format!(
                "dataset {} is already registered in the catalog",
                stage
                    .record()
                    .pid
                    .as_ref()
                    .map(DatasetId::to_string)
                    .unwrap_or_default()
            )));
        }
        StageState::Draft => {
            let id = DatasetId::generate();
            let agent = factory.for_dataset(&id)?;
            let options = FinalizeOptions::new().target_folder(agent.remote_base_path());
            let dset = stage.finalize_as(id, &options)?;
            (dset, agent)
        }
        StageState::Finalized => {
            let id = stage.record().pid.clone().ok_or_else(|| {
                IngestError::Precondition("finalized dataset has no id".to_string())
            })?;
            let agent = factory.for_dataset(&id)?;
            let mut dset = stage;
            dset.relocate(agent.remote_base_path());
            (dset, agent)
        }
    };

    let local_id = dset.record().pid.clone();
    tracing::info!(
        dataset = ?local_id,
        files = dset.files().len(),
        remote = agent.remote_base_path(),
        "uploading files"
    );

    let placed = place_files(&dset, &mut agent)?;

    let dataset_id = match gateway.create_record(dset.record()) {
        Ok(id) => id,
        Err(err) => {
            tracing::warn!(
                dataset = ?local_id,
                error = %err,
                files = placed.len(),
                "dataset creation failed, reverting uploaded files"
            );
            revert_files(&mut agent, &placed);
            return Err(err);
        }
    };
    tracing::info!(dataset = %dataset_id, "created dataset");

    dset.set_catalog_id(&dataset_id);
    if let Some(manifest) = dset.manifest() {
        if let Err(err) = gateway.create_manifest(manifest) {
            tracing::error!(
                dataset = %dataset_id,
                error = %err,
                "dataset and files were uploaded but the datablock could not be registered"
            );
            return Err(IngestError::InconsistentUpload {
                dataset_id: dataset_id.to_string(),
                source: Box::new(err),
            });
        }
    }

    dset.mark_uploaded();
    Ok(dset)
}

/// Places every file that has a local copy, in order.
///
/// On failure the files placed so far are reverted and the agent's error is
/// returned.
fn place_files<T>(
    dset: &DatasetStage,
    agent: &mut T,
) -> Result<Vec<(PathBuf, String)>, IngestError>
where
    T: FileTransfer + ?Sized,
{
    let mut placed = Vec::with_capacity(dset.files().len());

    for file in dset.files() {
        let Some(local) = file.local_path() else {
            tracing::debug!(path = file.source_path(), "no local copy, skipping");
            continue;
        };
        let Some(remote) = file.remote_access_path() else {
            revert_files(agent, &placed);
            return Err(IngestError::Precondition(format!(
                "file '{}' has no remote location",
                file.source_path()
            )));
        };

        tracing::debug!(local = %local.display(), remote = %remote, "placing file");
        if let Err(err) = agent.put(local, &remote) {
            tracing::warn!(remote = %remote, error = %err, "file transfer failed, reverting");
            revert_files(agent, &placed);
            return Err(err);
        }
        placed.push((local.to_path_buf(), remote));
    }

    Ok(placed)
}

/// Reverts each placed file once. Failures are logged, never raised, so the
/// caller's original error is what surfaces.
fn revert_files<T>(agent: &mut T, placed: &[(PathBuf, String)])
where
    T: FileTransfer + ?Sized,
{
    for (local, remote) in placed {
        if let Err(err) = agent.revert_put(local, remote) {
            tracing::error!(remote = %remote, error = %err, "failed to revert uploaded file");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::model::{DatasetRecord, DatasetType, OrigDatablock};
    use crate::transfer::LocalCopyTransfer;

    #[derive(Default)]
    struct MemoryCatalog {
        records: RefCell<Vec<DatasetRecord>>,
        manifests: RefCell<Vec<OrigDatablock>>,
    }

    impl CatalogGateway for MemoryCatalog {
        fn create_record(&self, record: &DatasetRecord) -> Result<DatasetId, IngestError> {
            self.records.borrow_mut().push(record.clone());
            Ok(DatasetId::new("catalog/0001"))
        }

        fn get_record(&self, _id: &DatasetId) -> Result<DatasetRecord, IngestError> {
            unimplemented!("not used by uploads")
        }

        fn get_manifests(&self, _id: &DatasetId) -> Result<Vec<OrigDatablock>, IngestError> {
            unimplemented!("not used by uploads")
        }

        fn create_manifest(&self, manifest: &OrigDatablock) -> Result<(), IngestError> {
            self.manifests.borrow_mut().push(manifest.clone());
            Ok(())
        }
    }

    fn record() -> DatasetRecord {
        DatasetRecord::new(
            DatasetType::Raw,
            "slartibartfast",
            "ownerGroup",
            "slartibartfast@magrathea.org",
            "2022-06-14T12:34:56",
        )
    }

    #[test]
    fn draft_is_stored_below_agent_base() {
        let src = tempfile::tempdir().expect("src dir");
        let dst = tempfile::tempdir().expect("dst dir");
        let file = src.path().join("events.nxs");
        std::fs::write(&file, vec![0u8; 9876]).expect("write");

        let mut stage = DatasetStage::new(record());
        stage.add_local_files([&file], "raw").expect("add");

        let catalog = MemoryCatalog::default();
        let root = dst.path().to_path_buf();
        let factory = |id: &DatasetId| LocalCopyTransfer::for_dataset(&root, id);
        let uploaded = upload_new_dataset(stage, &catalog, &factory).expect("upload");

        assert_eq!(uploaded.state(), StageState::Uploaded);
        assert_eq!(uploaded.record().pid, Some(DatasetId::new("catalog/0001")));
        let manifest = uploaded.manifest().expect("manifest");
        assert_eq!(manifest.dataset_id, DatasetId::new("catalog/0001"));
        assert_eq!(catalog.manifests.borrow().len(), 1);

        let sent = &catalog.records.borrow()[0];
        assert_eq!(sent.size(), Some(9876));
        let copied = std::path::Path::new(&sent.source_folder).join("raw/events.nxs");
        assert_eq!(std::fs::metadata(copied).expect("copied file").len(), 9876);
    }

    #[test]
    fn uploaded_stage_cannot_be_uploaded_again() {
        let dst = tempfile::tempdir().expect("dst dir");
        let catalog = MemoryCatalog::default();
        let root = dst.path().to_path_buf();
        let factory = |id: &DatasetId| LocalCopyTransfer::for_dataset(&root, id);

        let uploaded =
            upload_new_dataset(DatasetStage::new(record()), &catalog, &factory).expect("upload");
        let err = upload_new_dataset(uploaded, &catalog, &factory).expect_err("second upload");
        assert!(matches!(err, IngestError::Precondition(_)));
        assert_eq!(catalog.records.borrow().len(), 1);
    }
}
