#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use scicat_ingest::catalog::CatalogGateway;
use scicat_ingest::model::{DatasetId, DatasetRecord, DatasetType, OrigDatablock};
use scicat_ingest::transfer::FileTransfer;
use scicat_ingest::IngestError;

pub fn write_file(path: &Path, size: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, vec![b'x'; size]).expect("write data file");
}

pub fn raw_record() -> DatasetRecord {
    DatasetRecord::new(
        DatasetType::Raw,
        "slartibartfast",
        "ownerGroup",
        "slartibartfast@magrathea.org",
        "2022-06-14T12:34:56",
    )
    .with_access_groups(["group1"])
}

pub fn comm_error(endpoint: &str) -> IngestError {
    IngestError::CatalogComm {
        endpoint: endpoint.to_string(),
        message: "500 Internal Server Error".to_string(),
    }
}

/// In-memory catalog that records every call and can be told to fail.
#[derive(Default)]
pub struct FakeCatalog {
    pub fail_create_record: bool,
    pub fail_create_manifest: bool,
    pub assigned_pid: Option<String>,
    pub stored_record: Option<DatasetRecord>,
    pub stored_manifests: Vec<OrigDatablock>,
    pub created_records: RefCell<Vec<DatasetRecord>>,
    pub created_manifests: RefCell<Vec<OrigDatablock>>,
}

impl CatalogGateway for FakeCatalog {
    fn create_record(&self, record: &DatasetRecord) -> Result<DatasetId, IngestError> {
        if self.fail_create_record {
            return Err(comm_error("Datasets"));
        }
        self.created_records.borrow_mut().push(record.clone());
        Ok(DatasetId::new(
            self.assigned_pid.as_deref().unwrap_or("PID.SAMPLE.PREFIX/0001"),
        ))
    }

    fn get_record(&self, id: &DatasetId) -> Result<DatasetRecord, IngestError> {
        self.stored_record
            .clone()
            .ok_or_else(|| comm_error(&format!("Datasets/{id}")))
    }

    fn get_manifests(&self, _id: &DatasetId) -> Result<Vec<OrigDatablock>, IngestError> {
        Ok(self.stored_manifests.clone())
    }

    fn create_manifest(&self, manifest: &OrigDatablock) -> Result<(), IngestError> {
        if self.fail_create_manifest {
            return Err(comm_error("OrigDatablocks"));
        }
        self.created_manifests.borrow_mut().push(manifest.clone());
        Ok(())
    }
}

/// Calls seen by [`RecordingTransfer`] agents, shared across agents.
#[derive(Debug, Default)]
pub struct TransferLog {
    pub datasets: Vec<DatasetId>,
    pub puts: Vec<(PathBuf, String)>,
    pub reverts: Vec<(PathBuf, String)>,
}

/// Transfer agent that places nothing and records every call.
pub struct RecordingTransfer {
    base: String,
    log: Rc<RefCell<TransferLog>>,
    fail_on_put: Option<usize>,
}

impl RecordingTransfer {
    pub fn new(base: &str, log: Rc<RefCell<TransferLog>>) -> Self {
        Self {
            base: base.to_string(),
            log,
            fail_on_put: None,
        }
    }

    /// Fails the put with the given zero-based index.
    pub fn failing_on_put(mut self, index: usize) -> Self {
        self.fail_on_put = Some(index);
        self
    }
}

impl FileTransfer for RecordingTransfer {
    fn remote_base_path(&self) -> &str {
        &self.base
    }

    fn put(&mut self, local: &Path, remote: &str) -> Result<(), IngestError> {
        let mut log = self.log.borrow_mut();
        if self.fail_on_put == Some(log.puts.len()) {
            return Err(IngestError::Transfer {
                remote: remote.to_string(),
                message: "connection reset".to_string(),
            });
        }
        log.puts.push((local.to_path_buf(), remote.to_string()));
        Ok(())
    }

    fn revert_put(&mut self, local: &Path, remote: &str) -> Result<(), IngestError> {
        self.log
            .borrow_mut()
            .reverts
            .push((local.to_path_buf(), remote.to_string()));
        Ok(())
    }
}
