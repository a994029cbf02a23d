//! File transfer agents.
//!
//! Uploading places every local file at its remote access path before the
//! catalog learns about the dataset. How files travel is up to the agent;
//! the upload protocol only needs `put` and its compensating `revert_put`.

mod local;

pub use local::LocalCopyTransfer;

use std::path::Path;

use crate::error::IngestError;
use crate::model::DatasetId;

/// Places files at remote locations for one dataset.
pub trait FileTransfer {
    /// Base path under which this agent stores the dataset's files.
    fn remote_base_path(&self) -> &str;

    /// Copies `local` to `remote`.
    fn put(&mut self, local: &Path, remote: &str) -> Result<(), IngestError>;

    /// Undoes a successful [`FileTransfer::put`].
    fn revert_put(&mut self, local: &Path, remote: &str) -> Result<(), IngestError>;
}

/// Creates a transfer agent scoped to a dataset id.
///
/// Any `Fn(&DatasetId) -> Result<T, IngestError>` where `T: FileTransfer` is a
/// factory, so callers can pass closures.
pub trait TransferFactory {
    type Transfer: FileTransfer;

    fn for_dataset(&self, dataset_id: &DatasetId) -> Result<Self::Transfer, IngestError>;
}

impl<F, T> TransferFactory for F
where
    F: Fn(&DatasetId) -> Result<T, IngestError>,
    T: FileTransfer,
{
    type Transfer = T;

    fn for_dataset(&self, dataset_id: &DatasetId) -> Result<T, IngestError> {
        self(dataset_id)
    }
}
