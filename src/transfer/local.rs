use std::fs;
use std::path::{Component, Path, PathBuf};

use super::FileTransfer;
use crate::error::IngestError;
use crate::model::DatasetId;

/// Copies files into a directory tree on the local (or a mounted) filesystem.
///
/// Each dataset gets its own directory below the root, named after the
/// dataset id with `/` replaced so the id stays a single path component.
#[derive(Clone, Debug)]
pub struct LocalCopyTransfer {
    base: PathBuf,
    base_str: String,
}

impl LocalCopyTransfer {
    /// Creates an agent for `dataset_id` below `root`, creating `root` if needed.
    pub fn for_dataset(root: &Path, dataset_id: &DatasetId) -> Result<Self, IngestError> {
        fs::create_dir_all(root).map_err(|source| IngestError::FileIo {
            path: root.to_path_buf(),
            source,
        })?;
        let root = root.canonicalize().map_err(|source| IngestError::FileIo {
            path: root.to_path_buf(),
            source,
        })?;
        Self::at(root.join(dataset_dir_name(dataset_id)))
    }

    /// Describes where [`LocalCopyTransfer::for_dataset`] would store a
    /// dataset, without touching the filesystem.
    ///
    /// `root` is canonicalized if it exists and made absolute otherwise.
    pub fn planned(root: &Path, dataset_id: &DatasetId) -> Result<Self, IngestError> {
        let root = match root.canonicalize() {
            Ok(root) => root,
            Err(_) => std::path::absolute(root).map_err(|source| IngestError::FileIo {
                path: root.to_path_buf(),
                source,
            })?,
        };
        Self::at(root.join(dataset_dir_name(dataset_id)))
    }

    fn at(base: PathBuf) -> Result<Self, IngestError> {
        let base_str = base
            .to_str()
            .ok_or_else(|| {
                IngestError::Precondition(format!(
                    "transfer root '{}' is not valid UTF-8",
                    base.display()
                ))
            })?
            .to_string();

        Ok(Self { base, base_str })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl FileTransfer for LocalCopyTransfer {
    fn remote_base_path(&self) -> &str {
        &self.base_str
    }

    fn put(&mut self, local: &Path, remote: &str) -> Result<(), IngestError> {
        let target = Path::new(remote);
        let inside = target.strip_prefix(&self.base).is_ok_and(|relative| {
            relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)))
        });
        if !inside {
            return Err(IngestError::Transfer {
                remote: remote.to_string(),
                message: format!("target is outside of {}", self.base.display()),
            });
        }
        if target.exists() {
            return Err(IngestError::Transfer {
                remote: remote.to_string(),
                message: "refusing to overwrite an existing file".to_string(),
            });
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| transfer_error(remote, &source))?;
        }
        if let Err(source) = fs::copy(local, target) {
            // A failed put is never reverted by the caller.
            let _ = fs::remove_file(target);
            return Err(transfer_error(remote, &source));
        }
        tracing::trace!(local = %local.display(), remote, "copied file");
        Ok(())
    }

    fn revert_put(&mut self, _local: &Path, remote: &str) -> Result<(), IngestError> {
        match fs::remove_file(remote) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(transfer_error(remote, &err)),
        }
    }
}

fn dataset_dir_name(dataset_id: &DatasetId) -> String {
    dataset_id.as_str().replace(['/', '\\'], "_")
}

fn transfer_error(remote: &str, source: &std::io::Error) -> IngestError {
    IngestError::Transfer {
        remote: remote.to_string(),
        message: source.to_string(),
    }
}
