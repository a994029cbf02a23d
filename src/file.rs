//! Identity and locations of a single data file.
//!
//! A [`FileRecord`] knows where a file lives relative to the dataset's source
//! folder, where the local copy is (if there is one), and the catalog entry
//! describing it once that has been computed or fetched.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::error::IngestError;
use crate::model::DataFile;

/// Read buffer for checksum computation.
const CHECKSUM_BUFFER_SIZE: usize = 128 * 1024;

/// One file of a dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRecord {
    source_path: String,
    source_folder: Option<String>,
    local_path: Option<PathBuf>,
    metadata: Option<DataFile>,
}

impl FileRecord {
    /// Creates a record for a file on the local filesystem that is not uploaded yet.
    ///
    /// The source path is `relative_to/<file name>`.
    ///
    /// # Errors
    /// Returns [`IngestError::Precondition`] if `path` has no UTF-8 file name.
    pub fn from_local(path: impl AsRef<Path>, relative_to: &str) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                IngestError::Precondition(format!(
                    "'{}' does not end in a UTF-8 file name",
                    path.display()
                ))
            })?;

        Ok(Self {
            source_path: join_remote(relative_to, file_name),
            source_folder: None,
            local_path: Some(path.to_path_buf()),
            metadata: None,
        })
    }

    /// Creates a record for a file that is already registered in the catalog.
    pub fn from_catalog(entry: DataFile, source_folder: impl Into<String>) -> Self {
        Self {
            source_path: entry.path.clone(),
            source_folder: Some(source_folder.into()),
            local_path: None,
            metadata: Some(entry),
        }
    }

    /// Path relative to the source folder.
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn source_folder(&self) -> Option<&str> {
        self.source_folder.as_deref()
    }

    pub fn set_source_folder(&mut self, folder: Option<String>) {
        self.source_folder = folder;
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    /// Catalog entry for this file, `None` until computed or fetched.
    pub fn metadata(&self) -> Option<&DataFile> {
        self.metadata.as_ref()
    }

    /// Full remote path, defined only once the source folder is known.
    pub fn remote_access_path(&self) -> Option<String> {
        self.source_folder
            .as_deref()
            .map(|folder| join_remote(folder, &self.source_path))
    }

    /// Returns a new record whose metadata is read from the local copy.
    ///
    /// The timestamp is the modification time in UTC with second precision:
    /// the catalog tracks the current version of a file, not when it was
    /// first created.
    ///
    /// # Errors
    /// Fails with [`IngestError::Precondition`] when there is no local copy,
    /// or with an IO error if the file cannot be inspected.
    pub fn with_metadata_from_local_file(self) -> Result<Self, IngestError> {
        let local_path = self.require_local_path("compute file metadata")?;
        let stat = std::fs::metadata(local_path).map_err(|source| IngestError::FileIo {
            path: local_path.to_path_buf(),
            source,
        })?;
        let modified = stat.modified().map_err(|source| IngestError::FileIo {
            path: local_path.to_path_buf(),
            source,
        })?;

        let metadata = DataFile::new(self.source_path.clone(), stat.len())
            .with_time(modification_time_str(modified.into()));

        Ok(Self {
            metadata: Some(metadata),
            ..self
        })
    }

    /// Returns a new record whose metadata carries the SHA-256 digest of the local copy.
    ///
    /// Size and time are computed first if the record has no metadata yet.
    ///
    /// # Errors
    /// Fails with [`IngestError::Precondition`] when there is no local copy.
    pub fn with_checksum(self) -> Result<Self, IngestError> {
        let record = if self.metadata.is_some() {
            self
        } else {
            self.with_metadata_from_local_file()?
        };
        let local_path = record.require_local_path("compute a checksum")?;
        let digest = sha256_file(local_path)?;

        let metadata = record.metadata.clone().map(|entry| entry.with_chk(digest));
        Ok(Self { metadata, ..record })
    }

    fn require_local_path(&self, action: &str) -> Result<&Path, IngestError> {
        self.local_path.as_deref().ok_or_else(|| {
            IngestError::Precondition(format!(
                "cannot {action} for '{}': the file has no local copy",
                self.source_path
            ))
        })
    }
}

/// Joins a remote folder and a relative path with `/`.
pub(crate) fn join_remote(folder: &str, path: &str) -> String {
    if folder.is_empty() {
        return path.to_string();
    }
    let trimmed = folder.trim_end_matches('/');
    if trimmed.is_empty() {
        format!("/{path}")
    } else {
        format!("{trimmed}/{path}")
    }
}

fn modification_time_str(modified: DateTime<Utc>) -> String {
    modified.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Lowercase hex SHA-256 of a file, streamed in fixed-size chunks.
pub fn sha256_file(path: &Path) -> Result<String, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::FileIo {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::with_capacity(CHECKSUM_BUFFER_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHECKSUM_BUFFER_SIZE];

    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|source| IngestError::FileIo {
                path: path.to_path_buf(),
                source,
            })?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
