//! Mutable staging area for a dataset before upload or after fetch.
//!
//! A [`DatasetStage`] owns the catalog record, the ordered list of files and
//! the file manifest. Callers build up a draft, then either upload it
//! directly or finalize it first to inspect the record that would be sent.
//!
//! ```no_run
//! use scicat_ingest::dataset::DatasetStage;
//! use scicat_ingest::model::{DatasetRecord, DatasetType};
//!
//! # fn example() -> Result<(), scicat_ingest::IngestError> {
//! let record = DatasetRecord::new(
//!     DatasetType::Derived,
//!     "slartibartfast",
//!     "ownerGroup",
//!     "slartibartfast@magrathea.org",
//!     "2022-06-14T12:34:56",
//! );
//! let mut stage = DatasetStage::new(record);
//! stage.add_local_files(["data/events.nxs", "data/run.log"], "")?;
//! stage.meta().insert_quantity("temperature", 4.2, "K");
//!
//! let finalized = stage.finalize_for_upload(Some("/remote/upload"))?;
//! assert_eq!(finalized.record().number_of_files(), Some(2));
//! # Ok(())
//! # }
//! ```

mod location;
mod meta;

pub use meta::MetadataMap;

use std::path::{Component, Path};

use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::catalog::CatalogGateway;
use crate::error::IngestError;
use crate::file::{join_remote, FileRecord};
use crate::model::{
    DatasetId, DatasetRecord, DatasetType, OrigDatablock, CHECKSUM_ALGORITHM, DERIVED_FIELDS,
};
use crate::transfer::TransferFactory;

/// Storage location used until the real one is known at finalize/upload time.
pub const PLACEHOLDER_SOURCE_FOLDER: &str = "<PLACEHOLDER>";

/// Where a stage is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageState {
    /// Mutable, no manifest yet.
    Draft,
    /// Size and id fixed, manifest built, not in the catalog yet.
    Finalized,
    /// Registered in the catalog, either by upload or because it was fetched.
    Uploaded,
}

/// Settings for [`DatasetStage::finalize_with`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FinalizeOptions {
    /// Storage location for every file. Resolved from the files when unset.
    pub target_folder: Option<String>,
    /// Compute SHA-256 checksums for local files that do not have one yet.
    pub compute_checksums: bool,
}

impl FinalizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_folder(mut self, folder: impl Into<String>) -> Self {
        self.target_folder = Some(folder.into());
        self
    }

    pub fn compute_checksums(mut self, enabled: bool) -> Self {
        self.compute_checksums = enabled;
        self
    }
}

/// A dataset under construction: record, files and manifest.
#[derive(Clone, Debug)]
pub struct DatasetStage {
    record: DatasetRecord,
    files: Vec<FileRecord>,
    manifest: Option<OrigDatablock>,
    state: StageState,
}

impl DatasetStage {
    /// Starts a draft from a record.
    ///
    /// Derived fields carried by `record` are dropped; finalize recomputes them.
    pub fn new(mut record: DatasetRecord) -> Self {
        record.clear_file_totals();
        if record.source_folder.is_empty() {
            record.source_folder = PLACEHOLDER_SOURCE_FOLDER.to_string();
        }
        Self {
            record,
            files: Vec::new(),
            manifest: None,
            state: StageState::Draft,
        }
    }

    /// Starts a draft from an optional base record plus field overrides.
    ///
    /// Overrides use the catalog's field names (`owner`, `accessGroups`, ...)
    /// and win over the base.
    ///
    /// # Errors
    /// Returns [`IngestError::ReadOnlyField`] if an override names a field
    /// derived from the files, or [`IngestError::InvalidDatasetFields`] if
    /// the merged fields do not form a valid record.
    pub fn from_fields(
        base: Option<&DatasetRecord>,
        overrides: Map<String, Value>,
    ) -> Result<Self, IngestError> {
        if let Some(field) = DERIVED_FIELDS
            .iter()
            .find(|field| overrides.contains_key(**field))
        {
            return Err(IngestError::ReadOnlyField((*field).to_string()));
        }

        let mut fields = match base {
            Some(record) => match serde_json::to_value(record)? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            None => Map::new(),
        };
        fields.extend(overrides);

        let record: DatasetRecord =
            serde_json::from_value(Value::Object(fields)).map_err(IngestError::InvalidDatasetFields)?;
        Ok(Self::new(record))
    }

    /// Reconstructs a stage from the catalog.
    ///
    /// # Errors
    /// Returns [`IngestError::Unsupported`] unless the dataset has exactly one
    /// datablock, and propagates gateway failures.
    pub fn fetch<G>(gateway: &G, id: &DatasetId) -> Result<Self, IngestError>
    where
        G: CatalogGateway + ?Sized,
    {
        let record = gateway.get_record(id)?;
        let mut manifests = gateway.get_manifests(id)?;
        if manifests.len() != 1 {
            return Err(IngestError::Unsupported(format!(
                "got {} original datablocks for dataset {id} but only support for one is implemented",
                manifests.len()
            )));
        }
        let manifest = manifests.remove(0);

        let files = manifest
            .data_file_list
            .iter()
            .cloned()
            .map(|entry| FileRecord::from_catalog(entry, record.source_folder.clone()))
            .collect();

        tracing::debug!(dataset = %id, files = manifest.data_file_list.len(), "fetched dataset");

        Ok(Self {
            record,
            files,
            manifest: Some(manifest),
            state: StageState::Uploaded,
        })
    }

    pub fn record(&self) -> &DatasetRecord {
        &self.record
    }

    /// Mutable access to the catalog fields; derived fields stay read-only.
    pub fn record_mut(&mut self) -> &mut DatasetRecord {
        &mut self.record
    }

    /// Dictionary-like access to the scientific metadata.
    pub fn meta(&mut self) -> MetadataMap<'_> {
        MetadataMap::new(&mut self.record.scientific_metadata)
    }

    pub fn dataset_type(&self) -> DatasetType {
        self.record.dataset_type
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn manifest(&self) -> Option<&OrigDatablock> {
        self.manifest.as_ref()
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    /// Appends files in order. No deduplication is performed.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = FileRecord>) {
        self.files.extend(files);
    }

    /// Appends local files, each stored under `relative_to/<file name>`.
    pub fn add_local_files<I, P>(&mut self, paths: I, relative_to: &str) -> Result<(), IngestError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let files = paths
            .into_iter()
            .map(|path| FileRecord::from_local(path, relative_to))
            .collect::<Result<Vec<_>, _>>()?;
        self.add_files(files);
        Ok(())
    }

    /// Appends every regular file below `dir`, keeping sub-directories in the
    /// source path. Files are visited in file-name order.
    ///
    /// Returns the number of files added.
    pub fn add_local_dir(
        &mut self,
        dir: impl AsRef<Path>,
        relative_to: &str,
    ) -> Result<usize, IngestError> {
        let dir = dir.as_ref();
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|err| IngestError::Io(err.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let sub_dir = entry
                .path()
                .parent()
                .and_then(|parent| parent.strip_prefix(dir).ok())
                .map(remote_components)
                .transpose()?
                .unwrap_or_default();
            let prefix = if sub_dir.is_empty() {
                relative_to.to_string()
            } else {
                join_remote(relative_to, &sub_dir)
            };

            files.push(FileRecord::from_local(entry.path(), &prefix)?);
        }

        let added = files.len();
        self.add_files(files);
        Ok(added)
    }

    /// Computes SHA-256 checksums for every file with a local copy.
    pub fn compute_checksums(&mut self) -> Result<(), IngestError> {
        let files = std::mem::take(&mut self.files);
        self.files = files
            .into_iter()
            .map(|file| {
                if file.local_path().is_some() {
                    file.with_checksum()
                } else {
                    Ok(file)
                }
            })
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    /// Builds the record and manifest that an upload would register.
    ///
    /// Missing file metadata is computed from the local copies. The storage
    /// location is `target_folder` if given, otherwise the one source folder
    /// shared by the files. A fresh id is assigned.
    ///
    /// # Errors
    /// - [`IngestError::Precondition`] if a file has neither a local copy nor metadata
    /// - [`IngestError::AmbiguousLocation`] / [`IngestError::UndeterminedLocation`]
    ///   if no single storage location can be resolved
    pub fn finalize_for_upload(&self, target_folder: Option<&str>) -> Result<Self, IngestError> {
        let options = FinalizeOptions {
            target_folder: target_folder.map(str::to_string),
            ..FinalizeOptions::default()
        };
        self.finalize_with(&options)
    }

    /// Like [`DatasetStage::finalize_for_upload`], optionally computing
    /// checksums for local files on the way.
    ///
    /// # Errors
    /// As [`DatasetStage::finalize_for_upload`]; also fails with
    /// [`IngestError::Precondition`] if the total size does not fit in `u64`.
    pub fn finalize_with(&self, options: &FinalizeOptions) -> Result<Self, IngestError> {
        self.finalize_as(DatasetId::generate(), options)
    }

    pub(crate) fn finalize_as(
        &self,
        id: DatasetId,
        options: &FinalizeOptions,
    ) -> Result<Self, IngestError> {
        let mut files = self
            .files
            .iter()
            .cloned()
            .map(|file| {
                let file = if file.metadata().is_some() {
                    file
                } else if file.local_path().is_some() {
                    file.with_metadata_from_local_file()?
                } else {
                    return Err(IngestError::Precondition(format!(
                        "file '{}' has neither a local copy nor catalog metadata",
                        file.source_path()
                    )));
                };

                let needs_checksum = file.metadata().is_some_and(|entry| entry.chk.is_none());
                if options.compute_checksums && needs_checksum && file.local_path().is_some() {
                    file.with_checksum()
                } else {
                    Ok(file)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let data_file_list: Vec<_> = files
            .iter()
            .filter_map(|file| file.metadata().cloned())
            .collect();
        let total_size = data_file_list
            .iter()
            .try_fold(0u64, |total, entry| total.checked_add(entry.size))
            .ok_or_else(|| {
                IngestError::Precondition("total size of the files overflows u64".to_string())
            })?;
        let source_folder =
            location::resolve_source_folder(&mut files, options.target_folder.as_deref())?;

        let chk_alg = data_file_list
            .iter()
            .any(|entry| entry.chk.is_some())
            .then(|| CHECKSUM_ALGORITHM.to_string());

        let manifest = OrigDatablock {
            id: None,
            size: total_size,
            dataset_id: id.clone(),
            owner_group: self.record.owner_group.clone(),
            access_groups: self.record.access_groups.clone(),
            chk_alg,
            data_file_list,
        };

        let mut record = self
            .record
            .clone()
            .with_file_totals(total_size, files.len() as u64);
        record.pid = Some(id);
        record.source_folder = source_folder;

        tracing::debug!(
            dataset = ?record.pid,
            files = files.len(),
            size = total_size,
            source_folder = %record.source_folder,
            "finalized dataset"
        );

        Ok(Self {
            record,
            files,
            manifest: Some(manifest),
            state: StageState::Finalized,
        })
    }

    /// Uploads files and registers the dataset; see [`crate::upload::upload_new_dataset`].
    pub fn upload<G, F>(self, gateway: &G, factory: &F) -> Result<Self, IngestError>
    where
        G: CatalogGateway + ?Sized,
        F: TransferFactory + ?Sized,
    {
        crate::upload::upload_new_dataset(self, gateway, factory)
    }

    /// Points the record and every file at a new storage location.
    pub(crate) fn relocate(&mut self, source_folder: &str) {
        self.record.source_folder = source_folder.to_string();
        for file in &mut self.files {
            file.set_source_folder(Some(source_folder.to_string()));
        }
    }

    /// Records the id the catalog assigned and marks the stage as uploaded.
    pub(crate) fn set_catalog_id(&mut self, id: &DatasetId) {
        self.record.pid = Some(id.clone());
        if let Some(manifest) = self.manifest.as_mut() {
            manifest.dataset_id = id.clone();
        }
    }

    pub(crate) fn mark_uploaded(&mut self) {
        self.state = StageState::Uploaded;
    }
}

/// Joins path components with `/`, failing on non UTF-8 names.
fn remote_components(path: &Path) -> Result<String, IngestError> {
    let parts = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_str().ok_or_else(|| {
                IngestError::Precondition(format!("'{}' is not valid UTF-8", path.display()))
            })),
            _ => None,
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join("/"))
}
