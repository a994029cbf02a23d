//! Catalog dataset record.
//!
//! This mirrors the SciCat dataset schema closely enough to create and read
//! back raw and derived datasets. Fields the crate does not model explicitly
//! are kept in [`DatasetRecord::extra`] so that fetched records survive a
//! read-modify-write cycle unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::DatasetId;

/// Wire names of the fields that are derived from the file list.
pub const DERIVED_FIELDS: [&str; 2] = ["size", "numberOfFiles"];

/// Cleared whenever the derived fields are rewritten.
const ARCHIVED_FILES_FIELD: &str = "numberOfFilesArchived";

/// Kind of dataset stored in the catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetType {
    Raw,
    #[default]
    Derived,
}

/// The catalog fields of a dataset.
///
/// `size` and `number_of_files` have no public setters: they always describe
/// the file list and are only rewritten when a stage is finalized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<DatasetId>,

    #[serde(default)]
    pub owner: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orcid_of_owner: Option<String>,

    #[serde(default)]
    pub contact_email: String,

    /// Storage location of the files, shared by all of them.
    #[serde(default)]
    pub source_folder: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_folder_host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    number_of_files: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_files_archived: Option<u64>,

    /// ISO 8601 creation time of the dataset.
    #[serde(default)]
    pub creation_time: String,

    #[serde(rename = "type", default)]
    pub dataset_type: DatasetType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,

    #[serde(default)]
    pub owner_group: String,

    #[serde(default)]
    pub access_groups: Vec<String>,

    /// Free-form nested metadata, usually `name -> {value, unit}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_metadata: Option<Map<String, Value>>,

    // Derived datasets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investigator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_datasets: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_software: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_parameters: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_log_data: Option<String>,

    // Raw datasets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_investigator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    /// Any other fields the catalog sends back.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DatasetRecord {
    /// Creates a record of the given type with the fields the catalog requires.
    pub fn new(
        dataset_type: DatasetType,
        owner: impl Into<String>,
        owner_group: impl Into<String>,
        contact_email: impl Into<String>,
        creation_time: impl Into<String>,
    ) -> Self {
        Self {
            dataset_type,
            owner: owner.into(),
            owner_group: owner_group.into(),
            contact_email: contact_email.into(),
            creation_time: creation_time.into(),
            ..Default::default()
        }
    }

    /// Total size of all files in bytes, if known.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Number of files in the dataset, if known.
    pub fn number_of_files(&self) -> Option<u64> {
        self.number_of_files
    }

    /// Builds the next version of this record with new derived fields.
    pub(crate) fn with_file_totals(mut self, size: u64, number_of_files: u64) -> Self {
        self.clear_file_totals();
        self.size = Some(size);
        self.number_of_files = Some(number_of_files);
        self
    }

    /// Forgets the derived fields, including copies smuggled into `extra`.
    pub(crate) fn clear_file_totals(&mut self) {
        self.size = None;
        self.number_of_files = None;
        self.number_of_files_archived = None;
        for field in DERIVED_FIELDS.iter().chain([&ARCHIVED_FILES_FIELD]) {
            self.extra.shift_remove(*field);
        }
    }

    /// Adds access groups to this record.
    pub fn with_access_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access_groups.extend(groups.into_iter().map(Into::into));
        self
    }
}
