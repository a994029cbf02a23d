//! File-level catalog types: per-file entries and the original datablock
//! that lists them.

use serde::{Deserialize, Serialize};

use super::ids::DatasetId;

/// Checksum algorithm recorded on datablocks whose files carry a `chk`.
pub const CHECKSUM_ALGORITHM: &str = "sha256";

/// One entry of a datablock's file list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFile {
    /// Path relative to the dataset's source folder.
    pub path: String,

    /// Size in bytes.
    pub size: u64,

    /// Last modification time, ISO 8601 in UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    /// Hex digest of the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chk: Option<String>,
}

impl DataFile {
    /// Creates a file entry with the minimum required fields.
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            time: None,
            chk: None,
        }
    }

    /// Sets the modification time.
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Sets the checksum.
    pub fn with_chk(mut self, chk: impl Into<String>) -> Self {
        self.chk = Some(chk.into());
        self
    }
}

/// The file manifest of a dataset ("original datablock" in SciCat).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrigDatablock {
    /// Server-assigned id, absent until the catalog created the datablock.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "_id")]
    pub id: Option<String>,

    /// Sum of all file sizes.
    pub size: u64,

    pub dataset_id: DatasetId,

    pub owner_group: String,

    #[serde(default)]
    pub access_groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chk_alg: Option<String>,

    pub data_file_list: Vec<DataFile>,
}
