use std::path::PathBuf;
use thiserror::Error;

/// The main error type for scicat-ingest operations.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid dataset fields: {0}")]
    InvalidDatasetFields(#[source] serde_json::Error),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Field '{0}' is derived from the file list and cannot be set directly")]
    ReadOnlyField(String),

    #[error(
        "Cannot determine a unique source folder from files, got: {}. \
         Pass an explicit target folder to override.",
        folders.join(", ")
    )]
    AmbiguousLocation { folders: Vec<String> },

    #[error(
        "Cannot determine a source folder because no input files have a source folder set. \
         Pass an explicit target folder to override."
    )]
    UndeterminedLocation,

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid catalog URL '{input}': {message}")]
    InvalidCatalogUrl { input: String, message: String },

    #[error("Catalog request to {endpoint} failed: {message}")]
    CatalogComm { endpoint: String, message: String },

    #[error("Failed to parse catalog response from {endpoint}: {source}")]
    CatalogParse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Transfer of '{remote}' failed: {message}")]
    Transfer { remote: String, message: String },

    #[error("Scientific metadata has no key '{0}'")]
    MetadataKeyNotFound(String),

    #[error(
        "Failed to register the file manifest for dataset {dataset_id}: {source}\n\
         The dataset and data files were uploaded but are not linked with each other. \
         Please fix the dataset manually!"
    )]
    InconsistentUpload {
        dataset_id: String,
        #[source]
        source: Box<IngestError>,
    },

    #[error("Failed to parse dataset fields from {path}: {message}")]
    DatasetFileParse { path: PathBuf, message: String },
}

impl IngestError {
    /// Returns true for failures reported by the catalog gateway.
    pub fn is_catalog_comm(&self) -> bool {
        matches!(self, IngestError::CatalogComm { .. })
    }
}
