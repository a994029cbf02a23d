//! Catalog service access.
//!
//! The staging and upload logic only talks to the catalog through
//! [`CatalogGateway`]. [`ScicatClient`] is the HTTP implementation against a
//! SciCat backend; tests substitute in-memory gateways.

pub mod client;
pub mod resolve;

pub use client::{ScicatClient, ScicatClientBuilder};

use crate::error::IngestError;
use crate::model::{DatasetId, DatasetRecord, OrigDatablock};

/// Authenticated calls the core needs from the catalog.
///
/// Implementations report transport, authentication and server failures as
/// [`IngestError::CatalogComm`]. No retries are expected from callers.
pub trait CatalogGateway {
    /// Creates a dataset and returns the id the catalog assigned to it.
    fn create_record(&self, record: &DatasetRecord) -> Result<DatasetId, IngestError>;

    fn get_record(&self, id: &DatasetId) -> Result<DatasetRecord, IngestError>;

    /// All datablocks registered for a dataset.
    fn get_manifests(&self, id: &DatasetId) -> Result<Vec<OrigDatablock>, IngestError>;

    fn create_manifest(&self, manifest: &OrigDatablock) -> Result<(), IngestError>;
}
