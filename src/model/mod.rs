//! Catalog record types for scicat-ingest.
//!
//! These types are the wire representation of what the catalog stores: the
//! dataset record itself and the datablock (file manifest) that lists its
//! files. Staging and upload logic lives in [`crate::dataset`] and
//! [`crate::upload`]; this module only describes data.
//!
//! # Example
//!
//! ```
//! use scicat_ingest::model::{DataFile, DatasetRecord, DatasetType};
//!
//! let record = DatasetRecord::new(
//!     DatasetType::Derived,
//!     "slartibartfast",
//!     "ownerGroup",
//!     "slartibartfast@magrathea.org",
//!     "2022-06-14T12:34:56",
//! );
//! assert_eq!(record.size(), None);
//!
//! let file = DataFile::new("events.nxs", 9876);
//! assert_eq!(file.size, 9876);
//! ```

mod datablock;
mod ids;
pub mod io_json;
mod record;

pub use datablock::{DataFile, OrigDatablock, CHECKSUM_ALGORITHM};
pub use ids::DatasetId;
pub use record::{DatasetRecord, DatasetType, DERIVED_FIELDS};
