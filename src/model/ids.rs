//! Newtype ID for catalog datasets.
//!
//! SciCat persistent identifiers are opaque strings (often `prefix/uuid`),
//! so the newtype wraps a `String` rather than a number.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Persistent identifier of a dataset in the catalog.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(String);

impl DatasetId {
    /// Creates a new DatasetId from an existing identifier.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier for a dataset that is about to be created.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DatasetId({})", self.0)
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatasetId {
    fn from(id: &str) -> Self {
        DatasetId::new(id)
    }
}

impl From<String> for DatasetId {
    fn from(id: String) -> Self {
        DatasetId::new(id)
    }
}
