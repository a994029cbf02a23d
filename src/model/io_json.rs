//! JSON and YAML reading for catalog records.
//!
//! The CLI accepts dataset templates as YAML or JSON files, and the HTTP
//! client parses catalog responses with the slice helpers here.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use super::datablock::OrigDatablock;
use super::record::DatasetRecord;
use crate::error::IngestError;

/// Reads a file of dataset fields as a JSON object.
///
/// Files ending in `.json` are parsed as JSON, everything else as YAML (which
/// is a superset of JSON for practical purposes).
///
/// # Errors
/// Returns an error if the file cannot be read, cannot be parsed, or does not
/// contain a mapping at the top level.
pub fn read_dataset_fields(path: &Path) -> Result<Map<String, Value>, IngestError> {
    let text = fs::read_to_string(path).map_err(|source| IngestError::FileIo {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let value: Value = if is_json {
        serde_json::from_str(&text).map_err(|source| IngestError::DatasetFileParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?
    } else {
        serde_yaml::from_str(&text).map_err(|source| IngestError::DatasetFileParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(IngestError::DatasetFileParse {
            path: path.to_path_buf(),
            message: format!("expected a mapping of dataset fields, found {other}"),
        }),
    }
}

/// Parses a dataset record from raw bytes.
pub fn record_from_slice(bytes: &[u8]) -> Result<DatasetRecord, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Parses a list of datablocks from raw bytes.
pub fn datablocks_from_slice(bytes: &[u8]) -> Result<Vec<OrigDatablock>, serde_json::Error> {
    serde_json::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_yaml_template() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("temp file");
        writeln!(file, "owner: slartibartfast\naccessGroups:\n  - group1\n").expect("write");

        let fields = read_dataset_fields(file.path()).expect("read");
        assert_eq!(fields["owner"], "slartibartfast");
        assert_eq!(fields["accessGroups"][0], "group1");
    }

    #[test]
    fn rejects_non_mapping_template() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("temp file");
        write!(file, "[1, 2, 3]").expect("write");

        let err = read_dataset_fields(file.path()).expect_err("should fail");
        assert!(matches!(err, IngestError::DatasetFileParse { .. }));
    }

    #[test]
    fn garbage_bytes_are_errors_not_panics() {
        assert!(record_from_slice(b"\xff\x00{").is_err());
        assert!(datablocks_from_slice(b"{}").is_err());
    }
}
