//! Dictionary-like view over a record's scientific metadata.

use serde_json::{Map, Value};

use crate::error::IngestError;

/// Mutable view over the optional `scientificMetadata` field of a record.
///
/// A missing field reads as an empty mapping. The first insert materializes
/// it. Every mutation lands directly in the record; the view stores nothing
/// of its own.
#[derive(Debug)]
pub struct MetadataMap<'a> {
    field: &'a mut Option<Map<String, Value>>,
}

impl<'a> MetadataMap<'a> {
    pub(crate) fn new(field: &'a mut Option<Map<String, Value>>) -> Self {
        Self { field }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.field.as_ref().and_then(|map| map.get(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts a value, returning the previous one for this key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.field
            .get_or_insert_with(Map::new)
            .insert(key.into(), value)
    }

    /// Inserts a `{value, unit}` entry, the conventional shape of scientific metadata.
    pub fn insert_quantity(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
        unit: impl Into<String>,
    ) -> Option<Value> {
        let mut entry = Map::new();
        entry.insert("value".to_string(), value.into());
        entry.insert("unit".to_string(), Value::String(unit.into()));
        self.insert(key, Value::Object(entry))
    }

    /// Removes a key, keeping the order of the remaining entries.
    ///
    /// # Errors
    /// Returns [`IngestError::MetadataKeyNotFound`] if the key is absent.
    pub fn remove(&mut self, key: &str) -> Result<Value, IngestError> {
        self.field
            .as_mut()
            .and_then(|map| map.shift_remove(key))
            .ok_or_else(|| IngestError::MetadataKeyNotFound(key.to_string()))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.field
            .iter()
            .flat_map(|map| map.iter())
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.field.as_ref().map_or(0, Map::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_field_reads_as_empty_map() {
        let mut field = None;
        let meta = MetadataMap::new(&mut field);
        assert!(meta.is_empty());
        assert_eq!(meta.get("a"), None);
        assert_eq!(meta.keys().count(), 0);
    }

    #[test]
    fn first_insert_materializes_single_entry() {
        let mut field = None;
        MetadataMap::new(&mut field).insert("a", json!({"value": 3, "unit": "m"}));

        let map = field.expect("materialized");
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], json!({"value": 3, "unit": "m"}));
    }

    #[test]
    fn remove_missing_key_is_error() {
        let mut field = None;
        let err = MetadataMap::new(&mut field)
            .remove("nope")
            .expect_err("should fail");
        assert!(matches!(err, IngestError::MetadataKeyNotFound(key) if key == "nope"));
        assert!(field.is_none());
    }

    #[test]
    fn remove_keeps_insertion_order() {
        let mut field = None;
        let mut meta = MetadataMap::new(&mut field);
        meta.insert_quantity("a", 1, "m");
        meta.insert_quantity("b", 2, "s");
        meta.insert_quantity("c", 3, "K");
        meta.remove("a").expect("remove");

        assert_eq!(meta.keys().collect::<Vec<_>>(), vec!["b", "c"]);
    }
}
