//! On-disk layout: one JSON object mapping `"Kind.id"` to the record's
//! dictionary-of-fields form.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use thiserror::Error;

use super::StorageError;
use crate::models::{ModelKind, Record, RecordError, CLASS_KEY};

pub const DEFAULT_FILE_PATH: &str = "file.json";

/// Why a single persisted entry was not loaded.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("entry is not a JSON object")]
    NotAnObject,

    #[error("unknown record type: {0}")]
    UnknownKind(String),

    #[error(transparent)]
    Record(#[from] RecordError),
}

pub(super) fn write_objects(
    path: &Path,
    objects: &IndexMap<String, Record>,
) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, objects)?;
    writer.flush()?;
    Ok(())
}

/// Reads the top-level entries. `Ok(None)` means there is no file.
pub(super) fn read_entries(
    path: &Path,
) -> Result<Option<serde_json::Map<String, serde_json::Value>>, StorageError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_str(&content)? {
        serde_json::Value::Object(entries) => Ok(Some(entries)),
        _ => Err(StorageError::NotAnObject),
    }
}

/// Rebuilds one entry. The `__class__` tag names the kind; the key prefix is
/// used when the tag is absent.
pub(super) fn decode_entry(key: &str, entry: &serde_json::Value) -> Result<Record, EntryError> {
    let dict = entry.as_object().ok_or(EntryError::NotAnObject)?;

    let kind_name = match dict.get(CLASS_KEY).and_then(|v| v.as_str()) {
        Some(name) => name,
        None => key.split_once('.').map(|(prefix, _)| prefix).unwrap_or(key),
    };
    let kind = ModelKind::from_str(kind_name)
        .ok_or_else(|| EntryError::UnknownKind(kind_name.to_string()))?;

    Ok(Record::from_dict(kind, dict)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_uses_class_tag() {
        let entry = json!({
            "id": "1",
            "created_at": "2017-09-28T21:05:54.119427",
            "updated_at": "2017-09-28T21:05:54.119427",
            "__class__": "City",
        });
        let record = decode_entry("City.1", &entry).unwrap();
        assert_eq!(record.kind(), ModelKind::City);
        assert_eq!(record.id(), "1");
    }

    #[test]
    fn test_decode_falls_back_to_key_prefix() {
        let entry = json!({
            "id": "1",
            "created_at": "2017-09-28T21:05:54",
            "updated_at": "2017-09-28T21:05:54",
        });
        let record = decode_entry("Amenity.1", &entry).unwrap();
        assert_eq!(record.kind(), ModelKind::Amenity);
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let entry = json!({
            "id": "1",
            "created_at": "2017-09-28T21:05:54",
            "updated_at": "2017-09-28T21:05:54",
            "__class__": "Spaceship",
        });
        let err = decode_entry("Spaceship.1", &entry).unwrap_err();
        assert!(matches!(err, EntryError::UnknownKind(name) if name == "Spaceship"));
    }

    #[test]
    fn test_decode_rejects_non_objects() {
        assert!(matches!(
            decode_entry("State.1", &json!([1, 2])),
            Err(EntryError::NotAnObject)
        ));
    }
}
