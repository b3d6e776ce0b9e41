use std::fmt;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;
use uuid::Uuid;

use super::{format_timestamp, now_timestamp, parse_timestamp, ModelKind, Value};

/// Key carrying the concrete kind in the dictionary-of-fields form.
pub const CLASS_KEY: &str = "__class__";

/// Attribute names owned by the record itself rather than its attribute map.
pub const RESERVED_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Errors reconstructing a record from its dictionary-of-fields form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("field {field} is not valid: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// One live instance of a [`ModelKind`].
///
/// `id` and `created_at` are fixed at construction. `updated_at` only moves
/// through [`Record::touch`]. Everything else lives in an ordered attribute
/// map that accepts any field name.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: ModelKind,
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    attributes: IndexMap<String, Value>,
}

impl Record {
    /// Creates a fresh record with a random id and both timestamps set to now.
    pub fn new(kind: ModelKind) -> Self {
        let now = now_timestamp();
        Self {
            kind,
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            attributes: IndexMap::new(),
        }
    }

    /// Rebuilds a record from its dictionary-of-fields form.
    ///
    /// The `__class__` tag is skipped, the two timestamps are parsed from ISO
    /// text and every other key becomes an attribute as-is.
    pub fn from_dict(
        kind: ModelKind,
        dict: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, RecordError> {
        let id = match dict.get("id") {
            Some(serde_json::Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(RecordError::InvalidField {
                    field: "id",
                    value: other.to_string(),
                })
            }
            None => return Err(RecordError::MissingField("id")),
        };
        let created_at = timestamp_field(dict, "created_at")?;
        let updated_at = timestamp_field(dict, "updated_at")?;

        let attributes = dict
            .iter()
            .filter(|(key, _)| key.as_str() != CLASS_KEY && !RESERVED_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), Value::from_json(value.clone())))
            .collect();

        Ok(Self {
            kind,
            id,
            created_at,
            updated_at,
            attributes,
        })
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    /// Registry key: `"{kind}.{id}"`.
    pub fn key(&self) -> String {
        storage_key(self.kind, &self.id)
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// Reads an attribute, falling back to the declared default of the kind.
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Str(self.id.clone())),
            "created_at" => Some(Value::Timestamp(self.created_at)),
            "updated_at" => Some(Value::Timestamp(self.updated_at)),
            _ => self
                .attributes
                .get(name)
                .cloned()
                .or_else(|| self.kind.field_type(name).map(|ty| ty.default_value())),
        }
    }

    /// Sets an attribute without touching `updated_at`.
    ///
    /// Returns `false` and leaves the record unchanged for the reserved
    /// `id`/`created_at`/`updated_at` names.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        if RESERVED_FIELDS.contains(&name.as_str()) {
            return false;
        }
        self.attributes.insert(name, value);
        true
    }

    /// Refreshes `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = now_timestamp();
    }

    /// Ordered `(name, value)` view over every field, reserved ones first.
    pub fn fields(&self) -> impl Iterator<Item = (&str, Value)> + '_ {
        [
            ("id", Value::Str(self.id.clone())),
            ("created_at", Value::Timestamp(self.created_at)),
            ("updated_at", Value::Timestamp(self.updated_at)),
        ]
        .into_iter()
        .chain(
            self.attributes
                .iter()
                .map(|(name, value)| (name.as_str(), value.clone())),
        )
    }

    /// Dictionary-of-fields form: timestamps as ISO text plus the `__class__` tag.
    pub fn to_dict(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut dict = serde_json::Map::new();
        for (name, value) in self.fields() {
            dict.insert(name.to_string(), value.to_json());
        }
        dict.insert(
            CLASS_KEY.to_string(),
            serde_json::Value::String(self.kind.as_str().to_string()),
        );
        dict
    }
}

pub fn storage_key(kind: ModelKind, id: &str) -> String {
    format!("{}.{}", kind.as_str(), id)
}

fn timestamp_field(
    dict: &serde_json::Map<String, serde_json::Value>,
    field: &'static str,
) -> Result<NaiveDateTime, RecordError> {
    let raw = dict.get(field).ok_or(RecordError::MissingField(field))?;
    raw.as_str()
        .and_then(parse_timestamp)
        .ok_or_else(|| RecordError::InvalidField {
            field,
            value: raw.to_string(),
        })
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len() + 4))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("created_at", &format_timestamp(&self.created_at))?;
        map.serialize_entry("updated_at", &format_timestamp(&self.updated_at))?;
        for (name, value) in &self.attributes {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(CLASS_KEY, self.kind.as_str())?;
        map.end()
    }
}

/// Canonical display form: `[Kind] (id) {'id': '...', ...}`.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ({}) {{", self.kind, self.id)?;
        for (i, (name, value)) in self.fields().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", super::quote(name), value)?;
        }
        f.write_str("}")
    }
}
