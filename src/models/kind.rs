use std::fmt;

use super::Value;

/// The semantic type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Int,
    Float,
    StrList,
}

impl FieldType {
    /// The value an unset field of this type reads as.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Str => Value::Str(String::new()),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::StrList => Value::List(Vec::new()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Int => "integer",
            Self::Float => "float",
            Self::StrList => "list of strings",
        }
    }
}

/// A declared field: name plus semantic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn field(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec { name, ty }
}

const USER_FIELDS: &[FieldSpec] = &[
    field("email", FieldType::Str),
    field("password", FieldType::Str),
    field("first_name", FieldType::Str),
    field("last_name", FieldType::Str),
];

const STATE_FIELDS: &[FieldSpec] = &[field("name", FieldType::Str)];

const CITY_FIELDS: &[FieldSpec] = &[
    field("state_id", FieldType::Str),
    field("name", FieldType::Str),
];

const AMENITY_FIELDS: &[FieldSpec] = &[field("name", FieldType::Str)];

const PLACE_FIELDS: &[FieldSpec] = &[
    field("city_id", FieldType::Str),
    field("user_id", FieldType::Str),
    field("name", FieldType::Str),
    field("description", FieldType::Str),
    field("number_rooms", FieldType::Int),
    field("number_bathrooms", FieldType::Int),
    field("max_guest", FieldType::Int),
    field("price_by_night", FieldType::Int),
    field("latitude", FieldType::Float),
    field("longitude", FieldType::Float),
    field("amenity_ids", FieldType::StrList),
];

const REVIEW_FIELDS: &[FieldSpec] = &[
    field("place_id", FieldType::Str),
    field("user_id", FieldType::Str),
    field("text", FieldType::Str),
];

/// The closed set of record types the shell knows about.
///
/// Kinds are structurally identical apart from their declared field table;
/// every kind accepts arbitrary extra attributes on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    BaseModel,
    User,
    State,
    City,
    Amenity,
    Place,
    Review,
}

impl ModelKind {
    pub const ALL: [ModelKind; 7] = [
        Self::BaseModel,
        Self::User,
        Self::State,
        Self::City,
        Self::Amenity,
        Self::Place,
        Self::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaseModel => "BaseModel",
            Self::User => "User",
            Self::State => "State",
            Self::City => "City",
            Self::Amenity => "Amenity",
            Self::Place => "Place",
            Self::Review => "Review",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::BaseModel => &[],
            Self::User => USER_FIELDS,
            Self::State => STATE_FIELDS,
            Self::City => CITY_FIELDS,
            Self::Amenity => AMENITY_FIELDS,
            Self::Place => PLACE_FIELDS,
            Self::Review => REVIEW_FIELDS,
        }
    }

    /// Declared type of `name` on this kind, if any.
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields()
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.ty)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looks a field name up in the shared catalog: the union of every kind's
/// declared fields. A name has the same type wherever it is declared.
pub fn catalog_type(name: &str) -> Option<FieldType> {
    ModelKind::ALL
        .iter()
        .find_map(|kind| kind.field_type(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(ModelKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(ModelKind::from_str("state"), None);
        assert_eq!(ModelKind::from_str(""), None);
    }

    #[test]
    fn test_catalog_is_consistent_across_kinds() {
        for kind in ModelKind::ALL {
            for spec in kind.fields() {
                assert_eq!(catalog_type(spec.name), Some(spec.ty), "{}", spec.name);
            }
        }
    }

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(catalog_type("number_rooms"), Some(FieldType::Int));
        assert_eq!(catalog_type("latitude"), Some(FieldType::Float));
        assert_eq!(catalog_type("email"), Some(FieldType::Str));
        assert_eq!(catalog_type("nickname"), None);
    }
}
