//! Text-to-value coercion for the update command.

use super::CoercionError;
use crate::models::{catalog_type, FieldType, Value};

/// Coerces raw update text into a typed value.
///
/// Cataloged integer, float and string fields are converted straight to their
/// type and a failure is an error. Any other field is typed speculatively:
/// float when the text has a decimal point and parses, then integer, then the
/// raw string.
pub fn coerce(field: &str, raw: &str) -> Result<Value, CoercionError> {
    let fail = |expected| CoercionError {
        field: field.to_string(),
        value: raw.to_string(),
        expected,
    };

    match catalog_type(field) {
        Some(FieldType::Str) => Ok(Value::Str(raw.to_string())),
        Some(FieldType::Int) => raw
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| fail(FieldType::Int)),
        Some(FieldType::Float) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(Value::Float)
            .ok_or_else(|| fail(FieldType::Float)),
        Some(FieldType::StrList) | None => Ok(speculate(raw)),
    }
}

fn speculate(raw: &str) -> Value {
    if raw.contains('.') {
        // Non-finite floats have no JSON form, so they stay text.
        if let Some(x) = raw.parse::<f64>().ok().filter(|x| x.is_finite()) {
            return Value::Float(x);
        }
    }
    match raw.parse::<i64>() {
        Ok(n) => Value::Int(n),
        Err(_) => Value::Str(raw.to_string()),
    }
}
