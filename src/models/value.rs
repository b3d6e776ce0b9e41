use std::fmt::{self, Write as _};

use chrono::{Datelike, Local, NaiveDateTime, SubsecRound, Timelike};
use serde::{Serialize, Serializer};

/// ISO-8601 layout used for persisted timestamps.
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A tagged attribute value.
///
/// `Other` keeps persisted JSON that fits none of the typed slots (booleans,
/// nulls, nested objects, mixed lists) so it survives a reload/persist cycle
/// verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    List(Vec<String>),
    Timestamp(NaiveDateTime),
    Other(serde_json::Value),
}

impl Value {
    /// JSON form used in the dictionary-of-fields representation.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Float(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::List(items) => serde_json::Value::from(items.clone()),
            Self::Timestamp(ts) => serde_json::Value::String(format_timestamp(ts)),
            Self::Other(v) => v.clone(),
        }
    }

    /// Maps a persisted JSON value onto the narrowest typed slot.
    ///
    /// Timestamps are not detected here; the record decides which keys hold them.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => match n.as_f64() {
                    Some(x) if !n.is_u64() => Self::Float(x),
                    _ => Self::Other(serde_json::Value::Number(n)),
                },
            },
            serde_json::Value::Array(items) if items.iter().all(|v| v.is_string()) => Self::List(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        serde_json::Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            other => Self::Other(other),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Renders the value in the shell's literal style: `'text'`, `42`, `1.5`,
/// `['a', 'b']`, `datetime.datetime(2024, 1, 2, 3, 4, 5, 6)`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(&quote(s)),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(x) => f.write_str(&float_literal(*x)),
            Self::List(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&quote(item))?;
                }
                f.write_char(']')
            }
            Self::Timestamp(ts) => f.write_str(&timestamp_literal(ts)),
            Self::Other(v) => write_json_literal(f, v),
        }
    }
}

/// Quotes a string literal. Single quotes are preferred; double quotes are
/// used when the text contains a single quote and no double quote.
pub fn quote(s: &str) -> String {
    let delim = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

fn float_literal(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        let text = if x > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else {
        // Debug keeps the fractional part on whole numbers (`1.0`).
        let text = format!("{:?}", x);
        match text.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exp),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => text,
        }
    }
}

fn timestamp_literal(ts: &NaiveDateTime) -> String {
    let mut parts = vec![
        ts.year().to_string(),
        ts.month().to_string(),
        ts.day().to_string(),
        ts.hour().to_string(),
        ts.minute().to_string(),
    ];
    let micros = ts.nanosecond() / 1_000;
    if ts.second() != 0 || micros != 0 {
        parts.push(ts.second().to_string());
    }
    if micros != 0 {
        parts.push(micros.to_string());
    }
    format!("datetime.datetime({})", parts.join(", "))
}

fn write_json_literal(f: &mut fmt::Formatter<'_>, v: &serde_json::Value) -> fmt::Result {
    match v {
        serde_json::Value::Null => f.write_str("None"),
        serde_json::Value::Bool(true) => f.write_str("True"),
        serde_json::Value::Bool(false) => f.write_str("False"),
        serde_json::Value::Number(n) => write!(f, "{}", n),
        serde_json::Value::String(s) => f.write_str(&quote(s)),
        serde_json::Value::Array(items) => {
            f.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_json_literal(f, item)?;
            }
            f.write_char(']')
        }
        serde_json::Value::Object(map) => {
            f.write_char('{')?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}: ", quote(key))?;
                write_json_literal(f, item)?;
            }
            f.write_char('}')
        }
    }
}

/// Current local time at microsecond precision, so a timestamp survives its
/// ISO text form unchanged.
pub fn now_timestamp() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(ISO_FORMAT).to_string()
}

/// Parses ISO-8601 text with or without a fractional-seconds part.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    s.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok())
}
