//! Field values and schema-declared coercion

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::core::schema::FieldKind;

/// A single cell of a record
///
/// Equality is by value: an integral `Real` equals the matching `Integer`,
/// and `Null` equals `Null` so de-duplication treats missing values as one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// Canonical form used for equality and hashing
#[derive(PartialEq, Eq, Hash)]
enum Key<'a> {
    Null,
    Int(i64),
    Float(u64),
    Text(&'a str),
}

impl FieldValue {
    fn key(&self) -> Key<'_> {
        match self {
            FieldValue::Null => Key::Null,
            FieldValue::Integer(i) => Key::Int(*i),
            FieldValue::Real(f) => match integral(*f) {
                Some(i) => Key::Int(i),
                None if f.is_nan() => Key::Float(f64::NAN.to_bits()),
                None => Key::Float(f.to_bits()),
            },
            FieldValue::Text(s) => Key::Text(s),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Numeric reading of the value; `None` for null and text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Real(f) if f.is_nan() => None,
            FieldValue::Real(f) => Some(*f),
            FieldValue::Null | FieldValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short description used in coercion errors
    pub fn describe(&self) -> String {
        match self {
            FieldValue::Null => "null".to_string(),
            FieldValue::Integer(i) => format!("integer {}", i),
            FieldValue::Real(f) => format!("real {}", f),
            FieldValue::Text(s) => format!("text {:?}", s),
        }
    }

    /// Coerce a raw stored value to a declared kind
    ///
    /// Returns `None` when the value cannot represent that kind.
    pub fn coerce(self, kind: FieldKind) -> Option<FieldValue> {
        match (kind, self) {
            (_, FieldValue::Null) => Some(FieldValue::Null),

            (FieldKind::Text, FieldValue::Text(s)) => Some(FieldValue::Text(s)),
            (FieldKind::Text, FieldValue::Integer(i)) => Some(FieldValue::Text(i.to_string())),
            (FieldKind::Text, FieldValue::Real(f)) => Some(FieldValue::Text(f.to_string())),

            (FieldKind::Integer, FieldValue::Integer(i)) => Some(FieldValue::Integer(i)),
            (FieldKind::Integer, FieldValue::Real(f)) => integral(f).map(FieldValue::Integer),
            (FieldKind::Integer, FieldValue::Text(s)) => parse_integer(&s).map(FieldValue::Integer),

            (FieldKind::Real, FieldValue::Real(f)) => Some(FieldValue::Real(f)),
            (FieldKind::Real, FieldValue::Integer(i)) => Some(FieldValue::Real(i as f64)),
            (FieldKind::Real, FieldValue::Text(s)) => parse_real(&s).map(FieldValue::Real),
        }
    }

    /// Parse a user-typed literal as a value of the given kind
    pub fn parse_as(literal: &str, kind: FieldKind) -> Option<FieldValue> {
        match kind {
            FieldKind::Text => Some(FieldValue::Text(literal.to_string())),
            FieldKind::Integer => parse_integer(literal).map(FieldValue::Integer),
            FieldKind::Real => parse_real(literal).map(FieldValue::Real),
        }
    }
}

fn integral(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; anything at or above it overflows i64
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < 9_223_372_036_854_775_808.0 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(integral))
}

fn parse_real(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| !f.is_nan())
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Real(v) => write!(f, "{}", v),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Real(f)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}
