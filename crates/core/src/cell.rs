use chrono::NaiveDateTime;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Rendering used for date-time cells in JSON and on screen.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One scalar cell of a ledger export.
///
/// `Missing` is the single representation of an absent value, whether the
/// source cell was empty, the row was short, or the column was never mapped.
/// It encodes as JSON `null`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Missing,
    Bool(bool),
    Int(i64),
    Number(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Non-finite floats have no JSON form and are stored as `Missing`.
    pub fn number(n: f64) -> Self {
        if n.is_finite() {
            CellValue::Number(n)
        } else {
            CellValue::Missing
        }
    }

    /// Best-effort typing of a raw text field (CSV sources).
    ///
    /// Text that would not survive as a number stays text: zero-padded
    /// identifiers such as `007`, and spellings like `NaN` or `inf`.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Missing;
        }
        if has_leading_zero(trimmed) {
            return CellValue::Text(raw.to_string());
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return CellValue::Int(n);
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
            return CellValue::Text(raw.to_string());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT) {
            return CellValue::DateTime(dt);
        }
        CellValue::Text(raw.to_string())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// True for `Missing` and for whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Missing => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value of the cell, if it has one.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            CellValue::Int(n) => Some(Decimal::from(*n)),
            CellValue::Number(n) => Decimal::from_f64(*n),
            CellValue::Bool(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
            CellValue::Text(s) => parse_decimal(s),
            CellValue::Missing | CellValue::DateTime(_) => None,
        }
    }
}

fn has_leading_zero(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    let bytes = digits.as_bytes();
    bytes.len() > 1 && bytes[0] == b'0' && bytes[1].is_ascii_digit()
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(n) => write!(f, "{n}"),
            // Integral floats print without a fractional part.
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Int(n)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::number(n)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Missing => serializer.serialize_none(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Int(n) => serializer.serialize_i64(*n),
            CellValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            CellValue::Number(_) => serializer.serialize_none(),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::DateTime(dt) => serializer.collect_str(&dt.format(DATETIME_FORMAT)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireCell {
    Bool(bool),
    Int(i64),
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<WireCell>::deserialize(deserializer)? {
            None => CellValue::Missing,
            Some(WireCell::Bool(b)) => CellValue::Bool(b),
            Some(WireCell::Int(n)) => CellValue::Int(n),
            Some(WireCell::Number(n)) => CellValue::number(n),
            Some(WireCell::Text(s)) => CellValue::Text(s),
        })
    }
}
