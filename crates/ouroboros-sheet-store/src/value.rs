//! Cell values as they travel between the grid and records.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};
use std::fmt;

/// A single grid cell.
///
/// Serializes untagged, so `Empty` is `null` and the other variants map to
/// the matching JSON scalar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing or cleared cell
    #[default]
    Empty,
    /// Boolean cell (checkboxes, TRUE/FALSE)
    Bool(bool),
    /// Numeric cell
    Number(Number),
    /// Anything else, including formatted dates
    Text(String),
}

impl CellValue {
    /// Parses text the way the spreadsheet interprets user-entered input:
    /// `TRUE`/`FALSE` become booleans, numeric text becomes a number,
    /// blank text becomes empty.
    pub fn parse_user_entered(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }
        if let Ok(int) = trimmed.parse::<i64>() {
            return CellValue::Number(int.into());
        }
        if let Some(number) = trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .and_then(Number::from_f64)
        {
            return CellValue::Number(number);
        }
        CellValue::Text(text.to_string())
    }

    /// Returns true for empty cells and whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the cell; numeric text counts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => n.as_f64(),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Integral numeric view of the cell.
    pub fn as_i64(&self) -> Option<i64> {
        if let CellValue::Number(n) = self {
            if let Some(int) = n.as_i64() {
                return Some(int);
            }
        }
        self.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64)
    }

    /// Boolean view of the cell; `true`/`false` text counts, in any case.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            CellValue::Text(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
            CellValue::Text(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Text payload, if this is a text cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Equality after coercion.
    ///
    /// Numbers and numeric text compare numerically, booleans compare against
    /// `true`/`false` text case-insensitively, empty only equals empty, and
    /// everything else compares by its text rendering.
    pub fn loose_eq(&self, other: &CellValue) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() && other.is_empty();
        }
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a == b;
        }
        if matches!(self, CellValue::Bool(_)) || matches!(other, CellValue::Bool(_)) {
            return match (self.as_bool(), other.as_bool()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
        }
        self.to_string() == other.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
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

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n.into())
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n.into())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(CellValue::Empty, CellValue::Number)
    }
}

impl From<JsonValue> for CellValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => CellValue::Empty,
            JsonValue::Bool(b) => CellValue::Bool(b),
            JsonValue::Number(n) => CellValue::Number(n),
            JsonValue::String(s) => CellValue::Text(s),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<CellValue> for JsonValue {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Empty => JsonValue::Null,
            CellValue::Bool(b) => JsonValue::Bool(b),
            CellValue::Number(n) => JsonValue::Number(n),
            CellValue::Text(s) => JsonValue::String(s),
        }
    }
}
