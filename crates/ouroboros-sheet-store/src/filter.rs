//! Query filtering over records.

use ouroboros_common::{Result, StoreError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::json;
use std::fmt;

use crate::record::Record;
use crate::value::CellValue;

/// Field that identifies a record.
pub const ID_FIELD: &str = "id";

/// Soft-delete flag field.
pub const ACTIVE_FIELD: &str = "active";

/// Filter comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    /// Equal (`=`, `==`), after coercion
    #[default]
    Eq,
    /// Not equal (`!=`)
    Ne,
    /// Greater than (`>`), numeric
    Gt,
    /// Less than (`<`), numeric
    Lt,
    /// Greater than or equal (`>=`), numeric
    Gte,
    /// Less than or equal (`<=`), numeric
    Lte,
    /// Case-insensitive substring
    Contains,
    /// Case-insensitive prefix
    StartsWith,
    /// Case-insensitive suffix
    EndsWith,
}

impl Operator {
    /// Parses an operator token. Unknown tokens fall back to [`Operator::Eq`].
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "=" | "==" => Operator::Eq,
            "!=" => Operator::Ne,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Gte,
            "<=" => Operator::Lte,
            t if t.eq_ignore_ascii_case("contains") => Operator::Contains,
            t if t.eq_ignore_ascii_case("startswith") => Operator::StartsWith,
            t if t.eq_ignore_ascii_case("endswith") => Operator::EndsWith,
            _ => Operator::Eq,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
        }
    }

    /// Evaluates `field <op> value`.
    pub fn matches(&self, field: &CellValue, value: &CellValue) -> bool {
        match self {
            Operator::Eq => field.loose_eq(value),
            Operator::Ne => !field.loose_eq(value),
            Operator::Gt => compare_numeric(field, value, |a, b| a > b),
            Operator::Lt => compare_numeric(field, value, |a, b| a < b),
            Operator::Gte => compare_numeric(field, value, |a, b| a >= b),
            Operator::Lte => compare_numeric(field, value, |a, b| a <= b),
            Operator::Contains => compare_text(field, value, |f, v| f.contains(v)),
            Operator::StartsWith => compare_text(field, value, |f, v| f.starts_with(v)),
            Operator::EndsWith => compare_text(field, value, |f, v| f.ends_with(v)),
        }
    }
}

fn compare_numeric(field: &CellValue, value: &CellValue, cmp: fn(f64, f64) -> bool) -> bool {
    match (field.as_f64(), value.as_f64()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn compare_text(field: &CellValue, value: &CellValue, cmp: fn(&str, &str) -> bool) -> bool {
    cmp(
        &field.to_string().to_lowercase(),
        &value.to_string().to_lowercase(),
    )
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Operator {
    fn from(token: &str) -> Self {
        Operator::parse(token)
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Operator::parse(&token))
    }
}

/// Single-predicate filter: `column <operator> value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    #[serde(default)]
    pub operator: Operator,
    pub value: CellValue,
    /// Return every match (`true`) or only the first one.
    #[serde(default = "default_multiple")]
    pub multiple: bool,
}

fn default_multiple() -> bool {
    true
}

impl Filter {
    /// Equality filter returning every match.
    pub fn new(column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self {
            column: column.into(),
            operator: Operator::Eq,
            value: value.into(),
            multiple: true,
        }
    }

    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    /// Only the first match, returned as a single record.
    pub fn single(mut self) -> Self {
        self.multiple = false;
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        let column = self.column.to_lowercase();
        record
            .get(&column)
            .is_some_and(|field| self.operator.matches(field, &self.value))
    }
}

/// Result of a read: a list, or a single record when the filter asked for one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Selection {
    Many(Vec<Record>),
    One(Record),
}

impl Selection {
    pub fn len(&self) -> usize {
        match self {
            Selection::Many(records) => records.len(),
            Selection::One(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records_mut(&mut self) -> Box<dyn Iterator<Item = &mut Record> + '_> {
        match self {
            Selection::Many(records) => Box::new(records.iter_mut()),
            Selection::One(record) => Box::new(std::iter::once(record)),
        }
    }

    /// Flattens into a list regardless of shape.
    pub fn into_vec(self) -> Vec<Record> {
        match self {
            Selection::Many(records) => records,
            Selection::One(record) => vec![record],
        }
    }
}

/// A record is data (not a placeholder row) when its id is present,
/// non-empty and not zero.
pub fn has_valid_id(record: &Record) -> bool {
    match record.get(ID_FIELD) {
        None => false,
        Some(id) if id.is_empty() => false,
        Some(id) => id.as_f64() != Some(0.0),
    }
}

/// Drops placeholder rows.
pub fn retain_valid(mut records: Vec<Record>) -> Vec<Record> {
    records.retain(has_valid_id);
    records
}

/// False only when `active` is explicitly false; missing or empty counts as active.
pub fn is_active(record: &Record) -> bool {
    record
        .get(ACTIVE_FIELD)
        .and_then(CellValue::as_bool)
        .unwrap_or(true)
}

/// Applies `filter` to already-validated records.
///
/// Zero matches is a not-found error, never an empty list.
pub fn apply(records: Vec<Record>, filter: &Filter) -> Result<Selection> {
    let mut matches = records.into_iter().filter(|r| filter.matches(r));
    let selection = if filter.multiple {
        Selection::Many(matches.collect())
    } else {
        match matches.next() {
            Some(record) => Selection::One(record),
            None => Selection::Many(Vec::new()),
        }
    };
    if selection.is_empty() {
        return Err(StoreError::not_found(format!(
            "No records match {} {} {}",
            filter.column, filter.operator, filter.value
        ))
        .with_details(json!({
            "column": filter.column,
            "operator": filter.operator,
            "value": filter.value,
        })));
    }
    Ok(selection)
}
