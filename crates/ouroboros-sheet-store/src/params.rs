//! Request and result types for store operations.

use serde::{Deserialize, Serialize};

use crate::filter::Filter;
use crate::record::Record;
use crate::value::CellValue;

/// Options for [`crate::SheetStore::read`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadQuery {
    #[serde(default)]
    pub filter: Option<Filter>,
    /// Keep records whose `active` flag is false.
    #[serde(default)]
    pub include_inactive: bool,
}

impl ReadQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn include_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }
}

/// Who submitted an insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub alias: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRequest {
    pub data: Record,
    #[serde(default)]
    pub user: Option<User>,
    /// Assign `id = last id + 1`.
    #[serde(default)]
    pub include_id: bool,
}

impl InsertRequest {
    pub fn new(data: Record) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn user(mut self, alias: impl Into<String>) -> Self {
        self.user = Some(User { alias: alias.into() });
        self
    }

    pub fn include_id(mut self) -> Self {
        self.include_id = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// Column identifying the record
    pub col_name: String,
    /// Value `col_name` must (loosely) equal
    pub id: CellValue,
    /// Fields to write
    pub values: Record,
}

impl UpdateRequest {
    pub fn new(col_name: impl Into<String>, id: impl Into<CellValue>, values: Record) -> Self {
        Self {
            col_name: col_name.into(),
            id: id.into(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    /// The record as written, dates in storage form
    pub inserted_data: Record,
    pub rows_added: u32,
    pub range: String,
    /// Submitted fields with no matching header column
    pub ignored_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub updated_fields: Vec<String>,
    /// Fields with no matching column; not written
    pub skipped_fields: Vec<String>,
    pub rows_updated: u32,
    pub cells_updated: u32,
    /// Absolute grid row that was written
    pub row: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub deleted_record: Record,
    pub cleared_range: String,
    pub row_deleted: u32,
}
