//! Grid backends: where the cells actually live.
//!
//! The store never talks to a spreadsheet service directly. It is handed a
//! [`GridBackend`] at construction and issues the four primitive calls below.

pub mod memory;

use async_trait::async_trait;
use ouroboros_common::Result;
use serde::Serialize;

use crate::address::GridRange;
use crate::mapper::Grid;
use crate::value::CellValue;

pub use memory::{BackendCall, MemoryGrid};

/// One targeted single-cell write.
#[derive(Debug, Clone, PartialEq)]
pub struct CellWrite {
    pub range: GridRange,
    pub value: CellValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendOutcome {
    pub updated_range: String,
    pub updated_rows: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub total_updated_rows: u32,
    pub total_updated_cells: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearOutcome {
    pub cleared_range: String,
}

/// Remote rectangular cell storage.
///
/// Failures come back as [`ouroboros_common::StoreError::Api`] when the
/// service answered with a structured error, and as
/// [`ouroboros_common::StoreError::Network`] otherwise.
#[async_trait]
pub trait GridBackend: Send + Sync {
    /// Identifier of the backing document, reported in error details.
    fn source_id(&self) -> &str;

    /// Reads a rectangular range as raw (unformatted) values.
    async fn read_range(&self, range: &GridRange) -> Result<Grid>;

    /// Appends one row after the table found in `range`.
    async fn append_row(&self, range: &GridRange, row: Vec<CellValue>) -> Result<AppendOutcome>;

    /// Writes every cell in one batch.
    async fn write_cells(&self, writes: Vec<CellWrite>) -> Result<WriteOutcome>;

    /// Clears the values in `range`.
    async fn clear_range(&self, range: &GridRange) -> Result<ClearOutcome>;
}
