//! In-process grid backend.
//!
//! Behaves like the hosted spreadsheet service where it matters to the
//! store: reads trim trailing empty rows and cells, written text is parsed as
//! user-entered input, and appends land after the last non-empty row.

use async_trait::async_trait;
use ouroboros_common::{Result, StoreError};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap, VecDeque};

use super::{AppendOutcome, CellWrite, ClearOutcome, GridBackend, WriteOutcome};
use crate::address::GridRange;
use crate::mapper::Grid;
use crate::value::CellValue;

/// A call received by [`MemoryGrid`], recorded for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Read(String),
    Append(String),
    Write(usize),
    Clear(String),
}

/// Grid backend held entirely in memory, keyed by sheet name.
#[derive(Debug, Default)]
pub struct MemoryGrid {
    source_id: String,
    sheets: RwLock<HashMap<String, Grid>>,
    faults: Mutex<VecDeque<StoreError>>,
    calls: Mutex<Vec<BackendCall>>,
}

fn user_entered(value: CellValue) -> CellValue {
    match value {
        CellValue::Text(text) => CellValue::parse_user_entered(&text),
        other => other,
    }
}

fn unknown_sheet(range: &GridRange) -> StoreError {
    StoreError::Api {
        code: 400,
        message: format!("Unable to parse range: {}", range),
        status: Some("INVALID_ARGUMENT".to_string()),
    }
}

fn set_cell(rows: &mut Grid, row: u32, column: u32, value: CellValue) {
    let (r, c) = (row as usize - 1, column as usize - 1);
    if rows.len() <= r {
        rows.resize_with(r + 1, Vec::new);
    }
    let cells = &mut rows[r];
    if cells.len() <= c {
        cells.resize(c + 1, CellValue::Empty);
    }
    cells[c] = value;
}

fn is_blank_row(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_empty)
}

impl MemoryGrid {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            ..Self::default()
        }
    }

    /// Adds a sheet from text rows, parsed as user-entered input.
    pub fn with_sheet(self, name: &str, rows: &[&[&str]]) -> Self {
        let grid = rows
            .iter()
            .map(|row| row.iter().map(|cell| CellValue::parse_user_entered(cell)).collect())
            .collect();
        self.sheets.write().insert(name.to_string(), grid);
        self
    }

    /// Replaces a sheet with raw cells, stored exactly as given.
    pub fn set_sheet(&self, name: &str, grid: Grid) {
        self.sheets.write().insert(name.to_string(), grid);
    }

    /// Snapshot of a sheet's raw cells.
    pub fn sheet(&self, name: &str) -> Option<Grid> {
        self.sheets.read().get(name).cloned()
    }

    /// Value at a 1-based position; `Empty` outside the written area.
    pub fn cell(&self, name: &str, row: u32, column: u32) -> Option<CellValue> {
        let sheets = self.sheets.read();
        let grid = sheets.get(name)?;
        Some(
            grid.get(row as usize - 1)
                .and_then(|cells| cells.get(column as usize - 1))
                .cloned()
                .unwrap_or_default(),
        )
    }

    /// Makes the next backend call fail with `err`.
    pub fn fail_next(&self, err: StoreError) {
        self.faults.lock().push_back(err);
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    /// Number of calls that changed the grid.
    pub fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| !matches!(c, BackendCall::Read(_)))
            .count()
    }

    fn begin(&self, call: BackendCall) -> Result<()> {
        self.calls.lock().push(call);
        match self.faults.lock().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GridBackend for MemoryGrid {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn read_range(&self, range: &GridRange) -> Result<Grid> {
        self.begin(BackendCall::Read(range.to_string()))?;
        let sheets = self.sheets.read();
        let grid = sheets.get(&range.sheet).ok_or_else(|| unknown_sheet(range))?;

        let first = range.start_row as usize - 1;
        let last = range.end_row.map_or(grid.len(), |r| (r as usize).min(grid.len()));
        let (col_start, col_end) = (range.start_col as usize - 1, range.end_col as usize);

        let mut out: Grid = grid
            .get(first..last.max(first))
            .unwrap_or_default()
            .iter()
            .map(|cells| {
                let mut row: Vec<CellValue> = cells
                    .iter()
                    .take(col_end)
                    .skip(col_start)
                    .cloned()
                    .collect();
                while row.last().is_some_and(CellValue::is_empty) {
                    row.pop();
                }
                row
            })
            .collect();
        while out.last().is_some_and(|row| row.is_empty()) {
            out.pop();
        }
        Ok(out)
    }

    async fn append_row(&self, range: &GridRange, row: Vec<CellValue>) -> Result<AppendOutcome> {
        self.begin(BackendCall::Append(range.to_string()))?;
        let mut sheets = self.sheets.write();
        let grid = sheets.get_mut(&range.sheet).ok_or_else(|| unknown_sheet(range))?;

        let first = range.start_row as usize - 1;
        let target = grid
            .iter()
            .enumerate()
            .skip(first)
            .filter(|(_, cells)| !is_blank_row(cells))
            .map(|(i, _)| i + 1)
            .last()
            .unwrap_or(first);
        let row_number = target as u32 + 1;

        let width = row.len().max(1) as u32;
        for (i, value) in row.into_iter().enumerate() {
            set_cell(grid, row_number, range.start_col + i as u32, user_entered(value));
        }
        if grid.len() < target + 1 {
            grid.resize_with(target + 1, Vec::new);
        }

        let updated = GridRange {
            sheet: range.sheet.clone(),
            start_row: row_number,
            start_col: range.start_col,
            end_row: Some(row_number),
            end_col: range.start_col + width - 1,
        };
        Ok(AppendOutcome {
            updated_range: updated.to_string(),
            updated_rows: 1,
        })
    }

    async fn write_cells(&self, writes: Vec<CellWrite>) -> Result<WriteOutcome> {
        self.begin(BackendCall::Write(writes.len()))?;
        let mut sheets = self.sheets.write();
        if let Some(bad) = writes.iter().find(|w| !sheets.contains_key(&w.range.sheet)) {
            return Err(unknown_sheet(&bad.range));
        }

        let mut rows = BTreeSet::new();
        let mut cells = 0;
        for write in writes {
            if let Some(grid) = sheets.get_mut(&write.range.sheet) {
                set_cell(grid, write.range.start_row, write.range.start_col, user_entered(write.value));
                rows.insert((write.range.sheet, write.range.start_row));
                cells += 1;
            }
        }
        Ok(WriteOutcome {
            total_updated_rows: rows.len() as u32,
            total_updated_cells: cells,
        })
    }

    async fn clear_range(&self, range: &GridRange) -> Result<ClearOutcome> {
        self.begin(BackendCall::Clear(range.to_string()))?;
        let mut sheets = self.sheets.write();
        let grid = sheets.get_mut(&range.sheet).ok_or_else(|| unknown_sheet(range))?;

        let first = range.start_row as usize - 1;
        let last = range.end_row.map_or(grid.len(), |r| (r as usize).min(grid.len()));
        let (col_start, col_end) = (range.start_col as usize - 1, range.end_col as usize);
        for cells in grid.iter_mut().take(last).skip(first) {
            for cell in cells.iter_mut().take(col_end).skip(col_start) {
                *cell = CellValue::Empty;
            }
        }
        Ok(ClearOutcome {
            cleared_range: range.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::RangeDescriptor;

    fn grid() -> MemoryGrid {
        MemoryGrid::new("book-1").with_sheet(
            "S",
            &[&["id", "name", "active"], &["1", "Ana", "TRUE"], &["2", "Bob", "FALSE"]],
        )
    }

    #[tokio::test]
    async fn test_read_parses_and_trims() {
        let backend = grid();
        let d = RangeDescriptor::new("S", 1);
        let rows = backend.read_range(&d.data_range()).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec![CellValue::from(1), "Ana".into(), CellValue::Bool(true)]);

        backend.set_sheet("T", vec![vec!["h".into()], vec!["x".into(), CellValue::Empty], vec![]]);
        let rows = backend.read_range(&RangeDescriptor::new("T", 1).data_range()).await.unwrap();
        assert_eq!(rows, vec![vec![CellValue::from("h")], vec![CellValue::from("x")]]);
    }

    #[tokio::test]
    async fn test_read_from_header_offset() {
        let backend = MemoryGrid::new("b").with_sheet("S", &[&["title"], &[], &["id"], &["5"]]);
        let rows = backend.read_range(&RangeDescriptor::new("S", 3).data_range()).await.unwrap();
        assert_eq!(rows, vec![vec![CellValue::from("id")], vec![CellValue::from(5)]]);
    }

    #[tokio::test]
    async fn test_unknown_sheet_is_api_400() {
        let err = grid()
            .read_range(&RangeDescriptor::new("Nope", 1).data_range())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Api { code: 400, .. }));
    }

    #[tokio::test]
    async fn test_append_after_last_row() {
        let backend = grid();
        let d = RangeDescriptor::new("S", 1);
        let outcome = backend
            .append_row(&d.data_range(), vec!["3".into(), "Cid".into(), "TRUE".into()])
            .await
            .unwrap();
        assert_eq!(outcome.updated_range, "S!A4:C4");
        assert_eq!(backend.cell("S", 4, 1), Some(CellValue::from(3)));
        assert_eq!(backend.cell("S", 4, 3), Some(CellValue::Bool(true)));
    }

    #[tokio::test]
    async fn test_append_skips_trailing_cleared_rows() {
        let backend = grid();
        let d = RangeDescriptor::new("S", 1);
        backend.clear_range(&d.row_range(3)).await.unwrap();
        let outcome = backend.append_row(&d.data_range(), vec!["9".into()]).await.unwrap();
        assert_eq!(outcome.updated_range, "S!A3");
    }

    #[tokio::test]
    async fn test_write_and_clear() {
        let backend = grid();
        let d = RangeDescriptor::new("S", 1);
        let outcome = backend
            .write_cells(vec![
                CellWrite { range: d.cell(2, 2), value: "Ann".into() },
                CellWrite { range: d.cell(2, 5), value: "x".into() },
            ])
            .await
            .unwrap();
        assert_eq!(outcome.total_updated_rows, 1);
        assert_eq!(outcome.total_updated_cells, 2);
        assert_eq!(backend.cell("S", 2, 2), Some(CellValue::from("Ann")));

        let cleared = backend.clear_range(&d.row_range(2)).await.unwrap();
        assert_eq!(cleared.cleared_range, "S!A2:ZZZ2");
        assert!(backend.sheet("S").unwrap()[1].iter().all(CellValue::is_empty));
        assert_eq!(backend.cell("S", 3, 2), Some(CellValue::from("Bob")));
    }

    #[tokio::test]
    async fn test_fault_injection_and_call_log() {
        let backend = grid();
        let d = RangeDescriptor::new("S", 1);
        backend.fail_next(StoreError::Network("reset".to_string()));
        assert!(backend.read_range(&d.data_range()).await.is_err());
        assert!(backend.read_range(&d.data_range()).await.is_ok());
        assert_eq!(backend.calls().len(), 2);
        assert_eq!(backend.mutation_count(), 0);
    }
}
