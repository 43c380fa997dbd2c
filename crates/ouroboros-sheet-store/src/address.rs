//! Grid addressing: ranges, cell addresses and record → row resolution.
//!
//! Rows and columns are 1-based throughout. A record at 0-based index `i`
//! among the *unfiltered* data rows lives on grid row `i + row_head + 1`.

use ouroboros_common::{Result, StoreError};
use serde_json::json;
use std::fmt;

use crate::record::Record;
use crate::value::CellValue;

/// Column `ZZZ`, the right edge used for "the whole row" ranges.
pub const LAST_COLUMN: u32 = 18_278;

/// Converts a 1-based column number to its letters (`1` → `A`, `27` → `AA`).
pub fn column_letters(mut column: u32) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = ((column - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn quote_sheet(name: &str) -> String {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Rectangular region of one sheet. `end_row == None` means "to the last row".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRange {
    pub sheet: String,
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: Option<u32>,
    pub end_col: u32,
}

impl GridRange {
    /// A single cell.
    pub fn cell(sheet: impl Into<String>, row: u32, column: u32) -> Self {
        Self {
            sheet: sheet.into(),
            start_row: row,
            start_col: column,
            end_row: Some(row),
            end_col: column,
        }
    }

    pub fn is_single_cell(&self) -> bool {
        self.end_row == Some(self.start_row) && self.end_col == self.start_col
    }
}

impl fmt::Display for GridRange {
    /// A1 notation, e.g. `Clientes!A1:ZZZ`, `'Hoja 1'!C5`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{}{}",
            quote_sheet(&self.sheet),
            column_letters(self.start_col),
            self.start_row
        )?;
        if self.is_single_cell() {
            return Ok(());
        }
        write!(f, ":{}", column_letters(self.end_col))?;
        if let Some(end_row) = self.end_row {
            write!(f, "{}", end_row)?;
        }
        Ok(())
    }
}

/// Sheet name plus header row: the region every operation reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeDescriptor {
    sheet_name: String,
    row_head: u32,
}

impl RangeDescriptor {
    pub fn new(sheet_name: impl Into<String>, row_head: u32) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            row_head,
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn row_head(&self) -> u32 {
        self.row_head
    }

    /// From the header row to column `ZZZ`, unbounded downwards.
    pub fn data_range(&self) -> GridRange {
        GridRange {
            sheet: self.sheet_name.clone(),
            start_row: self.row_head,
            start_col: 1,
            end_row: None,
            end_col: LAST_COLUMN,
        }
    }

    /// Absolute grid row of the data record at `index`.
    pub fn absolute_row(&self, index: usize) -> u32 {
        index as u32 + self.row_head + 1
    }

    /// Every column of one row.
    pub fn row_range(&self, row: u32) -> GridRange {
        GridRange {
            sheet: self.sheet_name.clone(),
            start_row: row,
            start_col: 1,
            end_row: Some(row),
            end_col: LAST_COLUMN,
        }
    }

    pub fn cell(&self, row: u32, column: u32) -> GridRange {
        GridRange::cell(self.sheet_name.clone(), row, column)
    }
}

/// Index of the first record whose `column` loosely equals `id`.
///
/// An empty `id` is rejected: it would loosely match cleared rows.
pub fn find_row(records: &[Record], column: &str, id: &CellValue) -> Result<usize> {
    if id.is_empty() {
        return Err(StoreError::validation(format!(
            "A non-empty {} is required to locate a record",
            column
        ))
        .with_details(json!({ "column": column })));
    }
    records
        .iter()
        .position(|record| record.get(column).is_some_and(|value| value.loose_eq(id)))
        .ok_or_else(|| {
            StoreError::not_found(format!("No record with {} = {}", column, id))
                .with_details(json!({ "column": column, "id": id }))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::to_records;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(52), "AZ");
        assert_eq!(column_letters(703), "AAA");
        assert_eq!(column_letters(LAST_COLUMN), "ZZZ");
    }

    #[test]
    fn test_range_display() {
        let d = RangeDescriptor::new("Clientes", 1);
        assert_eq!(d.data_range().to_string(), "Clientes!A1:ZZZ");
        assert_eq!(d.row_range(3).to_string(), "Clientes!A3:ZZZ3");
        assert_eq!(d.cell(5, 3).to_string(), "Clientes!C5");

        let d = RangeDescriptor::new("Hoja 1", 2);
        assert_eq!(d.data_range().to_string(), "'Hoja 1'!A2:ZZZ");
        assert_eq!(RangeDescriptor::new("it's", 1).cell(1, 1).to_string(), "'it''s'!A1");
    }

    #[test]
    fn test_absolute_row_skips_header() {
        assert_eq!(RangeDescriptor::new("S", 1).absolute_row(0), 2);
        assert_eq!(RangeDescriptor::new("S", 1).absolute_row(1), 3);
        assert_eq!(RangeDescriptor::new("S", 4).absolute_row(0), 5);
    }

    #[test]
    fn test_find_row() {
        let grid: Vec<Vec<CellValue>> = vec![
            vec!["id".into(), "name".into()],
            vec![CellValue::Empty, CellValue::Empty],
            vec![1.into(), "Ana".into()],
            vec![2.into(), "Bob".into()],
        ];
        let records = to_records(&grid);
        assert_eq!(find_row(&records, "id", &"2".into()).unwrap(), 2);
        assert_eq!(find_row(&records, "name", &"Ana".into()).unwrap(), 1);

        let err = find_row(&records, "id", &9.into()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(err.details().unwrap()["id"], 9);
        assert!(find_row(&records, "nope", &1.into()).is_err());
    }

    #[test]
    fn test_find_row_rejects_empty_id() {
        let grid: Vec<Vec<CellValue>> = vec![
            vec!["id".into(), "name".into()],
            vec![CellValue::Empty, CellValue::Empty],
            vec![1.into(), "Ana".into()],
        ];
        let records = to_records(&grid);
        for id in [CellValue::Empty, CellValue::from("  ")] {
            let err = find_row(&records, "id", &id).unwrap_err();
            assert!(matches!(err, StoreError::Validation { .. }));
            assert_eq!(err.details().unwrap()["column"], "id");
        }
    }
}
