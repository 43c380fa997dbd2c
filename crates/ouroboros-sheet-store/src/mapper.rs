//! Grid ↔ record mapping.

use crate::record::Record;
use crate::value::CellValue;

/// Raw rectangular read: rows of cells, the first row being the header.
pub type Grid = Vec<Vec<CellValue>>;

/// Lower-cased header row, or `None` for an empty grid.
pub fn header_of(grid: &[Vec<CellValue>]) -> Option<Vec<String>> {
    grid.first()
        .map(|row| row.iter().map(|cell| cell.to_string().trim().to_lowercase()).collect())
}

/// Builds one record per data row, zipping header fields positionally.
///
/// Missing trailing cells become [`CellValue::Empty`]; cells beyond the
/// header are dropped.
pub fn to_records(grid: &[Vec<CellValue>]) -> Vec<Record> {
    let Some(header) = header_of(grid) else {
        return Vec::new();
    };
    grid[1..]
        .iter()
        .map(|row| {
            let mut record = Record::with_capacity(header.len());
            for (i, field) in header.iter().enumerate() {
                record.insert(field.as_str(), row.get(i).cloned().unwrap_or_default());
            }
            record
        })
        .collect()
}

/// Lays a record out as a row aligned to `header`.
pub fn to_row(record: &Record, header: &[String]) -> Vec<CellValue> {
    header
        .iter()
        .map(|field| record.get(field).cloned().unwrap_or_default())
        .collect()
}

/// 1-based sheet column of `field` in `header`.
///
/// Blank header cells never match. Returns `0` when the field has no
/// column; callers treat that as "not writable" and skip the field.
pub fn column_of(field: &str, header: &[String]) -> usize {
    if field.is_empty() {
        return 0;
    }
    header
        .iter()
        .position(|name| name == field)
        .map_or(0, |i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|row| row.iter().map(|c| CellValue::from(*c)).collect())
            .collect()
    }

    #[test]
    fn test_header_lowercased() {
        let g = grid(&[&["ID", " Name ", "Fecha_Creacion"]]);
        assert_eq!(
            header_of(&g).unwrap(),
            vec!["id".to_string(), "name".to_string(), "fecha_creacion".to_string()]
        );
        assert!(header_of(&[]).is_none());
    }

    #[test]
    fn test_to_records_short_and_long_rows() {
        let g = grid(&[&["id", "name", "city"], &["1", "Ana"], &["2", "Bob", "Lima", "extra"]]);
        let records = to_records(&g);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("city"), Some(&CellValue::Empty));
        assert_eq!(records[1].len(), 3);
        assert_eq!(records[1].get("city"), Some(&CellValue::from("Lima")));
    }

    #[test]
    fn test_to_records_header_only_or_empty() {
        assert!(to_records(&grid(&[&["id"]])).is_empty());
        assert!(to_records(&[]).is_empty());
    }

    #[test]
    fn test_round_trip() {
        let g = grid(&[
            &["id", "name", "active"],
            &["1", "Ana", "TRUE"],
            &["2", "Bob", "FALSE"],
        ]);
        let header = header_of(&g).unwrap();
        let rows: Vec<Vec<CellValue>> = to_records(&g).iter().map(|r| to_row(r, &header)).collect();
        assert_eq!(rows, g[1..].to_vec());
    }

    #[test]
    fn test_to_row_fills_missing_and_ignores_unknown() {
        let header = vec!["id".to_string(), "name".to_string(), "city".to_string()];
        let record: Record = [("name", "Ana"), ("zip", "1000")].into_iter().collect();
        assert_eq!(
            to_row(&record, &header),
            vec![CellValue::Empty, CellValue::from("Ana"), CellValue::Empty]
        );
    }

    #[test]
    fn test_column_of() {
        let header = header_of(&grid(&[&["id", "name", "active"]])).unwrap();
        assert_eq!(column_of("id", &header), 1);
        assert_eq!(column_of("active", &header), 3);
        assert_eq!(column_of("missing", &header), 0);
        assert_eq!(column_of("id", &[]), 0);
    }

    #[test]
    fn test_column_of_counts_blank_header_cells() {
        let header = header_of(&grid(&[&["id", "", "name", "", "active"]])).unwrap();
        assert_eq!(column_of("name", &header), 3);
        assert_eq!(column_of("active", &header), 5);
        assert_eq!(column_of("", &header), 0);
    }
}
