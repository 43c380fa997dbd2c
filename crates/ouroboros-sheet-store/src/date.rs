//! Date normalization between the display form (`DD/MM/YYYY`) and the
//! storage form (`YYYY-MM-DD`).
//!
//! Only calendar dates are handled; no time zone is ever involved, so a
//! value converts to the same day regardless of where the process runs.

use chrono::{Local, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

use crate::record::Record;
use crate::value::CellValue;

/// Which way [`normalize`] converts matching fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateDirection {
    /// `D/M/Y` → `YYYY-MM-DD`
    ToStorage,
    /// `Y-M-D` → `DD/MM/YYYY`
    ToDisplay,
}

fn display_re() -> &'static Regex {
    static DISPLAY_RE: OnceLock<Regex> = OnceLock::new();
    DISPLAY_RE.get_or_init(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2,4})$").expect("valid regex"))
}

fn storage_re() -> &'static Regex {
    static STORAGE_RE: OnceLock<Regex> = OnceLock::new();
    STORAGE_RE.get_or_init(|| Regex::new(r"^(\d{2,4})-(\d{1,2})-(\d{1,2})$").expect("valid regex"))
}

/// Two-digit years pivot at 50: `24` is 2024, `75` is 1975.
fn expand_year(digits: &str) -> Option<i32> {
    let year: i32 = digits.parse().ok()?;
    Some(match digits.len() {
        2 if year < 50 => 2000 + year,
        2 => 1900 + year,
        _ => year,
    })
}

fn build_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(expand_year(year)?, month.parse().ok()?, day.parse().ok()?)
}

/// Formats a date in the storage form.
pub fn format_storage(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Formats a date in the display form.
pub fn format_display(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Today's local date in the display form.
pub fn today_display() -> String {
    format_display(Local::now().date_naive())
}

/// Converts a display-form date to the storage form.
///
/// Returns `None` when the text does not match the display pattern or names
/// an impossible date such as `31/02/2024`.
pub fn to_storage(text: &str) -> Option<String> {
    let caps = display_re().captures(text)?;
    build_date(&caps[3], &caps[2], &caps[1]).map(format_storage)
}

/// Converts a storage-form date to the display form.
pub fn to_display(text: &str) -> Option<String> {
    let caps = storage_re().captures(text)?;
    build_date(&caps[1], &caps[2], &caps[3]).map(format_display)
}

/// Rewrites every date-like text field of `record` in `direction`.
///
/// Returns how many fields were rewritten.
pub fn normalize(record: &mut Record, direction: DateDirection) -> usize {
    let convert = match direction {
        DateDirection::ToStorage => to_storage,
        DateDirection::ToDisplay => to_display,
    };
    let mut converted = 0;
    for value in record.values_mut() {
        let Some(rewritten) = value.as_str().and_then(convert) else {
            continue;
        };
        *value = CellValue::Text(rewritten);
        converted += 1;
    }
    converted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, CellValue)]) -> Record {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_to_storage_pads() {
        assert_eq!(to_storage("5/3/2024").as_deref(), Some("2024-03-05"));
        assert_eq!(to_storage("15/12/1999").as_deref(), Some("1999-12-15"));
        assert_eq!(to_storage("1/2/24").as_deref(), Some("2024-02-01"));
        assert_eq!(to_storage("1/2/75").as_deref(), Some("1975-02-01"));
    }

    #[test]
    fn test_to_display_pads() {
        assert_eq!(to_display("2024-3-5").as_deref(), Some("05/03/2024"));
        assert_eq!(to_display("2024-12-31").as_deref(), Some("31/12/2024"));
        assert_eq!(to_display("99-1-1").as_deref(), Some("01/01/1999"));
    }

    #[test]
    fn test_rejects_non_dates() {
        assert!(to_storage("31/02/2024").is_none());
        assert!(to_storage("2024-03-05").is_none());
        assert!(to_storage("5/3").is_none());
        assert!(to_display("05/03/2024").is_none());
        assert!(to_display("2024-13-01").is_none());
        assert!(to_display("12345").is_none());
    }

    #[test]
    fn test_normalize_only_touches_matching_text() {
        let mut r = record(&[
            ("fecha", CellValue::from("05/03/2024")),
            ("name", CellValue::from("Ana")),
            ("id", CellValue::from(7)),
            ("active", CellValue::Bool(true)),
            ("stored", CellValue::from("2024-01-01")),
        ]);
        assert_eq!(normalize(&mut r, DateDirection::ToStorage), 1);
        assert_eq!(r.get("fecha"), Some(&CellValue::from("2024-03-05")));
        assert_eq!(r.get("name"), Some(&CellValue::from("Ana")));
        assert_eq!(r.get("id"), Some(&CellValue::from(7)));
        assert_eq!(r.get("active"), Some(&CellValue::Bool(true)));
        assert_eq!(r.get("stored"), Some(&CellValue::from("2024-01-01")));
    }

    #[test]
    fn test_normalize_idempotent() {
        let original = record(&[("a", "05/03/2024".into()), ("b", "2023-11-09".into())]);

        let mut once = original.clone();
        normalize(&mut once, DateDirection::ToStorage);
        let mut twice = once.clone();
        normalize(&mut twice, DateDirection::ToStorage);
        assert_eq!(once, twice);

        let mut once = original.clone();
        normalize(&mut once, DateDirection::ToDisplay);
        let mut twice = once.clone();
        normalize(&mut twice, DateDirection::ToDisplay);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_round_trip_restores_display() {
        for text in ["05/03/2024", "31/12/1999", "29/02/2024", "01/01/2000"] {
            let mut r = record(&[("d", text.into())]);
            normalize(&mut r, DateDirection::ToStorage);
            normalize(&mut r, DateDirection::ToDisplay);
            assert_eq!(r.get("d"), Some(&CellValue::from(text)));
        }
    }

    #[test]
    fn test_today_display_shape() {
        let today = today_display();
        assert!(display_re().is_match(&today));
        assert_eq!(today.len(), 10);
    }
}
