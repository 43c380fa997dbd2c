//! The record store facade.
//!
//! Every public operation follows the same shape: read the whole data range,
//! project it into records, locate or select what the call is about, and,
//! for mutations, issue precise cell writes. Outcomes are always returned as
//! an [`Envelope`]; errors and panics raised anywhere below are converted at
//! this boundary.
//!
//! Mutations resolve their target row from a fresh read and write in a
//! separate call. Another writer changing the sheet in between can shift the
//! target row; the store does not guard against that.

use futures::FutureExt;
use ouroboros_common::{HttpStatus, Result, StoreError};
use serde_json::{json, Map, Value};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::address::{self, RangeDescriptor};
use crate::backend::{CellWrite, GridBackend};
use crate::config::SheetConfig;
use crate::date::{self, DateDirection};
use crate::envelope::{missing_fields, Envelope};
use crate::filter::{self, Selection, ACTIVE_FIELD, ID_FIELD};
use crate::mapper::{self, Grid};
use crate::params::{
    DeleteOutcome, InsertOutcome, InsertRequest, ReadQuery, UpdateOutcome, UpdateRequest,
};
use crate::record::Record;
use crate::value::CellValue;

/// Field stamped with the submitting user's alias on insert.
pub const SUBMITTED_BY_FIELD: &str = "registrado_por";

/// Field stamped with the creation date on insert.
pub const CREATED_AT_FIELD: &str = "fecha_creacion";

/// Row-oriented record store over one sheet.
#[derive(Clone)]
pub struct SheetStore {
    config: SheetConfig,
    range: RangeDescriptor,
    backend: Arc<dyn GridBackend>,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "operation panicked".to_string()
    }
}

/// Highest integral id among `records`, or 0.
fn max_id(records: &[Record]) -> i64 {
    records
        .iter()
        .filter_map(|r| r.get(ID_FIELD))
        .filter_map(CellValue::as_i64)
        .max()
        .unwrap_or(0)
}

/// Id following `max_id`, refusing to wrap past `i64::MAX`.
fn next_id(records: &[Record]) -> Result<i64> {
    let last = max_id(records);
    last.checked_add(1).ok_or_else(|| {
        StoreError::validation("Highest id is at the numeric limit; no next id")
            .with_details(json!({ "lastId": last }))
    })
}

fn to_display(mut record: Record) -> Record {
    date::normalize(&mut record, DateDirection::ToDisplay);
    record
}

impl SheetStore {
    /// Creates a store for the sheet described by `config`, backed by `backend`.
    pub fn new(config: SheetConfig, backend: Arc<dyn GridBackend>) -> Result<Self> {
        config.validate()?;
        let range = config.range_descriptor();
        Ok(Self {
            config,
            range,
            backend,
        })
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn descriptor(&self) -> &RangeDescriptor {
        &self.range
    }

    /// Reads records, optionally filtered. Dates come back in display form.
    ///
    /// Records flagged `active = false` are left out unless the query asks
    /// for them. An empty sheet is an empty list; a filter with no match is a
    /// not-found failure.
    #[instrument(skip(self, query), fields(sheet = %self.range.sheet_name()))]
    pub async fn read(&self, query: ReadQuery) -> Envelope<Selection> {
        self.guard("read", HttpStatus::OK, "Data retrieved successfully", self.try_read(&query))
            .await
    }

    /// Lower-cased header row.
    #[instrument(skip(self), fields(sheet = %self.range.sheet_name()))]
    pub async fn headers(&self) -> Envelope<Vec<String>> {
        self.guard("headers", HttpStatus::OK, "Headers retrieved successfully", self.try_headers())
            .await
    }

    /// Appends a new record.
    #[instrument(skip(self, request), fields(sheet = %self.range.sheet_name(), include_id = request.include_id))]
    pub async fn insert(&self, request: InsertRequest) -> Envelope<InsertOutcome> {
        self.guard("insert", HttpStatus::CREATED, "Data inserted successfully", self.try_insert(request))
            .await
    }

    /// Writes the given fields of the record where `col_name == id`.
    ///
    /// Fields without a matching column are skipped and listed in the result.
    #[instrument(skip(self, request), fields(sheet = %self.range.sheet_name(), col = %request.col_name, id = %request.id))]
    pub async fn update(&self, request: UpdateRequest) -> Envelope<UpdateOutcome> {
        let UpdateRequest { col_name, id, values } = request;
        self.guard(
            "update",
            HttpStatus::OK,
            "Data updated successfully",
            self.try_update(&col_name, &id, values),
        )
        .await
    }

    /// Soft delete: sets `active = false` on the record where `col_name == id`.
    #[instrument(skip(self, id), fields(sheet = %self.range.sheet_name(), id = %id))]
    pub async fn deactivate(&self, col_name: &str, id: CellValue) -> Envelope<Record> {
        let work = async {
            let mut values = Record::new();
            values.insert(ACTIVE_FIELD, false);
            self.try_update(col_name, &id, values).await?;
            let mut result = Record::new();
            result.insert(col_name.to_lowercase(), id.clone());
            result.insert(ACTIVE_FIELD, false);
            Ok::<_, StoreError>(result)
        };
        self.guard("deactivate", HttpStatus::OK, "Record deactivated successfully", work)
            .await
    }

    /// Hard delete: clears every cell of the row where `col_name == id`.
    #[instrument(skip(self, id), fields(sheet = %self.range.sheet_name(), id = %id))]
    pub async fn delete(&self, col_name: &str, id: CellValue) -> Envelope<DeleteOutcome> {
        self.guard("delete", HttpStatus::OK, "Record deleted successfully", self.try_delete(col_name, &id))
            .await
    }

    /// Highest numeric id in the sheet, or 0.
    #[instrument(skip(self), fields(sheet = %self.range.sheet_name()))]
    pub async fn last_id(&self) -> Envelope<i64> {
        let work = async { Ok::<_, StoreError>(max_id(&self.fetch_records().await?)) };
        self.guard("last_id", HttpStatus::OK, "Last id retrieved successfully", work)
            .await
    }

    /// Every record whose `key` loosely equals `value`.
    #[instrument(skip(self, value), fields(sheet = %self.range.sheet_name(), value = %value))]
    pub async fn find_by_key(&self, key: &str, value: CellValue) -> Envelope<Vec<Record>> {
        self.guard("find_by_key", HttpStatus::OK, "Data retrieved successfully", self.try_find(key, &value))
            .await
    }

    /// First record whose `key` loosely equals `value`.
    #[instrument(skip(self, value), fields(sheet = %self.range.sheet_name(), value = %value))]
    pub async fn find_one_by_key(&self, key: &str, value: CellValue) -> Envelope<Record> {
        let work = async {
            let mut found = self.try_find(key, &value).await?;
            Ok::<_, StoreError>(found.swap_remove(0))
        };
        self.guard("find_one_by_key", HttpStatus::OK, "Data retrieved successfully", work)
            .await
    }

    /// Runs one operation and turns its outcome into an envelope.
    async fn guard<T, F>(
        &self,
        operation: &'static str,
        status: HttpStatus,
        message: &'static str,
        work: F,
    ) -> Envelope<T>
    where
        F: Future<Output = Result<T>>,
    {
        match AssertUnwindSafe(work).catch_unwind().await {
            Ok(Ok(data)) => {
                info!(operation, "Operation complete");
                Envelope::success_with(data, status, message)
            }
            Ok(Err(err)) => {
                warn!(operation, error = %err, "Operation failed");
                Envelope::from_error(&err, operation, self.error_context())
            }
            Err(payload) => {
                let message = panic_message(payload);
                error!(operation, panic = %message, "Operation panicked");
                Envelope::from_error(&StoreError::Internal(message), operation, self.error_context())
            }
        }
    }

    fn error_context(&self) -> Map<String, Value> {
        let mut context = Map::new();
        context.insert("sheetName".to_string(), json!(self.range.sheet_name()));
        context.insert("sheetId".to_string(), json!(self.backend.source_id()));
        if let Some(description) = &self.config.description {
            context.insert("description".to_string(), json!(description));
        }
        context
    }

    async fn fetch_grid(&self) -> Result<Grid> {
        self.backend.read_range(&self.range.data_range()).await
    }

    /// Every data row as a record, unfiltered, in grid order.
    async fn fetch_records(&self) -> Result<Vec<Record>> {
        Ok(mapper::to_records(&self.fetch_grid().await?))
    }

    async fn try_read(&self, query: &ReadQuery) -> Result<Selection> {
        let records = self.fetch_records().await?;
        if records.is_empty() {
            return Ok(Selection::Many(Vec::new()));
        }
        let mut records = filter::retain_valid(records);
        if !query.include_inactive {
            records.retain(filter::is_active);
        }
        let mut selection = match &query.filter {
            Some(f) => filter::apply(records, f)?,
            None => Selection::Many(records),
        };
        for record in selection.records_mut() {
            date::normalize(record, DateDirection::ToDisplay);
        }
        debug!(count = selection.len(), "Records selected");
        Ok(selection)
    }

    async fn try_headers(&self) -> Result<Vec<String>> {
        let grid = self.fetch_grid().await?;
        mapper::header_of(&grid).ok_or_else(|| self.no_header())
    }

    fn no_header(&self) -> StoreError {
        StoreError::not_found(format!("Sheet {} has no header row", self.range.sheet_name()))
            .with_details(json!({ "rowHead": self.range.row_head() }))
    }

    async fn try_insert(&self, request: InsertRequest) -> Result<InsertOutcome> {
        let mut data = request.data.into_lowercase_keys();

        let missing = missing_fields(&data, &self.config.required_fields);
        if !missing.is_empty() {
            return Err(StoreError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))
            .with_details(json!({ "missingFields": missing })));
        }

        if let Some(user) = &request.user {
            data.insert(SUBMITTED_BY_FIELD, user.alias.clone());
        }

        // One read serves both the next id and the header.
        let grid = self.fetch_grid().await?;
        let header = mapper::header_of(&grid).ok_or_else(|| self.no_header())?;
        if request.include_id {
            let next = next_id(&mapper::to_records(&grid))?;
            data.insert(ID_FIELD, next);
        }
        data.insert(ACTIVE_FIELD, true);
        data.insert(CREATED_AT_FIELD, date::today_display());
        date::normalize(&mut data, DateDirection::ToStorage);

        let ignored_fields: Vec<String> = data
            .keys()
            .filter(|k| !header.iter().any(|h| h == k))
            .map(str::to_string)
            .collect();
        if !ignored_fields.is_empty() {
            warn!(fields = ?ignored_fields, "Fields without a header column were not written");
        }

        let row = mapper::to_row(&data, &header);
        let outcome = self.backend.append_row(&self.range.data_range(), row).await?;
        debug!(range = %outcome.updated_range, "Row appended");

        Ok(InsertOutcome {
            inserted_data: data,
            rows_added: outcome.updated_rows,
            range: outcome.updated_range,
            ignored_fields,
        })
    }

    async fn try_update(&self, col_name: &str, id: &CellValue, values: Record) -> Result<UpdateOutcome> {
        if values.is_empty() {
            return Err(StoreError::validation("No values provided for update"));
        }
        let column = col_name.to_lowercase();
        let mut values = values.into_lowercase_keys();
        date::normalize(&mut values, DateDirection::ToStorage);

        // Columns come from the header row so blank or repeated header cells
        // keep their real positions.
        let grid = self.fetch_grid().await?;
        let header = mapper::header_of(&grid).ok_or_else(|| self.no_header())?;
        let records = mapper::to_records(&grid);
        let index = address::find_row(&records, &column, id)?;
        let row = self.range.absolute_row(index);
        debug!(index, row, "Target row resolved");

        let mut writes = Vec::with_capacity(values.len());
        let mut updated_fields = Vec::new();
        let mut skipped_fields = Vec::new();
        for (field, value) in values {
            match mapper::column_of(&field, &header) {
                0 => skipped_fields.push(field),
                col => {
                    writes.push(CellWrite {
                        range: self.range.cell(row, col as u32),
                        value,
                    });
                    updated_fields.push(field);
                }
            }
        }

        if writes.is_empty() {
            return Err(StoreError::validation("None of the provided fields match a column")
                .with_details(json!({ "skippedFields": skipped_fields })));
        }
        if !skipped_fields.is_empty() {
            warn!(fields = ?skipped_fields, "Fields without a column were skipped");
        }

        let outcome = self.backend.write_cells(writes).await?;
        Ok(UpdateOutcome {
            updated_fields,
            skipped_fields,
            rows_updated: outcome.total_updated_rows,
            cells_updated: outcome.total_updated_cells,
            row,
        })
    }

    async fn try_delete(&self, col_name: &str, id: &CellValue) -> Result<DeleteOutcome> {
        let column = col_name.to_lowercase();
        let mut records = self.fetch_records().await?;
        let index = address::find_row(&records, &column, id)?;
        let row = self.range.absolute_row(index);

        let outcome = self.backend.clear_range(&self.range.row_range(row)).await?;
        debug!(row, range = %outcome.cleared_range, "Row cleared");

        Ok(DeleteOutcome {
            deleted_record: to_display(records.swap_remove(index)),
            cleared_range: outcome.cleared_range,
            row_deleted: row,
        })
    }

    async fn try_find(&self, key: &str, value: &CellValue) -> Result<Vec<Record>> {
        let key = key.to_lowercase();
        let found: Vec<Record> = self
            .fetch_records()
            .await?
            .into_iter()
            .filter(|r| !r.is_blank())
            .filter(|r| r.get(&key).is_some_and(|v| v.loose_eq(value)))
            .map(to_display)
            .collect();
        if found.is_empty() {
            return Err(StoreError::not_found(format!("No record with {} = {}", key, value))
                .with_details(json!({ "key": key, "value": value })));
        }
        Ok(found)
    }
}

impl std::fmt::Debug for SheetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetStore")
            .field("range", &self.range)
            .field("source_id", &self.backend.source_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryGrid;

    fn store() -> (Arc<MemoryGrid>, SheetStore) {
        let backend = Arc::new(MemoryGrid::new("book-1").with_sheet(
            "S",
            &[&["id", "name", "active"], &["1", "Ana", "TRUE"], &["2", "Bob", "FALSE"]],
        ));
        let store = SheetStore::new(SheetConfig::new("S"), backend.clone()).unwrap();
        (backend, store)
    }

    #[test]
    fn test_max_id() {
        let records: Vec<Record> = vec![
            [("id", CellValue::from(3))].into_iter().collect(),
            [("id", CellValue::from("10"))].into_iter().collect(),
            [("id", CellValue::from("x"))].into_iter().collect(),
            [("name", CellValue::from("no id"))].into_iter().collect(),
        ];
        assert_eq!(max_id(&records), 10);
        assert_eq!(max_id(&[]), 0);
    }

    #[test]
    fn test_next_id_stops_at_limit() {
        let records: Vec<Record> = vec![[("id", CellValue::from(4))].into_iter().collect()];
        assert_eq!(next_id(&records).unwrap(), 5);
        assert_eq!(next_id(&[]).unwrap(), 1);

        let records: Vec<Record> = vec![[("id", CellValue::from(i64::MAX))].into_iter().collect()];
        let err = next_id(&records).unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new("bang".to_string())), "bang");
        assert_eq!(panic_message(Box::new(7)), "operation panicked");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let backend = Arc::new(MemoryGrid::new("b"));
        assert!(SheetStore::new(SheetConfig::new("S").row_head(0), backend).is_err());
    }

    async fn explode() -> Result<()> {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn test_guard_converts_panics() {
        let (_, store) = store();
        let env = store.guard("explode", HttpStatus::OK, "never", explode()).await;
        let error = env.error.unwrap();
        assert_eq!(error.kind, ouroboros_common::ErrorKind::Internal);
        assert_eq!(error.code, 500);
        let details = error.details.unwrap();
        assert_eq!(details["operation"], "explode");
        assert_eq!(details["sheetId"], "book-1");
    }

    #[tokio::test]
    async fn test_update_targets_row_after_header() {
        let (backend, store) = store();
        let values: Record = [("name", "Bobby")].into_iter().collect();
        let env = store.update(UpdateRequest::new("id", 2, values)).await;
        let outcome = env.into_result().unwrap();
        assert_eq!(outcome.row, 3);
        assert_eq!(backend.cell("S", 3, 2), Some(CellValue::from("Bobby")));
    }
}
