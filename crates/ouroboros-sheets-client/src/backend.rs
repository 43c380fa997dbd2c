//! [`GridBackend`] implementation over the Sheets values API.

use async_trait::async_trait;
use ouroboros_common::{Result, StoreError};
use ouroboros_sheet_store::{
    AppendOutcome, CellValue, CellWrite, ClearOutcome, Grid, GridBackend, GridRange, WriteOutcome,
};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::client::{SheetsClient, ValueRange};
use crate::config::SheetsClientConfig;

/// Grid backend talking to one hosted spreadsheet.
#[derive(Debug, Clone)]
pub struct GoogleSheetsBackend {
    client: SheetsClient,
}

/// Cell payload for a user-entered write. Empty cells are sent as `""` so
/// that they overwrite; a JSON null would leave the cell unchanged.
fn to_wire(value: CellValue) -> Value {
    match value {
        CellValue::Empty => Value::String(String::new()),
        other => other.into(),
    }
}

impl GoogleSheetsBackend {
    pub fn new(client: SheetsClient) -> Self {
        Self { client }
    }

    /// Builds the HTTP client from `config`.
    pub fn from_config(config: SheetsClientConfig) -> Result<Self> {
        Ok(Self::new(SheetsClient::new(config)?))
    }

    pub fn client(&self) -> &SheetsClient {
        &self.client
    }
}

#[async_trait]
impl GridBackend for GoogleSheetsBackend {
    fn source_id(&self) -> &str {
        self.client.spreadsheet_id()
    }

    #[instrument(skip(self), fields(range = %range))]
    async fn read_range(&self, range: &GridRange) -> Result<Grid> {
        let response = self.client.get_values(&range.to_string()).await?;
        let grid: Grid = response
            .values
            .into_iter()
            .map(|row| row.into_iter().map(CellValue::from).collect())
            .collect();
        debug!(rows = grid.len(), "Range read");
        Ok(grid)
    }

    #[instrument(skip(self, row), fields(range = %range, cells = row.len()))]
    async fn append_row(&self, range: &GridRange, row: Vec<CellValue>) -> Result<AppendOutcome> {
        let values = vec![row.into_iter().map(to_wire).collect()];
        let response = self.client.append_values(&range.to_string(), values).await?;
        let updates = response.updates.ok_or_else(|| {
            StoreError::Serialization("append response carried no updates".to_string())
        })?;
        Ok(AppendOutcome {
            updated_range: updates.updated_range.unwrap_or_default(),
            updated_rows: updates.updated_rows.unwrap_or(0),
        })
    }

    #[instrument(skip(self, writes), fields(cells = writes.len()))]
    async fn write_cells(&self, writes: Vec<CellWrite>) -> Result<WriteOutcome> {
        let data = writes
            .into_iter()
            .map(|write| ValueRange {
                range: Some(write.range.to_string()),
                major_dimension: None,
                values: vec![vec![to_wire(write.value)]],
            })
            .collect();
        let response = self.client.batch_update_values(data).await?;
        Ok(WriteOutcome {
            total_updated_rows: response.total_updated_rows.unwrap_or(0),
            total_updated_cells: response.total_updated_cells.unwrap_or(0),
        })
    }

    #[instrument(skip(self), fields(range = %range))]
    async fn clear_range(&self, range: &GridRange) -> Result<ClearOutcome> {
        let requested = range.to_string();
        let response = self.client.clear_values(&requested).await?;
        Ok(ClearOutcome {
            cleared_range: response.cleared_range.unwrap_or(requested),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_wire() {
        assert_eq!(to_wire(CellValue::Empty), json!(""));
        assert_eq!(to_wire(CellValue::Bool(false)), json!(false));
        assert_eq!(to_wire(CellValue::from(3)), json!(3));
        assert_eq!(to_wire(CellValue::from("2024-01-02")), json!("2024-01-02"));
    }
}
