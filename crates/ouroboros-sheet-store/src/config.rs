//! Sheet store configuration

use ouroboros_common::{Result, StoreError};

use crate::address::RangeDescriptor;

/// Configuration for one sheet-backed record store
#[derive(Debug, Clone, PartialEq)]
pub struct SheetConfig {
    /// Name of the sheet (tab) holding the records
    pub sheet_name: String,

    /// 1-based row number of the header row
    pub row_head: u32,

    /// Free-form description, shown in logs
    pub description: Option<String>,

    /// Fields that must be present and non-empty on insert
    pub required_fields: Vec<String>,
}

impl SheetConfig {
    /// Create a config for `sheet_name` with the header on row 1
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            row_head: 1,
            description: None,
            required_fields: Vec::new(),
        }
    }

    /// Set the header row
    pub fn row_head(mut self, row_head: u32) -> Self {
        self.row_head = row_head;
        self
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Require these fields on insert (names are matched case-insensitively)
    pub fn required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(|f| f.into().to_lowercase()).collect();
        self
    }

    /// Check the config can address a sheet
    pub fn validate(&self) -> Result<()> {
        if self.sheet_name.trim().is_empty() {
            return Err(StoreError::validation("Sheet name must not be empty"));
        }
        if self.row_head == 0 {
            return Err(StoreError::validation("Header row is 1-based and must be at least 1"));
        }
        Ok(())
    }

    /// Range descriptor derived from this config
    pub fn range_descriptor(&self) -> RangeDescriptor {
        RangeDescriptor::new(self.sheet_name.clone(), self.row_head)
    }
}
