//! Row-oriented record store on top of a remote spreadsheet grid.
//!
//! A sheet with a header row is treated as a table: each data row becomes a
//! [`Record`] keyed by the lower-cased header names. The store reads, filters,
//! inserts, updates, soft-deletes and hard-deletes records, and reports every
//! outcome as a uniform [`Envelope`].
//!
//! # Architecture
//!
//! ```text
//!        SheetStore (store.rs)          facade, envelopes, logging
//!            |
//!   filter / address / mapper / date    pure record logic
//!            |
//!        GridBackend (backend/)         read / append / write / clear
//!            |
//!   MemoryGrid | GoogleSheetsBackend    (ouroboros-sheets-client)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ouroboros_sheet_store::{Filter, MemoryGrid, ReadQuery, SheetConfig, SheetStore};
//!
//! let grid = MemoryGrid::new("book-1")
//!     .with_sheet("Clientes", &[&["id", "name"], &["1", "Ana"]]);
//! let store = SheetStore::new(SheetConfig::new("Clientes"), Arc::new(grid))?;
//!
//! let env = store.read(ReadQuery::new().filter(Filter::new("name", "Ana"))).await;
//! assert!(env.success);
//! ```

pub mod address;
pub mod backend;
pub mod config;
pub mod date;
pub mod envelope;
pub mod filter;
pub mod mapper;
pub mod params;
pub mod record;
pub mod store;
pub mod value;

pub use address::{GridRange, RangeDescriptor};
pub use backend::{
    AppendOutcome, BackendCall, CellWrite, ClearOutcome, GridBackend, MemoryGrid, WriteOutcome,
};
pub use config::SheetConfig;
pub use date::DateDirection;
pub use envelope::{validate_required_fields, Envelope, ErrorBody};
pub use filter::{Filter, Operator, Selection};
pub use mapper::Grid;
pub use params::{
    DeleteOutcome, InsertOutcome, InsertRequest, ReadQuery, UpdateOutcome, UpdateRequest, User,
};
pub use record::Record;
pub use store::SheetStore;
pub use value::CellValue;

pub use ouroboros_common::{ErrorKind, HttpStatus, Result, StoreError};
