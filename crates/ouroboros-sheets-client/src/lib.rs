//! ouroboros-sheets-client: Google Sheets v4 backend
//!
//! Connects `ouroboros-sheet-store` to a hosted spreadsheet through the
//! values API, using a pooled reqwest client with bearer-token auth.
//!
//! # Architecture
//!
//! - `SheetsClient`: typed wrappers for `values.get`, `values.append`,
//!   `values.batchUpdate` and `values.clear`
//! - `GoogleSheetsBackend`: the store's `GridBackend` on top of the client
//! - `SheetsClientError`: transport and API failures, converted into
//!   `StoreError` with secrets stripped from messages

pub mod backend;
pub mod client;
pub mod config;
pub mod error;

pub use backend::GoogleSheetsBackend;
pub use client::SheetsClient;
pub use config::{SheetsClientConfig, DEFAULT_BASE_URL};
pub use error::{sanitize_error_message, SheetsClientError, SheetsResult};
