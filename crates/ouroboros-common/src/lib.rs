//! Common utilities for ouroboros
//!
//! This crate provides the error taxonomy and status codes shared by the
//! sheet store, its grid backends and the command line front end.

pub mod error;
pub mod status;

pub use error::{Classified, ErrorKind, Result, StoreError};
pub use status::HttpStatus;
