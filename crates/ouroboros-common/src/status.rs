//! Status codes carried by store envelopes.
//!
//! Envelopes travel over no particular transport; the codes follow HTTP
//! numbering so that callers relaying them over HTTP can pass them through.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HttpStatus(pub u16);

impl HttpStatus {
    pub const OK: Self = Self(200);
    pub const CREATED: Self = Self(201);
    pub const BAD_REQUEST: Self = Self(400);
    pub const UNAUTHORIZED: Self = Self(401);
    pub const FORBIDDEN: Self = Self(403);
    pub const NOT_FOUND: Self = Self(404);
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);
    /// Reported for backend rate limiting, so callers know to back off.
    pub const SERVICE_UNAVAILABLE: Self = Self(503);

    pub fn code(self) -> u16 {
        self.0
    }

    /// 2xx
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for HttpStatus {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(HttpStatus::OK.is_success());
        assert!(HttpStatus::CREATED.is_success());
        assert!(!HttpStatus::NOT_FOUND.is_success());
        assert!(!HttpStatus::SERVICE_UNAVAILABLE.is_success());
    }

    #[test]
    fn test_code_and_display() {
        assert_eq!(HttpStatus::from(403), HttpStatus::FORBIDDEN);
        assert_eq!(HttpStatus::FORBIDDEN.code(), 403);
        assert_eq!(HttpStatus::CREATED.to_string(), "201");
        assert_eq!(serde_json::to_value(HttpStatus::OK).unwrap(), serde_json::json!(200));
    }
}
