//! Error types for the ouroboros sheet store

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::status::HttpStatus;

/// Result type alias for sheet store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error taxonomy reported in failure envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Bad or missing caller input
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// Backend requires a fresh login
    #[serde(rename = "AUTHENTICATION_ERROR")]
    Authentication,
    /// Backend denied access
    #[serde(rename = "PERMISSION_ERROR")]
    Permission,
    /// No matching record, header, sheet or range
    #[serde(rename = "NOT_FOUND_ERROR")]
    NotFound,
    /// Call failed without a structured backend error
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    /// Generic error reported by the spreadsheet API
    #[serde(rename = "GOOGLE_API_ERROR")]
    GoogleApi,
    /// Anything else
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
}

impl ErrorKind {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Permission => "PERMISSION_ERROR",
            Self::NotFound => "NOT_FOUND_ERROR",
            Self::Network => "NETWORK_ERROR",
            Self::GoogleApi => "GOOGLE_API_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for all sheet store operations
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("Not found: {message}")]
    NotFound {
        message: String,
        details: Option<Value>,
    },

    /// Structured error reported by the grid backend, carrying its numeric code.
    #[error("Backend error {code}: {message}")]
    Api {
        code: u16,
        message: String,
        status: Option<String>,
    },

    /// Backend call failed before a structured error could be read.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Outcome of classifying a [`StoreError`] for an envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub kind: ErrorKind,
    pub status: HttpStatus,
    pub message: String,
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        StoreError::NotFound {
            message: message.into(),
            details: None,
        }
    }

    /// Attach structured details to a validation or not-found error.
    ///
    /// Other variants already carry everything they report and are returned as-is.
    pub fn with_details(self, value: Value) -> Self {
        match self {
            StoreError::Validation { message, .. } => StoreError::Validation {
                message,
                details: Some(value),
            },
            StoreError::NotFound { message, .. } => StoreError::NotFound {
                message,
                details: Some(value),
            },
            other => other,
        }
    }

    /// Details supplied by the code that raised the error, if any.
    pub fn details(&self) -> Option<&Value> {
        match self {
            StoreError::Validation { details, .. } | StoreError::NotFound { details, .. } => {
                details.as_ref()
            }
            _ => None,
        }
    }

    /// Returns true if the error originated in the grid backend.
    pub fn is_backend(&self) -> bool {
        matches!(self, StoreError::Api { .. } | StoreError::Network(_))
    }

    /// Returns true if retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Network(_) => true,
            StoreError::Api { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    /// Map this error onto the envelope taxonomy.
    ///
    /// `operation` names the failing call and appears in network messages.
    pub fn classify(&self, operation: &str) -> Classified {
        let (kind, status, message) = match self {
            StoreError::Validation { message, .. } => {
                (ErrorKind::Validation, HttpStatus::BAD_REQUEST, message.clone())
            }
            StoreError::NotFound { message, .. } => {
                (ErrorKind::NotFound, HttpStatus::NOT_FOUND, message.clone())
            }
            StoreError::Api { code, message, .. } => match code {
                400 => (
                    ErrorKind::Validation,
                    HttpStatus::BAD_REQUEST,
                    format!("Invalid request: {}", message),
                ),
                401 => (
                    ErrorKind::Authentication,
                    HttpStatus::UNAUTHORIZED,
                    "Authentication required. Please login again.".to_string(),
                ),
                403 => (
                    ErrorKind::Permission,
                    HttpStatus::FORBIDDEN,
                    "Permission denied. Check sheet permissions.".to_string(),
                ),
                404 => (
                    ErrorKind::NotFound,
                    HttpStatus::NOT_FOUND,
                    "Sheet or range not found.".to_string(),
                ),
                429 => (
                    ErrorKind::GoogleApi,
                    HttpStatus::SERVICE_UNAVAILABLE,
                    "Rate limit exceeded. Please try again later.".to_string(),
                ),
                _ => (
                    ErrorKind::GoogleApi,
                    HttpStatus::INTERNAL_SERVER_ERROR,
                    format!("Google API error: {}", message),
                ),
            },
            StoreError::Network(_) => (
                ErrorKind::Network,
                HttpStatus::INTERNAL_SERVER_ERROR,
                format!("Network error during {}", operation),
            ),
            StoreError::Serialization(_) | StoreError::Internal(_) => (
                ErrorKind::Internal,
                HttpStatus::INTERNAL_SERVER_ERROR,
                self.to_string(),
            ),
        };
        Classified {
            kind,
            status,
            message,
        }
    }

    /// The raw backend error, kept for diagnostics in failure details.
    pub fn original_error(&self) -> Option<Value> {
        match self {
            StoreError::Api {
                code,
                message,
                status,
            } => Some(json!({
                "code": code,
                "message": message,
                "status": status,
            })),
            StoreError::Network(message) => Some(json!({ "message": message })),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: u16) -> StoreError {
        StoreError::Api {
            code,
            message: "boom".to_string(),
            status: None,
        }
    }

    #[test]
    fn test_error_display_validation() {
        let err = StoreError::validation("field required");
        assert_eq!(err.to_string(), "Validation error: field required");
    }

    #[test]
    fn test_error_display_not_found() {
        let err = StoreError::not_found("no row with id 7");
        assert_eq!(err.to_string(), "Not found: no row with id 7");
    }

    #[test]
    fn test_error_display_api() {
        assert_eq!(api(403).to_string(), "Backend error 403: boom");
    }

    #[test]
    fn test_error_display_network() {
        let err = StoreError::Network("connection reset".to_string());
        assert_eq!(err.to_string(), "Network error: connection reset");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn test_with_details() {
        let err = StoreError::not_found("missing").with_details(json!({"id": 3}));
        assert_eq!(err.details(), Some(&json!({"id": 3})));

        let err = StoreError::Internal("x".to_string()).with_details(json!({"id": 3}));
        assert!(err.details().is_none());
    }

    #[test]
    fn test_classify_backend_codes() {
        let cases = [
            (400, ErrorKind::Validation, 400),
            (401, ErrorKind::Authentication, 401),
            (403, ErrorKind::Permission, 403),
            (404, ErrorKind::NotFound, 404),
            (429, ErrorKind::GoogleApi, 503),
            (500, ErrorKind::GoogleApi, 500),
            (502, ErrorKind::GoogleApi, 500),
        ];
        for (code, kind, status) in cases {
            let classified = api(code).classify("read");
            assert_eq!(classified.kind, kind, "code {}", code);
            assert_eq!(classified.status.code(), status, "code {}", code);
        }
    }

    #[test]
    fn test_classify_messages() {
        assert_eq!(api(400).classify("read").message, "Invalid request: boom");
        assert_eq!(api(500).classify("read").message, "Google API error: boom");
        assert_eq!(
            api(429).classify("read").message,
            "Rate limit exceeded. Please try again later."
        );
        let network = StoreError::Network("reset".to_string()).classify("insert");
        assert_eq!(network.kind, ErrorKind::Network);
        assert_eq!(network.status, HttpStatus::INTERNAL_SERVER_ERROR);
        assert_eq!(network.message, "Network error during insert");
    }

    #[test]
    fn test_classify_local_errors() {
        let c = StoreError::validation("empty").classify("update");
        assert_eq!((c.kind, c.status), (ErrorKind::Validation, HttpStatus::BAD_REQUEST));
        let c = StoreError::not_found("gone").classify("update");
        assert_eq!((c.kind, c.status), (ErrorKind::NotFound, HttpStatus::NOT_FOUND));
        let c = StoreError::Internal("bug".to_string()).classify("update");
        assert_eq!(c.kind, ErrorKind::Internal);
        assert_eq!(c.message, "Internal error: bug");
    }

    #[test]
    fn test_is_retryable() {
        assert!(StoreError::Network("x".to_string()).is_retryable());
        assert!(api(429).is_retryable());
        assert!(api(503).is_retryable());
        assert!(!api(403).is_retryable());
        assert!(!StoreError::validation("x").is_retryable());
    }

    #[test]
    fn test_original_error() {
        let original = api(404).original_error().unwrap();
        assert_eq!(original["code"], 404);
        assert!(StoreError::validation("x").original_error().is_none());
        assert!(StoreError::Network("x".to_string()).is_backend());
    }

    #[test]
    fn test_error_kind_wire_names() {
        assert_eq!(
            serde_json::to_value(ErrorKind::NotFound).unwrap(),
            json!("NOT_FOUND_ERROR")
        );
        assert_eq!(ErrorKind::GoogleApi.to_string(), "GOOGLE_API_ERROR");
    }
}
