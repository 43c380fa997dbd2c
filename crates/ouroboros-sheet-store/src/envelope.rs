//! Uniform success/error envelope returned by every store operation.

use chrono::{SecondsFormat, Utc};
use ouroboros_common::{ErrorKind, HttpStatus, StoreError};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::record::Record;

/// Error half of a failed [`Envelope`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<Value>,
    pub code: u16,
}

/// `{ success, status, message, data, error, timestamp }`
///
/// On success `error` is `None`; on failure `data` is `None`. Nothing else
/// signals failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
    pub timestamp: String,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl<T> Envelope<T> {
    /// 200 `"Success"` envelope.
    pub fn success(data: T) -> Self {
        Self::success_with(data, HttpStatus::OK, "Success")
    }

    pub fn success_with(data: T, status: HttpStatus, message: impl Into<String>) -> Self {
        Self {
            success: status.is_success(),
            status: status.code(),
            message: message.into(),
            data: Some(data),
            error: None,
            timestamp: now(),
        }
    }

    pub fn failure(
        message: impl Into<String>,
        status: HttpStatus,
        kind: ErrorKind,
        details: Option<Value>,
    ) -> Self {
        Self {
            success: false,
            status: status.code(),
            message: "Error".to_string(),
            data: None,
            error: Some(ErrorBody {
                kind,
                message: message.into(),
                details,
                code: status.code(),
            }),
            timestamp: now(),
        }
    }

    /// Classifies `err` and builds a failure envelope.
    ///
    /// `context` (operation, sheet identifiers, ...) seeds `details`; details
    /// carried by the error itself are merged on top and backend errors are
    /// preserved under `originalError`.
    pub fn from_error(err: &StoreError, operation: &str, context: Map<String, Value>) -> Self {
        let classified = err.classify(operation);
        let mut details = context;
        details
            .entry("operation")
            .or_insert_with(|| Value::String(operation.to_string()));
        match err.details() {
            Some(Value::Object(extra)) => {
                details.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Some(other) => {
                details.insert("info".to_string(), other.clone());
            }
            None => {}
        }
        if let Some(original) = err.original_error() {
            details.insert("originalError".to_string(), original);
        }
        Self::failure(
            classified.message,
            classified.status,
            classified.kind,
            Some(Value::Object(details)),
        )
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Converts into a plain `Result`, for callers that prefer `?`.
    pub fn into_result(self) -> Result<T, ErrorBody> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(error)) => Err(error),
            (None, None) => Err(ErrorBody {
                kind: ErrorKind::Internal,
                message: "Envelope carried neither data nor error".to_string(),
                details: None,
                code: HttpStatus::INTERNAL_SERVER_ERROR.code(),
            }),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            success: self.success,
            status: self.status,
            message: self.message,
            data: self.data.map(f),
            error: self.error,
            timestamp: self.timestamp,
        }
    }
}

/// Fails with a validation envelope when any of `fields` is missing, null
/// or empty in `record`.
pub fn validate_required_fields<T>(record: &Record, fields: &[String]) -> Option<Envelope<T>> {
    let missing = missing_fields(record, fields);
    if missing.is_empty() {
        return None;
    }
    Some(Envelope::failure(
        format!("Missing required fields: {}", missing.join(", ")),
        HttpStatus::BAD_REQUEST,
        ErrorKind::Validation,
        Some(json!({ "missingFields": missing })),
    ))
}

pub(crate) fn missing_fields(record: &Record, fields: &[String]) -> Vec<String> {
    fields
        .iter()
        .filter(|field| record.get(field).map_or(true, |value| value.is_empty()))
        .cloned()
        .collect()
}
