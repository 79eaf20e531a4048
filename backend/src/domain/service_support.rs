//! Shared helpers for domain services: port error mapping and input checks.

use serde_json::json;
use tracing::error;

use crate::domain::ports::{RecordStoreError, SnapshotArchiveError};
use crate::domain::{Error, TextValidationError};

/// Map a record store failure to a caller-facing domain error.
///
/// Backend detail is logged here and never copied into the returned error.
pub(crate) fn map_store_error(error: RecordStoreError) -> Error {
    match error {
        RecordStoreError::Connection { message } => {
            error!(%message, "record store unavailable");
            Error::service_unavailable("record store unavailable")
        }
        RecordStoreError::Query { message } => {
            error!(%message, "record store query failed");
            Error::internal("record store error")
        }
        RecordStoreError::Serialization { message } => {
            error!(%message, "record store serialization failed");
            Error::internal("record store error")
        }
        RecordStoreError::Conflict { message } => Error::conflict(message),
    }
}

/// Describe a snapshot archive failure for logging.
pub(crate) fn describe_archive_error(error: &SnapshotArchiveError) -> &'static str {
    match error {
        SnapshotArchiveError::QuotaExceeded { .. } => "quota_exceeded",
        SnapshotArchiveError::Serialization { .. } => "serialization",
        SnapshotArchiveError::Backend { .. } => "backend",
    }
}

/// Map a text validation failure to an invalid-request error naming the field.
pub fn validation_error(error: &TextValidationError) -> Error {
    let code = match error {
        TextValidationError::Empty { .. } => "missing_field",
        TextValidationError::Malformed { .. } => "malformed_field",
    };
    Error::invalid_request(error.to_string()).with_details(json!({
        "field": error.field(),
        "code": code,
    }))
}

/// Convert an absent record into a not-found error.
pub(crate) fn found<T>(record: Option<T>, what: &str, id: impl std::fmt::Display) -> Result<T, Error> {
    record.ok_or_else(|| Error::not_found(format!("{what} {id} not found")))
}
