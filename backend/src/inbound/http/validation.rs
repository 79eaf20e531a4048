//! Shared validation helpers for inbound HTTP adapters.
//!
//! Path segments arrive as strings so that a malformed id becomes a
//! structured `400 invalid_request` instead of actix's plain-text 404.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::json;

use crate::domain::{
    AppId, AppScope, Error, ProjectId, RecordIdParseError, TextValidationError, validation_error,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidId,
    InvalidRole,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidId => "invalid_id",
            ErrorCode::InvalidRole => "invalid_role",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

fn field_error(field: FieldName, message: String, code: ErrorCode, value: Option<&str>) -> Error {
    let details = match value {
        Some(value) => json!({ "field": field.as_str(), "value": value, "code": code.as_str() }),
        None => json!({ "field": field.as_str(), "code": code.as_str() }),
    };
    Error::invalid_request(message).with_details(details)
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    field_error(
        field,
        format!("missing required field: {}", field.as_str()),
        ErrorCode::MissingField,
        None,
    )
}

pub(crate) fn invalid_role_error(field: FieldName, value: &str) -> Error {
    field_error(
        field,
        format!("{} must be one of viewer, member, admin, owner", field.as_str()),
        ErrorCode::InvalidRole,
        Some(value),
    )
}

/// Parse a positive record id from a path segment.
pub(crate) fn parse_id<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr<Err = RecordIdParseError>,
{
    value.parse().map_err(|_| {
        field_error(
            field,
            format!("{} must be a positive integer", field.as_str()),
            ErrorCode::InvalidId,
            Some(value),
        )
    })
}

/// Validate a required text field with the matching domain constructor.
pub(crate) fn required_text<T>(
    value: Option<String>,
    field: FieldName,
    parse: impl FnOnce(String) -> Result<T, TextValidationError>,
) -> Result<T, Error> {
    let value = value.ok_or_else(|| missing_field_error(field))?;
    parse(value).map_err(|err| validation_error(&err))
}

/// Validate an optional text field; absent stays absent.
pub(crate) fn optional_field<T>(
    value: Option<String>,
    parse: impl FnOnce(String) -> Result<T, TextValidationError>,
) -> Result<Option<T>, Error> {
    value
        .map(parse)
        .transpose()
        .map_err(|err| validation_error(&err))
}

pub(crate) const PROJECT_ID: FieldName = FieldName::new("projectId");
pub(crate) const APP_ID: FieldName = FieldName::new("appId");

/// `/projects/{projectId}` path parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectPath {
    project_id: String,
}

impl ProjectPath {
    pub(crate) fn project_id(&self) -> Result<ProjectId, Error> {
        parse_id(&self.project_id, PROJECT_ID)
    }
}

/// `/projects/{projectId}/apps/{appId}` path parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppPath {
    project_id: String,
    app_id: String,
}

impl AppPath {
    pub(crate) fn scope(&self) -> Result<AppScope, Error> {
        Ok(AppScope::new(
            parse_id(&self.project_id, PROJECT_ID)?,
            parse_id::<AppId>(&self.app_id, APP_ID)?,
        ))
    }
}
