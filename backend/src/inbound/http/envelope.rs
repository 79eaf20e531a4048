//! Success envelope wrapping every JSON payload.

use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

/// `{ "success": true, "data": ..., "message"? }` response body.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// Always `true`; failures use the error body instead.
    pub success: bool,
    /// Operation result.
    pub data: T,
    /// Optional human-readable summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    /// Wrap `data` without a message.
    pub const fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    /// Attach a message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// `200 OK` with this envelope.
    pub fn ok(self) -> HttpResponse {
        HttpResponse::Ok().json(self)
    }

    /// `201 Created` with this envelope.
    pub fn created(self) -> HttpResponse {
        HttpResponse::Created().json(self)
    }
}

/// Payload of mutations that return no record.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    /// Always `true`.
    pub deleted: bool,
}

/// Payload of the pending-status reset.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetSummary {
    /// Number of strings whose pending marker was cleared.
    pub cleared: u64,
}
