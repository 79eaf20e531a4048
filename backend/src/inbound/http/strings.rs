//! String table API handlers.
//!
//! ```text
//! GET    /api/v1/projects/{projectId}/apps/{appId}/strings?page&limit
//! POST   /api/v1/projects/{projectId}/apps/{appId}/strings
//! POST   /api/v1/projects/{projectId}/apps/{appId}/strings/reset
//! PUT    /api/v1/projects/{projectId}/apps/{appId}/strings/{stringId}
//! DELETE /api/v1/projects/{projectId}/apps/{appId}/strings/{stringId}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{CreateStringRequest, UpdateStringRequest};
use crate::domain::{
    AdditionalColumns, AppScope, Caller, Error, PageRequest, StringEdit, StringId, StringKey,
    StringValue,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::{Deleted, Envelope, ResetSummary};
use crate::inbound::http::schemas::{ErrorSchema, StringItemSchema, StringPageSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    APP_ID, AppPath, FieldName, PROJECT_ID, optional_field, parse_id, required_text,
};

const KEY: FieldName = FieldName::new("key");
const VALUE: FieldName = FieldName::new("value");
const STRING_ID: FieldName = FieldName::new("stringId");

/// Paging parameters for the string listing.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListStringsQuery {
    /// 1-based page number; defaults to 1.
    pub page: Option<u32>,
    /// Page size, clamped to 1..=10000; defaults to 50.
    pub limit: Option<u32>,
}

/// Request body for `POST .../strings`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStringBody {
    #[schema(example = "welcome_message")]
    pub key: Option<String>,
    #[schema(example = "Welcome!")]
    pub value: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub additional_columns: Option<AdditionalColumns>,
}

/// Request body for `PUT .../strings/{stringId}`. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStringBody {
    pub key: Option<String>,
    pub value: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub additional_columns: Option<AdditionalColumns>,
}

/// `.../strings/{stringId}` path parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StringPath {
    project_id: String,
    app_id: String,
    string_id: String,
}

impl StringPath {
    fn parse(&self) -> Result<(AppScope, StringId), Error> {
        let scope = AppScope::new(
            parse_id(&self.project_id, PROJECT_ID)?,
            parse_id(&self.app_id, APP_ID)?,
        );
        Ok((scope, parse_id(&self.string_id, STRING_ID)?))
    }
}

/// List an app's strings, one page at a time. Requires viewer.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{projectId}/apps/{appId}/strings",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("appId" = i64, Path, description = "App id"),
        ListStringsQuery
    ),
    responses(
        (status = 200, description = "Page of strings", body = Envelope<StringPageSchema>),
        (status = 400, description = "Invalid id or paging", body = ErrorSchema),
        (status = 403, description = "Not a member", body = ErrorSchema),
        (status = 404, description = "Unknown app or wrong project", body = ErrorSchema)
    ),
    tags = ["strings"],
    operation_id = "listStrings"
)]
#[get("/projects/{projectId}/apps/{appId}/strings")]
pub async fn list_strings(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<AppPath>,
    query: web::Query<ListStringsQuery>,
) -> ApiResult<HttpResponse> {
    let scope = path.scope()?;
    let ListStringsQuery { page, limit } = query.into_inner();
    let page = state
        .strings_query
        .list_strings(caller, scope, PageRequest::new(page, limit))
        .await?;
    Ok(Envelope::new(page).ok())
}

/// Add a string. It starts pending as `new`. Requires member.
#[utoipa::path(
    post,
    path = "/api/v1/projects/{projectId}/apps/{appId}/strings",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("appId" = i64, Path, description = "App id")
    ),
    request_body = CreateStringBody,
    responses(
        (status = 201, description = "String created", body = Envelope<StringItemSchema>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Insufficient role", body = ErrorSchema),
        (status = 404, description = "Unknown app or wrong project", body = ErrorSchema)
    ),
    tags = ["strings"],
    operation_id = "createString"
)]
#[post("/projects/{projectId}/apps/{appId}/strings")]
pub async fn create_string(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<AppPath>,
    payload: web::Json<CreateStringBody>,
) -> ApiResult<HttpResponse> {
    let scope = path.scope()?;
    let CreateStringBody {
        key,
        value,
        additional_columns,
    } = payload.into_inner();
    let item = state
        .strings
        .create_string(CreateStringRequest {
            caller,
            scope,
            key: required_text(key, KEY, StringKey::new)?,
            value: required_text(value, VALUE, StringValue::new)?,
            additional_columns: additional_columns.unwrap_or_default(),
        })
        .await?;
    Ok(Envelope::new(item).created())
}

/// Clear every pending marker of an app without publishing. Requires member.
#[utoipa::path(
    post,
    path = "/api/v1/projects/{projectId}/apps/{appId}/strings/reset",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("appId" = i64, Path, description = "App id")
    ),
    responses(
        (status = 200, description = "Pending markers cleared", body = Envelope<ResetSummary>),
        (status = 403, description = "Insufficient role", body = ErrorSchema),
        (status = 404, description = "Unknown app or wrong project", body = ErrorSchema)
    ),
    tags = ["strings"],
    operation_id = "resetPendingStrings"
)]
#[post("/projects/{projectId}/apps/{appId}/strings/reset")]
pub async fn reset_pending(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<AppPath>,
) -> ApiResult<HttpResponse> {
    let cleared = state.strings.reset_pending(caller, path.scope()?).await?;
    Ok(Envelope::new(ResetSummary { cleared })
        .with_message(format!("cleared {cleared} pending strings"))
        .ok())
}

/// Edit a string. A `new` string stays `new`; anything else becomes
/// `modified`. Requires member.
#[utoipa::path(
    put,
    path = "/api/v1/projects/{projectId}/apps/{appId}/strings/{stringId}",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("appId" = i64, Path, description = "App id"),
        ("stringId" = i64, Path, description = "String id")
    ),
    request_body = UpdateStringBody,
    responses(
        (status = 200, description = "String updated", body = Envelope<StringItemSchema>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Insufficient role", body = ErrorSchema),
        (status = 404, description = "Unknown string", body = ErrorSchema)
    ),
    tags = ["strings"],
    operation_id = "updateString"
)]
#[put("/projects/{projectId}/apps/{appId}/strings/{stringId}")]
pub async fn update_string(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<StringPath>,
    payload: web::Json<UpdateStringBody>,
) -> ApiResult<HttpResponse> {
    let (scope, string_id) = path.parse()?;
    let UpdateStringBody {
        key,
        value,
        additional_columns,
    } = payload.into_inner();
    let edit = StringEdit {
        key: optional_field(key, StringKey::new)?,
        value: optional_field(value, StringValue::new)?,
        additional_columns,
    };
    let item = state
        .strings
        .update_string(UpdateStringRequest {
            caller,
            scope,
            string_id,
            edit,
        })
        .await?;
    Ok(Envelope::new(item).ok())
}

/// Delete a string. Requires member.
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{projectId}/apps/{appId}/strings/{stringId}",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("appId" = i64, Path, description = "App id"),
        ("stringId" = i64, Path, description = "String id")
    ),
    responses(
        (status = 200, description = "String deleted", body = Envelope<Deleted>),
        (status = 403, description = "Insufficient role", body = ErrorSchema),
        (status = 404, description = "Unknown string", body = ErrorSchema)
    ),
    tags = ["strings"],
    operation_id = "deleteString"
)]
#[delete("/projects/{projectId}/apps/{appId}/strings/{stringId}")]
pub async fn delete_string(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<StringPath>,
) -> ApiResult<HttpResponse> {
    let (scope, string_id) = path.parse()?;
    state.strings.delete_string(caller, scope, string_id).await?;
    Ok(Envelope::new(Deleted { deleted: true }).ok())
}

#[cfg(test)]
#[path = "strings_tests.rs"]
mod tests;
