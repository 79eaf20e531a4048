//! Driving port for string table mutations.

use async_trait::async_trait;

use crate::domain::{
    AdditionalColumns, AppScope, Caller, Error, StringEdit, StringId, StringItem, StringKey,
    StringValue,
};

/// Request to add a string to an app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStringRequest {
    pub caller: Caller,
    pub scope: AppScope,
    pub key: StringKey,
    pub value: StringValue,
    pub additional_columns: AdditionalColumns,
}

/// Request to edit a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStringRequest {
    pub caller: Caller,
    pub scope: AppScope,
    pub string_id: StringId,
    pub edit: StringEdit,
}

/// String use-cases that change state. All require member.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StringCommand: Send + Sync {
    /// Add a string; it starts pending as `new`.
    async fn create_string(&self, request: CreateStringRequest) -> Result<StringItem, Error>;

    /// Edit a string, moving its status through the edit transition.
    async fn update_string(&self, request: UpdateStringRequest) -> Result<StringItem, Error>;

    /// Delete a string.
    async fn delete_string(
        &self,
        caller: Caller,
        scope: AppScope,
        string_id: StringId,
    ) -> Result<(), Error>;

    /// Discard every pending marker of an app without publishing.
    async fn reset_pending(&self, caller: Caller, scope: AppScope) -> Result<u64, Error>;
}
