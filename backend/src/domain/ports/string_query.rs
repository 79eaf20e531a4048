//! Driving port for string table reads.

use async_trait::async_trait;

use crate::domain::{AppScope, Caller, Error, Page, PageRequest, StringItem};

/// String read use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StringQuery: Send + Sync {
    /// One page of an app's strings. Requires viewer.
    async fn list_strings(
        &self,
        caller: Caller,
        scope: AppScope,
        page: PageRequest,
    ) -> Result<Page<StringItem>, Error>;
}
