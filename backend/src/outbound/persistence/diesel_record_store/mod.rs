//! PostgreSQL-backed record store.
//!
//! One adapter implements every repository port. Rows are translated through
//! the structs in `models`; all business rules stay in the domain services.

mod directory;
mod strings;
mod versions;

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::RecordStoreError;

use super::pool::DbPool;

/// Diesel implementation of [`crate::domain::ports::RecordStore`].
#[derive(Clone)]
pub struct DieselRecordStore {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselRecordStore {
    /// Create a store over an existing pool. Timestamps come from `clock`.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn decode_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, RecordStoreError>
where
    T: TryFrom<R, Error = RecordStoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn decode_row<R, T>(row: Option<R>) -> Result<Option<T>, RecordStoreError>
where
    T: TryFrom<R, Error = RecordStoreError>,
{
    row.map(T::try_from).transpose()
}

fn affected(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}
