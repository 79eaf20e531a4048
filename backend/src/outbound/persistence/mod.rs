//! PostgreSQL record store using Diesel.
//!
//! Queries run through `diesel-async` on a `bb8` pool; the schema is managed
//! by embedded Diesel migrations applied when the pool is built.
//!
//! - **Thin adapter**: rows are translated to domain types and back. No
//!   business rules live here.
//! - **Internal models**: `models.rs` and `schema.rs` never leave this
//!   module.
//! - **Typed errors**: pool and Diesel failures become
//!   [`crate::domain::ports::RecordStoreError`].
//!
//! ```ignore
//! use string_manager::outbound::persistence::{DbPool, DieselRecordStore, PoolConfig};
//!
//! let pool = DbPool::connect(PoolConfig::new("postgres://localhost/strings")).await?;
//! let store = DieselRecordStore::new(pool, clock);
//! ```

mod diesel_record_store;
mod error_mapping;
mod models;
mod pool;
mod schema;

pub use diesel_record_store::DieselRecordStore;
pub use pool::{DbPool, PoolConfig, PoolError};
