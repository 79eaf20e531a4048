//! Redis-backed document record store.
//!
//! Each record is stored as its JSON document under a key from [`keys`];
//! ids come from per-kind `INCR` counters and listings read sorted-set
//! indexes. Multi-key writes go through `MULTI`/`EXEC` pipelines, and a
//! publish additionally `WATCH`es the app so a concurrent publish from
//! another process aborts the transaction.

mod directory;
mod keys;
mod strings;
mod versions;

use std::sync::Arc;

use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{self, PooledConnection, RunError};
use bb8_redis::redis::aio::MultiplexedConnection;
use bb8_redis::redis::{self, RedisError};
use mockable::Clock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::ports::RecordStoreError;

use keys::Kind;

/// Redis implementation of [`crate::domain::ports::RecordStore`].
#[derive(Clone)]
pub struct RedisRecordStore {
    pool: bb8::Pool<RedisConnectionManager>,
    clock: Arc<dyn Clock>,
}

impl RedisRecordStore {
    /// Build a connection pool for `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns a connection error when the URL is invalid or the server
    /// cannot be reached.
    pub async fn connect(redis_url: &str, clock: Arc<dyn Clock>) -> Result<Self, RecordStoreError> {
        let manager = RedisConnectionManager::new(redis_url).map_err(map_redis_error)?;
        let pool = bb8::Pool::builder()
            .build(manager)
            .await
            .map_err(map_redis_error)?;
        Ok(Self { pool, clock })
    }

    async fn conn(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, RecordStoreError> {
        self.pool.get().await.map_err(map_run_error)
    }
}

fn map_run_error(error: RunError<RedisError>) -> RecordStoreError {
    match error {
        RunError::User(error) => map_redis_error(error),
        RunError::TimedOut => RecordStoreError::connection("timed out waiting for a connection"),
    }
}

fn map_redis_error(error: RedisError) -> RecordStoreError {
    debug!(%error, "redis operation failed");
    if error.is_io_error()
        || error.is_connection_dropped()
        || error.is_connection_refusal()
        || error.is_timeout()
    {
        RecordStoreError::connection("redis connection error")
    } else {
        RecordStoreError::query("redis command failed")
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, RecordStoreError> {
    serde_json::to_string(value).map_err(|err| RecordStoreError::serialization(err.to_string()))
}

fn decode<T: DeserializeOwned>(key: &str, text: &str) -> Result<T, RecordStoreError> {
    serde_json::from_str(text)
        .map_err(|err| RecordStoreError::serialization(format!("{key}: {err}")))
}

async fn next_id(conn: &mut MultiplexedConnection, kind: Kind) -> Result<i64, RecordStoreError> {
    redis::cmd("INCR")
        .arg(keys::counter(kind))
        .query_async(conn)
        .await
        .map_err(map_redis_error)
}

async fn load<T: DeserializeOwned>(
    conn: &mut MultiplexedConnection,
    key: &str,
) -> Result<Option<T>, RecordStoreError> {
    let text: Option<String> = redis::cmd("GET")
        .arg(key)
        .query_async(conn)
        .await
        .map_err(map_redis_error)?;
    text.map(|text| decode(key, &text)).transpose()
}

/// Load documents in key order, skipping keys that no longer exist.
async fn load_many<T: DeserializeOwned>(
    conn: &mut MultiplexedConnection,
    keys: &[String],
) -> Result<Vec<T>, RecordStoreError> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let texts: Vec<Option<String>> = redis::cmd("MGET")
        .arg(keys)
        .query_async(conn)
        .await
        .map_err(map_redis_error)?;
    keys.iter()
        .zip(texts)
        .filter_map(|(key, text)| text.map(|text| decode(key, &text)))
        .collect()
}

async fn store<T: Serialize>(
    conn: &mut MultiplexedConnection,
    key: &str,
    value: &T,
) -> Result<(), RecordStoreError> {
    redis::cmd("SET")
        .arg(key)
        .arg(encode(value)?)
        .query_async::<()>(conn)
        .await
        .map_err(map_redis_error)
}

/// Member ids of a sorted-set index between two ranks, inclusive.
async fn index_range(
    conn: &mut MultiplexedConnection,
    key: &str,
    start: i64,
    stop: i64,
) -> Result<Vec<i64>, RecordStoreError> {
    redis::cmd("ZRANGE")
        .arg(key)
        .arg(start)
        .arg(stop)
        .query_async(conn)
        .await
        .map_err(map_redis_error)
}

async fn delete_key(conn: &mut MultiplexedConnection, key: &str) -> Result<bool, RecordStoreError> {
    let removed: i64 = redis::cmd("DEL")
        .arg(key)
        .query_async(conn)
        .await
        .map_err(map_redis_error)?;
    Ok(removed > 0)
}
