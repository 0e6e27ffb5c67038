use async_trait::async_trait;
use orders_types::ports::kv_store::{BatchOp, KvStore, ScanPage, StoreError};
use redis::aio::MultiplexedConnection;
use redis::Value;

/// [`KvStore`] backed by Redis.
///
/// The multiplexed connection is opened once and cloned per call; clones share
/// the same socket, so one `RedisStore` serves every request.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

fn backend(e: redis::RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}

// SETNX/DEL/SADD/SREM answer with a count, SET .. XX with OK or nil.
fn applied(reply: &Value) -> bool {
    match reply {
        Value::Int(n) => *n > 0,
        Value::Nil => false,
        _ => true,
    }
}

impl RedisStore {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        tracing::info!(%url, "connected to redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(value)
    }

    async fn set_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Value = redis::cmd("SETNX")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(applied(&reply))
    }

    async fn set_if_present(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Value = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("XX")
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(applied(&reply))
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Value = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(applied(&reply))
    }

    async fn add_to_set(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Value = redis::cmd("SADD")
            .arg(set)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(applied(&reply))
    }

    async fn remove_from_set(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Value = redis::cmd("SREM")
            .arg(set)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(applied(&reply))
    }

    async fn scan_set(
        &self,
        set: &str,
        cursor: u64,
        pattern: &str,
        count: u64,
    ) -> Result<ScanPage, StoreError> {
        let mut conn = self.conn.clone();
        let (cursor, members): (u64, Vec<String>) = redis::cmd("SSCAN")
            .arg(set)
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count.max(1))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(ScanPage { members, cursor })
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        if values.len() != keys.len() {
            return Err(StoreError::Backend(format!(
                "MGET returned {} values for {} keys",
                values.len(),
                keys.len()
            )));
        }
        Ok(values)
    }

    async fn atomic(&self, ops: Vec<BatchOp>) -> Result<Vec<bool>, StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in &ops {
            match op {
                BatchOp::SetIfAbsent { key, value } => {
                    pipe.cmd("SETNX").arg(key).arg(value.as_slice());
                }
                BatchOp::SetIfPresent { key, value } => {
                    pipe.cmd("SET").arg(key).arg(value.as_slice()).arg("XX");
                }
                BatchOp::Delete { key } => {
                    pipe.cmd("DEL").arg(key);
                }
                BatchOp::AddToSet { set, member } => {
                    pipe.cmd("SADD").arg(set).arg(member);
                }
                BatchOp::RemoveFromSet { set, member } => {
                    pipe.cmd("SREM").arg(set).arg(member);
                }
            }
        }

        let mut conn = self.conn.clone();
        let replies: Vec<Value> = pipe.query_async(&mut conn).await.map_err(backend)?;
        if replies.len() != ops.len() {
            return Err(StoreError::Backend(format!(
                "transaction returned {} replies for {} commands",
                replies.len(),
                ops.len()
            )));
        }
        Ok(replies.iter().map(applied).collect())
    }
}
