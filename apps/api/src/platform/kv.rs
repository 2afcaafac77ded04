use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use serde::Serialize;

use super::PlatformError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KvItem {
    pub key: String,
    pub value: Option<String>,
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, PlatformError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), PlatformError>;

    /// Keys matching a glob `pattern`, sorted. Values are only fetched when
    /// `with_values` is set.
    async fn list(&self, pattern: &str, with_values: bool) -> Result<Vec<KvItem>, PlatformError>;

    async fn ping(&self) -> Result<(), PlatformError>;
}

pub struct RedisKvStore {
    client: Client,
}

impl RedisKvStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn conn(&self) -> Result<MultiplexedConnection, PlatformError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

/// SCAN may return a key more than once while the keyspace changes.
fn unique_sorted(mut keys: Vec<String>) -> Vec<String> {
    keys.sort();
    keys.dedup();
    keys
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PlatformError> {
        let mut conn = self.conn().await?;
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PlatformError> {
        let mut conn = self.conn().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn list(&self, pattern: &str, with_values: bool) -> Result<Vec<KvItem>, PlatformError> {
        let mut conn = self.conn().await?;
        let mut scanned = Vec::new();
        {
            let mut iter = conn.scan_match::<_, String>(pattern).await?;
            while let Some(key) = iter.next_item().await {
                scanned.push(key);
            }
        }
        let keys = unique_sorted(scanned);

        if !with_values || keys.is_empty() {
            return Ok(keys
                .into_iter()
                .map(|key| KvItem { key, value: None })
                .collect());
        }

        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        Ok(keys
            .into_iter()
            .zip(values)
            .map(|(key, value)| KvItem { key, value })
            .collect())
    }

    async fn ping(&self) -> Result<(), PlatformError> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Scopes a store to one user: every key is transparently prefixed with
/// `u:<user_id>:` and listed keys come back without the prefix.
pub struct UserKv<'a> {
    inner: &'a dyn KvStore,
    prefix: String,
}

impl<'a> UserKv<'a> {
    pub fn new(inner: &'a dyn KvStore, user_id: &str) -> Self {
        Self {
            inner,
            prefix: format!("u:{user_id}:"),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

#[async_trait]
impl KvStore for UserKv<'_> {
    async fn get(&self, key: &str) -> Result<Option<String>, PlatformError> {
        self.inner.get(&self.scoped(key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PlatformError> {
        self.inner.set(&self.scoped(key), value).await
    }

    async fn list(&self, pattern: &str, with_values: bool) -> Result<Vec<KvItem>, PlatformError> {
        let items = self.inner.list(&self.scoped(pattern), with_values).await?;
        Ok(items
            .into_iter()
            .filter_map(|item| {
                let key = item.key.strip_prefix(&self.prefix)?.to_string();
                Some(KvItem {
                    key,
                    value: item.value,
                })
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), PlatformError> {
        self.inner.ping().await
    }
}
