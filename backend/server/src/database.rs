//! # Redis
//!
//! Document database for every collection on the site.
//!
//! ## Layout
//!
//! - One hash per collection, field is the slug (or lowercased email), value is the JSON document
//! - Counter hashes next to them for anything bumped by visitors: post views, placement clicks
//! - `HINCRBY` keeps the counters atomic without rewriting the documents
//! - `HSETNX` guards creates so two admins racing on one slug cannot overwrite each other
//!
//! | key                 | field  | value              |
//! |---------------------|--------|--------------------|
//! | `posts`             | slug   | Post JSON          |
//! | `tools`             | slug   | Tool JSON          |
//! | `comparisons`       | slug   | Comparison JSON    |
//! | `placements`        | slug   | Placement JSON     |
//! | `subscribers`       | email  | Subscriber JSON    |
//! | `newsletter_tokens` | token  | email              |
//! | `post_views`        | slug   | int                |
//! | `placement_clicks`  | slug   | int                |
//!
//! ## Memory Backend
//!
//! `REDIS_URL=memory://` swaps Redis for a process local map with the same hash semantics.
//! Handy for local work and what the tests run against.
use std::{collections::HashMap, sync::Arc, time::Duration};

use redis::{
    AsyncCommands, Client, RedisError,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::AppError;

pub const POSTS: &str = "posts";
pub const TOOLS: &str = "tools";
pub const COMPARISONS: &str = "comparisons";
pub const PLACEMENTS: &str = "placements";
pub const SUBSCRIBERS: &str = "subscribers";
pub const NEWSLETTER_TOKENS: &str = "newsletter_tokens";
pub const POST_VIEWS: &str = "post_views";
pub const PLACEMENT_CLICKS: &str = "placement_clicks";

pub const MEMORY_URL: &str = "memory://";

pub async fn init_store(redis_url: &str) -> Result<Store, RedisError> {
    if redis_url.starts_with(MEMORY_URL) {
        warn!("Using in-memory store, nothing survives a restart");
        return Ok(Store::memory());
    }

    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(500));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    info!("Connected to Redis");
    Ok(Store::Redis(connection_manager))
}

type Hashes = HashMap<String, HashMap<String, String>>;

#[derive(Clone, Default)]
pub struct MemoryStore {
    hashes: Arc<RwLock<Hashes>>,
}

#[derive(Clone)]
pub enum Store {
    Redis(ConnectionManager),
    Memory(MemoryStore),
}

impl Store {
    pub fn memory() -> Self {
        Store::Memory(MemoryStore::default())
    }

    pub async fn get(&self, key: &str, field: &str) -> Result<Option<String>, AppError> {
        match self {
            Store::Redis(connection) => Ok(connection.clone().hget(key, field).await?),
            Store::Memory(memory) => Ok(memory
                .hashes
                .read()
                .await
                .get(key)
                .and_then(|hash| hash.get(field))
                .cloned()),
        }
    }

    pub async fn get_all(&self, key: &str) -> Result<HashMap<String, String>, AppError> {
        match self {
            Store::Redis(connection) => Ok(connection.clone().hgetall(key).await?),
            Store::Memory(memory) => Ok(memory
                .hashes
                .read()
                .await
                .get(key)
                .cloned()
                .unwrap_or_default()),
        }
    }

    pub async fn fields(&self, key: &str) -> Result<Vec<String>, AppError> {
        match self {
            Store::Redis(connection) => Ok(connection.clone().hkeys(key).await?),
            Store::Memory(memory) => Ok(memory
                .hashes
                .read()
                .await
                .get(key)
                .map(|hash| hash.keys().cloned().collect())
                .unwrap_or_default()),
        }
    }

    pub async fn exists(&self, key: &str, field: &str) -> Result<bool, AppError> {
        match self {
            Store::Redis(connection) => Ok(connection.clone().hexists(key, field).await?),
            Store::Memory(memory) => Ok(memory
                .hashes
                .read()
                .await
                .get(key)
                .is_some_and(|hash| hash.contains_key(field))),
        }
    }

    pub async fn put(&self, key: &str, field: &str, value: &str) -> Result<(), AppError> {
        match self {
            Store::Redis(connection) => {
                let _: () = connection.clone().hset(key, field, value).await?;
            }
            Store::Memory(memory) => {
                memory
                    .hashes
                    .write()
                    .await
                    .entry(key.to_string())
                    .or_default()
                    .insert(field.to_string(), value.to_string());
            }
        }

        Ok(())
    }

    /// Write only when `field` is free. Returns whether the write happened.
    pub async fn put_new(&self, key: &str, field: &str, value: &str) -> Result<bool, AppError> {
        match self {
            Store::Redis(connection) => Ok(connection.clone().hset_nx(key, field, value).await?),
            Store::Memory(memory) => {
                let mut hashes = memory.hashes.write().await;
                let hash = hashes.entry(key.to_string()).or_default();

                if hash.contains_key(field) {
                    return Ok(false);
                }

                hash.insert(field.to_string(), value.to_string());
                Ok(true)
            }
        }
    }

    /// Returns whether anything was removed.
    pub async fn delete(&self, key: &str, field: &str) -> Result<bool, AppError> {
        match self {
            Store::Redis(connection) => {
                let removed: usize = connection.clone().hdel(key, field).await?;
                Ok(removed > 0)
            }
            Store::Memory(memory) => Ok(memory
                .hashes
                .write()
                .await
                .get_mut(key)
                .is_some_and(|hash| hash.remove(field).is_some())),
        }
    }

    pub async fn incr(&self, key: &str, field: &str, delta: i64) -> Result<i64, AppError> {
        match self {
            Store::Redis(connection) => Ok(connection.clone().hincr(key, field, delta).await?),
            Store::Memory(memory) => {
                let mut hashes = memory.hashes.write().await;
                let value = hashes
                    .entry(key.to_string())
                    .or_default()
                    .entry(field.to_string())
                    .or_insert_with(|| "0".to_string());

                let next = value.parse::<i64>().unwrap_or(0) + delta;
                *value = next.to_string();
                Ok(next)
            }
        }
    }

    pub async fn counter(&self, key: &str, field: &str) -> Result<u64, AppError> {
        Ok(self
            .get(key, field)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0))
    }

    pub async fn counters(&self, key: &str) -> Result<HashMap<String, u64>, AppError> {
        Ok(self
            .get_all(key)
            .await?
            .into_iter()
            .filter_map(|(field, value)| value.parse().ok().map(|count| (field, count)))
            .collect())
    }

    /// Move a counter to a renamed slug.
    pub async fn move_counter(&self, key: &str, from: &str, to: &str) -> Result<(), AppError> {
        let count = self.counter(key, from).await?;
        self.delete(key, from).await?;

        if count > 0 {
            self.incr(key, to, count as i64).await?;
        }

        Ok(())
    }

    pub async fn get_doc<T: DeserializeOwned>(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<T>, AppError> {
        match self.get(key, field).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Every document in a collection. Unreadable entries are logged and skipped.
    pub async fn all_docs<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, AppError> {
        let docs = self
            .get_all(key)
            .await?
            .into_iter()
            .filter_map(|(field, json)| match serde_json::from_str(&json) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    warn!("Skipping unreadable {key}/{field}: {e}");
                    None
                }
            })
            .collect();

        Ok(docs)
    }

    pub async fn put_doc<T: Serialize>(&self, key: &str, field: &str, doc: &T) -> Result<(), AppError> {
        self.put(key, field, &serde_json::to_string(doc)?).await
    }

    pub async fn put_new_doc<T: Serialize>(
        &self,
        key: &str,
        field: &str,
        doc: &T,
    ) -> Result<bool, AppError> {
        self.put_new(key, field, &serde_json::to_string(doc)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_hash_semantics() {
        let store = Store::memory();

        assert!(store.put_new("posts", "a", "1").await.unwrap());
        assert!(!store.put_new("posts", "a", "2").await.unwrap());
        assert_eq!(store.get("posts", "a").await.unwrap().as_deref(), Some("1"));

        store.put("posts", "a", "3").await.unwrap();
        assert_eq!(store.get("posts", "a").await.unwrap().as_deref(), Some("3"));
        assert!(store.exists("posts", "a").await.unwrap());

        assert!(store.delete("posts", "a").await.unwrap());
        assert!(!store.delete("posts", "a").await.unwrap());
        assert!(store.get_all("posts").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_counters() {
        let store = Store::memory();

        assert_eq!(store.incr("post_views", "a", 1).await.unwrap(), 1);
        assert_eq!(store.incr("post_views", "a", 2).await.unwrap(), 3);
        assert_eq!(store.counter("post_views", "missing").await.unwrap(), 0);

        store.move_counter("post_views", "a", "b").await.unwrap();
        let counters = store.counters("post_views").await.unwrap();
        assert_eq!(counters.get("b"), Some(&3));
        assert!(!counters.contains_key("a"));
    }

    #[tokio::test]
    async fn test_all_docs_skips_garbage() {
        let store = Store::memory();
        store.put("nums", "good", "5").await.unwrap();
        store.put("nums", "bad", "{").await.unwrap();

        let docs: Vec<u32> = store.all_docs("nums").await.unwrap();
        assert_eq!(docs, vec![5]);
    }
}
