//! In-memory store.
//!
//! Nothing survives the process. Clones of a [`MemoryStore`] share the same
//! map, so a clone handed to a second orchestrator behaves like reopening
//! the same storage location. Useful for tests and dry runs.

use crate::error::DeployError;
use crate::store::{document, KeyValueStore};
use crate::traits::CacheLocation;
use crate::types::NetworkIdentity;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared in-memory JSON document.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    document: Arc<Mutex<Map<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the whole document, for assertions and debugging.
    pub async fn snapshot(&self) -> Value {
        Value::Object(self.document.lock().await.clone())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, DeployError> {
        Ok(document::get(&*self.document.lock().await, key).cloned())
    }

    async fn set(&mut self, key: &str, value: Value) -> Result<(), DeployError> {
        document::set(&mut *self.document.lock().await, key, value)
    }

    async fn delete(&mut self, key: &str) -> Result<bool, DeployError> {
        Ok(document::delete(&mut *self.document.lock().await, key))
    }

    async fn keys(&self) -> Result<Vec<String>, DeployError> {
        Ok(self.document.lock().await.keys().cloned().collect())
    }
}

/// One [`MemoryStore`] per chain id.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheSet {
    stores: Arc<Mutex<HashMap<u64, MemoryStore>>>,
}

impl MemoryCacheSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store for `chain_id`, created empty if it doesn't exist yet.
    pub async fn store_for(&self, chain_id: u64) -> MemoryStore {
        self.stores
            .lock()
            .await
            .entry(chain_id)
            .or_default()
            .clone()
    }
}

impl CacheLocation for MemoryCacheSet {
    type Store = MemoryStore;

    async fn open(&self, network: &NetworkIdentity) -> Result<MemoryStore, DeployError> {
        Ok(self.store_for(network.chain_id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let mut store = MemoryStore::new();

        assert_eq!(store.get("token.address").await.unwrap(), None);

        store.set("token.address", json!("0x1")).await.unwrap();
        assert_eq!(
            store.get("token.address").await.unwrap(),
            Some(json!("0x1"))
        );
        assert_eq!(store.keys().await.unwrap(), vec!["token".to_string()]);

        assert!(store.delete("token.address").await.unwrap());
        assert!(!store.delete("token.address").await.unwrap());
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_state() {
        let mut a = MemoryStore::new();
        let b = a.clone();
        a.set("vault.txHash", json!("0xabc")).await.unwrap();
        assert_eq!(b.get("vault.txHash").await.unwrap(), Some(json!("0xabc")));
        assert_eq!(b.snapshot().await, json!({ "vault": { "txHash": "0xabc" } }));
    }

    #[tokio::test]
    async fn test_cache_set_isolates_networks() {
        let set = MemoryCacheSet::new();
        let mut mainnet = set.open(&NetworkIdentity::new(1, "mainnet")).await.unwrap();
        let sepolia = set
            .open(&NetworkIdentity::new(11155111, "sepolia"))
            .await
            .unwrap();

        mainnet.set("token.address", json!("0x1")).await.unwrap();
        assert_eq!(sepolia.get("token.address").await.unwrap(), None);

        let reopened = set.store_for(1).await;
        assert_eq!(
            reopened.get("token.address").await.unwrap(),
            Some(json!("0x1"))
        );
    }
}
