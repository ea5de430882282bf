//! [`KeyValueStore`] trait definition.

use crate::error::DeployError;
use async_trait::async_trait;
use serde_json::Value;

/// Durable mapping from string keys to JSON values.
///
/// Keys are dot-paths: `"token.address"` addresses the `address` field of
/// the `token` object. The store has no business logic. Last write wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`, never an error.
    async fn get(&self, key: &str) -> Result<Option<Value>, DeployError>;

    /// Write a value. Must be durable before returning `Ok`.
    async fn set(&mut self, key: &str, value: Value) -> Result<(), DeployError>;

    /// Remove a value. Returns `true` if something was removed.
    async fn delete(&mut self, key: &str) -> Result<bool, DeployError>;

    /// Top-level keys in the store, i.e. the deployment names.
    async fn keys(&self) -> Result<Vec<String>, DeployError>;
}
