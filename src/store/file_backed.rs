//! File-backed store.
//!
//! One JSON document per network:
//!
//! ```text
//! <cache_dir>/
//!   .cache-1.json          (mainnet)
//!   .cache-11155111.json   (sepolia)
//! ```
//!
//! The document is loaded into memory on open and every mutation is
//! written through before it is acknowledged.

use crate::config::OrchestratorConfig;
use crate::error::DeployError;
use crate::store::{document, KeyValueStore};
use crate::traits::CacheLocation;
use crate::types::NetworkIdentity;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// JSON document on disk with an in-memory mirror.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    document: Map<String, Value>,
}

impl FileStore {
    /// Open the document at `path`. A missing file is an empty document;
    /// an unreadable or unparsable one is an error, never silently reset.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DeployError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DeployError::CacheUnavailable(format!(
                    "failed to create cache dir {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let document = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                DeployError::CacheUnavailable(format!(
                    "failed to parse {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(DeployError::CacheUnavailable(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::debug!(path = %path.display(), entries = document.len(), "opened cache");
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `document` to a sibling temp file, fsync, then rename over the
    /// real file so a crash never leaves a half-written cache.
    async fn persist(&self, document: &Map<String, Value>) -> Result<(), DeployError> {
        let content = serde_json::to_vec_pretty(document)
            .map_err(|e| DeployError::CacheUnavailable(format!("failed to serialize cache: {}", e)))?;

        let tmp = self.tmp_path();
        let mut file = tokio::fs::File::create(&tmp).await.map_err(|e| {
            DeployError::CacheUnavailable(format!("failed to create {}: {}", tmp.display(), e))
        })?;
        file.write_all(&content).await.map_err(|e| {
            DeployError::CacheUnavailable(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            DeployError::CacheUnavailable(format!("failed to sync {}: {}", tmp.display(), e))
        })?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            DeployError::CacheUnavailable(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;
        self.sync_dir().await?;

        tracing::trace!(path = %self.path.display(), bytes = content.len(), "cache flushed");
        Ok(())
    }

    /// Flush the directory entry so the rename itself survives power loss.
    #[cfg(unix)]
    async fn sync_dir(&self) -> Result<(), DeployError> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        let handle = tokio::fs::File::open(&dir).await.map_err(|e| {
            DeployError::CacheUnavailable(format!("failed to open {}: {}", dir.display(), e))
        })?;
        handle.sync_all().await.map_err(|e| {
            DeployError::CacheUnavailable(format!("failed to sync {}: {}", dir.display(), e))
        })
    }

    #[cfg(not(unix))]
    async fn sync_dir(&self) -> Result<(), DeployError> {
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, DeployError> {
        Ok(document::get(&self.document, key).cloned())
    }

    async fn set(&mut self, key: &str, value: Value) -> Result<(), DeployError> {
        // Only commit to memory once the disk agrees.
        let mut next = self.document.clone();
        document::set(&mut next, key, value)?;
        self.persist(&next).await?;
        self.document = next;
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> Result<bool, DeployError> {
        let mut next = self.document.clone();
        if !document::delete(&mut next, key) {
            return Ok(false);
        }
        self.persist(&next).await?;
        self.document = next;
        Ok(true)
    }

    async fn keys(&self) -> Result<Vec<String>, DeployError> {
        Ok(self.document.keys().cloned().collect())
    }
}

/// A directory of per-network [`FileStore`] documents.
#[derive(Debug, Clone)]
pub struct CacheDir {
    dir: PathBuf,
    prefix: String,
}

impl CacheDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: OrchestratorConfig::default().cache_prefix,
        }
    }

    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self {
            dir: config.cache_dir.clone(),
            prefix: config.cache_prefix.clone(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Document path for a network. Depends on the chain id only.
    pub fn path_for(&self, network: &NetworkIdentity) -> PathBuf {
        self.dir
            .join(format!("{}{}.json", self.prefix, network.chain_id))
    }
}

impl CacheLocation for CacheDir {
    type Store = FileStore;

    async fn open(&self, network: &NetworkIdentity) -> Result<FileStore, DeployError> {
        FileStore::open(self.path_for(network)).await
    }
}
