//! Persistent key-value cache.
//!
//! This module contains:
//! - [`KeyValueStore`] trait: get/set/delete over dot-path keys
//! - [`FileStore`] + [`CacheDir`]: one JSON document per network on disk
//! - [`MemoryStore`] + [`MemoryCacheSet`]: the same, without the disk

mod document;
mod kv;
pub mod memory;

#[cfg(feature = "file-storage")]
pub mod file_backed;

pub use kv::KeyValueStore;
pub use memory::{MemoryCacheSet, MemoryStore};

#[cfg(feature = "file-storage")]
pub use file_backed::{CacheDir, FileStore};

#[cfg(test)]
mod tests;
