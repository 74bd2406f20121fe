//! Object storage for raw submissions and generated artifacts.
//!
//! Blobs are addressed by string keys with no directory semantics beyond
//! prefixing. Keys are normalized to a bucket-relative form before every
//! call, and keys containing a parent-directory traversal segment are
//! rejected outright.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use lectern_core::{Error, Result};

/// Content-addressed-by-path blob storage.
///
/// Allows abstracting over filesystem, S3, or other storage providers.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a blob at the given key, overwriting any existing object.
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// Read the blob at the given key.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Delete the blob at the given key. Deleting an absent key is not an
    /// error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Normalize a key to bucket-relative form.
///
/// Leading path separators are stripped; empty keys and keys containing a
/// `..` segment are rejected.
pub fn normalize_key(key: &str) -> Result<String> {
    let trimmed = key.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("empty object key".into()));
    }
    if trimmed.split('/').any(|segment| segment == "..") {
        return Err(Error::InvalidInput(format!(
            "object key contains traversal segment: {}",
            key
        )));
    }
    Ok(trimmed.to_string())
}

/// Filesystem object store.
///
/// Stores blobs under a base directory, one file per key. The content type
/// is accepted for interface parity but not recorded; consumers derive it
/// from the key's role.
pub struct FsObjectStore {
    base_path: PathBuf,
}

impl FsObjectStore {
    /// Create a new filesystem store rooted at the given directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// Validate that the store can write, read, and delete blobs.
    ///
    /// Performs a full round-trip at startup to catch filesystem issues
    /// (permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let key = ".health-check/probe.bin";
        let data = b"storage-health-check";

        self.put(key, data, "application/octet-stream")
            .await
            .map_err(|e| format!("put({}): {}", key, e))?;
        let read_back = self
            .get(key)
            .await
            .map_err(|e| format!("get({}): {}", key, e))?;
        if read_back != data {
            return Err("read-back mismatch".to_string());
        }
        self.delete(key)
            .await
            .map_err(|e| format!("delete({}): {}", key, e))?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<()> {
        let key = normalize_key(key)?;
        let full_path = self.full_path(&key);
        debug!(
            subsystem = "storage",
            component = "object_store",
            op = "put",
            object_key = %key,
            size = bytes.len(),
            "Writing object"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "object_store: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "object_store: rename failed");
            e
        })?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let key = normalize_key(key)?;
        let full_path = self.full_path(&key);
        match fs::read(&full_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("object {}", key)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = normalize_key(key)?;
        let full_path = self.full_path(&key);
        if fs::try_exists(&full_path).await? {
            fs::remove_file(full_path).await?;
        }
        Ok(())
    }
}

/// In-memory object store for tests and single-node development.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recorded content type for a key, if present.
    pub fn content_type(&self, key: &str) -> Option<String> {
        let key = normalize_key(key).ok()?;
        self.objects
            .read()
            .unwrap()
            .get(&key)
            .map(|(_, ct)| ct.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let key = normalize_key(key)?;
        self.objects
            .write()
            .unwrap()
            .insert(key, (bytes.to_vec(), content_type.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let key = normalize_key(key)?;
        self.objects
            .read()
            .unwrap()
            .get(&key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| Error::NotFound(format!("object {}", key)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = normalize_key(key)?;
        self.objects.write().unwrap().remove(&key);
        Ok(())
    }
}
